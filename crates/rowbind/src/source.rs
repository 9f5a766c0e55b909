use crate::{
    BoxError, Value,
    error::{Error, Phase},
};
use std::collections::VecDeque;

/// A cursor over the rows of a result set, provided by a database adapter.
///
/// The scanning engine only reads the column names, advances the cursor
/// and asks it to write the values of the current row into scan targets.
pub trait RowSource {
    /// The error type reported by the row source.
    type Error: Into<BoxError>;

    /// Returns the column names of the result set in order.
    fn columns(&self) -> Result<Vec<String>, Self::Error>;

    /// Advances to the next row, returning `false` on exhaustion or failure.
    fn next_row(&mut self) -> bool;

    /// Writes the values of the current row into the targets, one per column.
    fn write_into(&mut self, targets: &mut [Value]) -> Result<(), Self::Error>;

    /// Returns the error which stopped the iteration, if any.
    fn final_error(&mut self) -> Result<(), Self::Error>;

    /// Releases the rows.
    fn close(&mut self) -> Result<(), Self::Error>;
}

impl<R: RowSource + ?Sized> RowSource for &mut R {
    type Error = R::Error;

    #[inline]
    fn columns(&self) -> Result<Vec<String>, Self::Error> {
        (**self).columns()
    }

    #[inline]
    fn next_row(&mut self) -> bool {
        (**self).next_row()
    }

    #[inline]
    fn write_into(&mut self, targets: &mut [Value]) -> Result<(), Self::Error> {
        (**self).write_into(targets)
    }

    #[inline]
    fn final_error(&mut self) -> Result<(), Self::Error> {
        (**self).final_error()
    }

    #[inline]
    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }
}

/// A collaborator which runs queries and returns their rows.
pub trait Querier {
    /// The rows returned by a query.
    type Rows: RowSource;
    /// The error type reported by the querier.
    type Error: Into<BoxError>;

    /// Runs the SQL statement with the parameters.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Self::Rows, Self::Error>;
}

/// An in-memory row source.
///
/// # Examples
///
/// ```rust
/// use rowbind::{MemoryRows, Value};
///
/// let rows = MemoryRows::new(["id", "name"])
///     .with_row(vec![Value::Int(1), Value::from("alice")])
///     .with_row(vec![Value::Int(2), Value::Null]);
/// assert_eq!(rows.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    /// Column names.
    columns: Vec<String>,
    /// Rows which have not been reached.
    pending: VecDeque<Vec<Value>>,
    /// The current row.
    current: Option<Vec<Value>>,
    /// A flag which indicates whether the rows have been closed.
    closed: bool,
}

impl MemoryRows {
    /// Creates a new instance with the column names and no rows.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(|column| column.into()).collect(),
            ..Self::default()
        }
    }

    /// Appends a row.
    #[inline]
    pub fn push_row(&mut self, row: Vec<Value>) {
        self.pending.push_back(row);
    }

    /// Appends a row and returns `self`.
    #[inline]
    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.push_row(row);
        self
    }

    /// Returns the number of rows which have not been reached.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if there are no pending rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns `true` if the rows have been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RowSource for MemoryRows {
    type Error = BoxError;

    fn columns(&self) -> Result<Vec<String>, Self::Error> {
        if self.closed {
            return Err("rows are closed".into());
        }
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.current = self.pending.pop_front();
        self.current.is_some()
    }

    fn write_into(&mut self, targets: &mut [Value]) -> Result<(), Self::Error> {
        let Some(row) = self.current.as_mut() else {
            return Err("no current row".into());
        };
        if row.len() != targets.len() {
            let message = format!(
                "expected {} scan targets, got: {}",
                row.len(),
                targets.len()
            );
            return Err(message.into());
        }
        targets.clone_from_slice(row);
        Ok(())
    }

    #[inline]
    fn final_error(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    #[inline]
    fn close(&mut self) -> Result<(), Self::Error> {
        self.closed = true;
        self.current = None;
        self.pending.clear();
        Ok(())
    }
}

/// Creates an error for a failure of the row source and logs it.
pub(crate) fn source_error(phase: Phase, err: impl Into<BoxError>) -> Error {
    let err = Error::row_source(phase, err);
    tracing::warn!(phase = phase.as_str(), "{err}");
    err
}
