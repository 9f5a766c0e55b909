use crate::{
    Destination, RowSource, RowValues, Scan, StructIndexer, Value,
    error::{Error, ErrorKind, Phase, ShapeViolation, bail},
    row::BindPlan,
    shape::classify,
    source::source_error,
};
use std::any::TypeId;

/// A scanning session started by the first scan.
#[derive(Debug)]
struct Session {
    /// Classified destination.
    destination: Destination,
    /// Column names of the rows.
    columns: Vec<String>,
    /// Routing of the columns.
    plan: BindPlan,
    /// Scan targets reused across rows.
    values: Vec<Value>,
}

impl Session {
    /// Classifies the destination type `D` and builds the binding plan for the rows.
    fn start<D: Scan, R: RowSource>(
        rows: &R,
        indexer: &StructIndexer,
        sequence: bool,
    ) -> Result<Self, Error> {
        let destination = classify::<D>()?;
        check_mode(&destination, sequence)?;

        let columns = rows
            .columns()
            .map_err(|err| source_error(Phase::Columns, err))?;
        let plan = BindPlan::new(&destination, &columns, indexer)?;
        tracing::debug!(
            shape = destination.shape().as_str(),
            type_name = destination.type_name(),
            num_columns = columns.len(),
            "start a scanning session",
        );
        Ok(Self {
            destination,
            values: vec![Value::Null; columns.len()],
            columns,
            plan,
        })
    }

    /// Resets the scan targets and asks the row source to write the current row.
    fn write_row<R: RowSource>(&mut self, rows: &mut R) -> Result<RowValues<'_>, Error> {
        self.values.fill(Value::Null);
        rows.write_into(&mut self.values)
            .map_err(|err| source_error(Phase::Write, err))?;
        Ok(RowValues::new(&self.columns, &mut self.values, &self.plan))
    }
}

/// State of a row scanner.
#[derive(Debug)]
enum State {
    /// Nothing has been classified.
    Unstarted,
    /// A destination type has been classified for the rows.
    Ready(Session),
    /// No further scans are permitted.
    Closed,
}

impl State {
    /// Returns the session for the destination type `D`, starting it if necessary.
    fn session<D: Scan, R: RowSource>(
        &mut self,
        rows: &R,
        indexer: &StructIndexer,
        sequence: bool,
    ) -> Result<&mut Session, Error> {
        if let State::Unstarted = self {
            *self = State::Ready(Session::start::<D, R>(rows, indexer, sequence)?);
        }
        match self {
            State::Ready(session) => {
                let destination = &session.destination;
                if destination.type_id() != TypeId::of::<D>() {
                    bail!(ErrorKind::DestinationChanged {
                        expected: destination.type_name(),
                        found: std::any::type_name::<D>(),
                    });
                }
                check_mode(destination, sequence)?;
                Ok(session)
            }
            _ => bail!(ErrorKind::ScannerClosed),
        }
    }
}

/// Scans the current row of a row source into destinations.
///
/// The destination type is classified by the first scan and fixed for the session.
/// The scanner never advances the rows by itself.
///
/// # Examples
///
/// ```rust
/// use rowbind::{MemoryRows, RowScanner, Value};
///
/// let rows = MemoryRows::new(["name"])
///     .with_row(vec![Value::from("alice")])
///     .with_row(vec![Value::from("bob")]);
/// let mut scanner = RowScanner::new(rows);
/// let mut names = Vec::new();
/// while scanner.advance()? {
///     let mut name = String::new();
///     scanner.scan(&mut name)?;
///     names.push(name);
/// }
/// scanner.close()?;
/// assert_eq!(names, ["alice", "bob"]);
/// # Ok::<(), rowbind::Error>(())
/// ```
#[derive(Debug)]
pub struct RowScanner<R: RowSource> {
    /// Underlying rows.
    rows: R,
    /// Indexer for struct destinations.
    indexer: StructIndexer,
    /// Scanning state.
    state: State,
    /// A flag which indicates whether the rows have been closed.
    rows_closed: bool,
}

impl<R: RowSource> RowScanner<R> {
    /// Creates a new instance with the default config.
    #[inline]
    pub fn new(rows: R) -> Self {
        Self::with_indexer(rows, StructIndexer::default())
    }

    /// Creates a new instance with the indexer.
    #[inline]
    pub fn with_indexer(rows: R, indexer: StructIndexer) -> Self {
        Self {
            rows,
            indexer,
            state: State::Unstarted,
            rows_closed: false,
        }
    }

    /// Scans the current row into the destination.
    pub fn scan<D: Scan>(&mut self, dst: &mut D) -> Result<(), Error> {
        let session = self
            .state
            .session::<D, R>(&self.rows, &self.indexer, false)?;
        let mut row = session.write_row(&mut self.rows)?;
        dst.scan_row(&mut row)?;
        tracing::trace!(type_name = session.destination.type_name(), "bind a row");
        Ok(())
    }

    /// Scans the current row into a new element appended to the sequence destination.
    pub(crate) fn append<D: Scan>(&mut self, dst: &mut D) -> Result<(), Error> {
        let session = self
            .state
            .session::<D, R>(&self.rows, &self.indexer, true)?;
        let Some(sequence) = dst.as_sequence() else {
            bail!(ErrorKind::InvalidDestination {
                type_name: std::any::type_name::<D>(),
                reason: ShapeViolation::NotSequence,
            });
        };
        let mut row = session.write_row(&mut self.rows)?;
        sequence.scan_element(&mut row)?;
        tracing::trace!(
            type_name = session.destination.type_name(),
            len = sequence.len(),
            "append a row",
        );
        Ok(())
    }

    /// Advances to the next row, returning `false` on exhaustion.
    ///
    /// On exhaustion, the final error of the rows is checked
    /// and the scanner is closed for further scans.
    pub fn advance(&mut self) -> Result<bool, Error> {
        if self.is_closed() {
            return Ok(false);
        }
        if self.rows.next_row() {
            return Ok(true);
        }
        self.state = State::Closed;
        self.rows
            .final_error()
            .map_err(|err| source_error(Phase::Advance, err))?;
        Ok(false)
    }

    /// Closes the rows once and the scanner for further scans.
    pub fn close(&mut self) -> Result<(), Error> {
        self.state = State::Closed;
        if self.rows_closed {
            return Ok(());
        }
        self.rows_closed = true;
        self.rows
            .close()
            .map_err(|err| source_error(Phase::Close, err))
    }

    /// Returns `true` if no further scans are permitted.
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Returns the column names if a session has been started.
    #[inline]
    pub fn columns(&self) -> Option<&[String]> {
        if let State::Ready(session) = &self.state {
            Some(&session.columns)
        } else {
            None
        }
    }

    /// Returns the classified destination if a session has been started.
    #[inline]
    pub fn destination(&self) -> Option<&Destination> {
        if let State::Ready(session) = &self.state {
            Some(&session.destination)
        } else {
            None
        }
    }
}

/// Checks that the destination matches the scanning mode.
fn check_mode(destination: &Destination, sequence: bool) -> Result<(), Error> {
    if sequence && !destination.shape().is_sequence() {
        bail!(ErrorKind::InvalidDestination {
            type_name: destination.type_name(),
            reason: ShapeViolation::NotSequence,
        });
    } else if !sequence && destination.shape().is_sequence() {
        bail!(ErrorKind::InvalidDestination {
            type_name: destination.type_name(),
            reason: ShapeViolation::UnexpectedSequence,
        });
    }
    Ok(())
}
