//! Errors with structured context for the scanning engine.
use crate::{BoxError, FieldPath};
use std::{error, fmt};

/// Phases of the interaction with a row source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Running the query which produces the rows.
    Query,
    /// Reading the column names.
    Columns,
    /// Advancing to the next row, including the final error check.
    Advance,
    /// Writing the current row into the scan targets.
    Write,
    /// Closing the rows.
    Close,
}

impl Phase {
    /// Returns `self` as `&'static str`.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Query => "query",
            Phase::Columns => "columns",
            Phase::Advance => "advance",
            Phase::Write => "write",
            Phase::Close => "close",
        }
    }
}

impl fmt::Display for Phase {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons for rejecting a destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeViolation {
    /// Multiple rows require a sequence destination.
    NotSequence,
    /// A single row can not be scanned into a sequence.
    UnexpectedSequence,
    /// Sequences of sequences are not supported.
    NestedSequence,
    /// An indirection wraps a non-primitive type or another indirection.
    NestedIndirection,
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ShapeViolation::NotSequence => "destination must be a sequence",
            ShapeViolation::UnexpectedSequence => "destination must not be a sequence",
            ShapeViolation::NestedSequence => "sequence elements must not be sequences",
            ShapeViolation::NestedIndirection => {
                "destination must not be an optional non-primitive type"
            }
        };
        f.write_str(reason)
    }
}

/// Kinds of errors with their structured context.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The destination type has an unsupported shape.
    InvalidDestination {
        /// Name of the offending type.
        type_name: &'static str,
        /// Why the type is rejected.
        reason: ShapeViolation,
    },
    /// A primitive destination requires exactly one column.
    ColumnCount {
        /// Name of the primitive type.
        type_name: &'static str,
        /// Number of columns in the rows.
        count: usize,
    },
    /// Two fields claim the same column.
    DuplicateColumn {
        /// Name of the struct type.
        type_name: &'static str,
        /// Column name.
        column: String,
        /// The field registered first.
        first: FieldPath,
        /// The conflicting field.
        second: FieldPath,
    },
    /// A column has no corresponding field in the struct.
    UnmappedColumn {
        /// Name of the struct type.
        type_name: &'static str,
        /// Column name.
        column: String,
    },
    /// A `NULL` value was scanned into a non-nullable target.
    NullValue {
        /// Column name.
        column: String,
        /// Field receiving the value, if the destination is a struct.
        field: Option<FieldPath>,
        /// Name of the target type.
        type_name: &'static str,
    },
    /// A non-null value could not be decoded into its target.
    Decode {
        /// Column name.
        column: String,
        /// Field receiving the value, if the destination is a struct.
        field: Option<FieldPath>,
    },
    /// A value is incompatible with the requested type.
    TypeMismatch {
        /// Name of the requested type.
        expected: &'static str,
        /// Kind of the value found.
        found: &'static str,
    },
    /// No rows in the result set.
    NotFound,
    /// More than one row in the result set.
    TooManyRows {
        /// Total number of rows.
        count: usize,
    },
    /// The row source failed.
    RowSource {
        /// The phase that failed.
        phase: Phase,
    },
    /// A scanning session received a destination of another type.
    DestinationChanged {
        /// Type of the session.
        expected: &'static str,
        /// Type received.
        found: &'static str,
    },
    /// The row scanner has been closed.
    ScannerClosed,
    /// Invalid configuration.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidDestination { type_name, reason } => {
                write!(f, "{reason}, got: `{type_name}`")
            }
            ErrorKind::ColumnCount { type_name, count } => write!(
                f,
                "to scan into the primitive type `{type_name}`, \
                    the number of columns must be exactly 1, got: {count}"
            ),
            ErrorKind::DuplicateColumn {
                type_name,
                column,
                first,
                second,
            } => write!(
                f,
                "column `{column}` must have exactly one field pointing to it; \
                    found 2 fields `{first}` and `{second}` in `{type_name}`"
            ),
            ErrorKind::UnmappedColumn { type_name, column } => write!(
                f,
                "column `{column}` has no corresponding field in `{type_name}`"
            ),
            ErrorKind::NullValue {
                column,
                field,
                type_name,
            } => {
                if let Some(field) = field {
                    write!(
                        f,
                        "fail to scan NULL of the column `{column}` \
                            into the non-nullable field `{field}` of type `{type_name}`"
                    )
                } else {
                    write!(
                        f,
                        "fail to scan NULL of the column `{column}` \
                            into the non-nullable type `{type_name}`"
                    )
                }
            }
            ErrorKind::Decode { column, field } => {
                if let Some(field) = field {
                    write!(f, "fail to decode the column `{column}` into the field `{field}`")
                } else {
                    write!(f, "fail to decode the column `{column}`")
                }
            }
            ErrorKind::TypeMismatch { expected, found } => {
                write!(f, "expected a value compatible with `{expected}`, got: {found}")
            }
            ErrorKind::NotFound => f.write_str("no rows in result set"),
            ErrorKind::TooManyRows { count } => write!(f, "expected 1 row, got: {count}"),
            ErrorKind::RowSource { phase } => write!(f, "fail to {phase} rows"),
            ErrorKind::DestinationChanged { expected, found } => write!(
                f,
                "destination type changed from `{expected}` to `{found}` within one session"
            ),
            ErrorKind::ScannerClosed => f.write_str("row scanner has been closed"),
            ErrorKind::Config => f.write_str("invalid scan config"),
        }
    }
}

/// An error type with a structured kind and an optional source.
#[derive(Debug)]
pub struct Error {
    /// Error kind.
    kind: ErrorKind,
    /// Error source.
    source: Option<BoxError>,
}

impl Error {
    /// Creates a new instance with the supplied kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Creates a new instance with the supplied kind and the error source.
    #[inline]
    pub fn with_source(kind: ErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: Some(source.into()),
        }
    }

    /// Creates an error for a failure of the row source in the phase.
    #[inline]
    pub fn row_source(phase: Phase, source: impl Into<BoxError>) -> Self {
        Self::with_source(ErrorKind::RowSource { phase }, source)
    }

    /// Creates an error for a value which is incompatible with `T`.
    #[inline]
    pub fn mismatch<T: ?Sized>(found: &'static str) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: std::any::type_name::<T>(),
            found,
        })
    }

    /// Returns a new instance with the supplied kind and `self` as the error source.
    #[inline]
    pub fn wrap(self, kind: ErrorKind) -> Self {
        Self::with_source(kind, self)
    }

    /// Returns the kind.
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns `true` if the error reports an empty result set.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }

    /// Returns `true` if the error reports a `NULL` value for a non-nullable target.
    #[inline]
    pub fn is_null_value(&self) -> bool {
        matches!(self.kind, ErrorKind::NullValue { .. })
    }

    /// Returns the phase if the error was raised by the row source.
    #[inline]
    pub fn phase(&self) -> Option<Phase> {
        if let ErrorKind::RowSource { phase } = self.kind {
            Some(phase)
        } else {
            None
        }
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = &self.kind;
        if let Some(source) = &self.source {
            write!(f, "{kind}: {source}")
        } else {
            write!(f, "{kind}")
        }
    }
}

impl error::Error for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn error::Error + 'static))
    }
}

/// Returns `true` if the error reports an empty result set.
///
/// This is used for existence checks without inspecting the error message.
#[inline]
pub fn not_found(err: &Error) -> bool {
    err.is_not_found()
}

/// Creates an [`Error`] from the kind and logs it at the `warn` level.
macro_rules! warn_error {
    ($kind:expr $(,)?) => {{
        let err = $crate::error::Error::new($kind);
        tracing::warn!("{err}");
        err
    }};
}

/// Returns early with an [`Error`] created by [`warn_error!`].
macro_rules! bail {
    ($kind:expr $(,)?) => {
        return Err($crate::error::warn_error!($kind))
    };
}

pub(crate) use {bail, warn_error};

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, Phase};
    use std::{error::Error as _, io};

    #[test]
    fn it_formats_errors() {
        let err = Error::new(ErrorKind::TooManyRows { count: 3 });
        assert_eq!(err.to_string(), "expected 1 row, got: 3");

        let source = io::Error::new(io::ErrorKind::BrokenPipe, "connection reset");
        let err = Error::row_source(Phase::Write, source);
        assert_eq!(err.to_string(), "fail to write rows: connection reset");
        assert_eq!(err.phase(), Some(Phase::Write));
        assert!(err.source().is_some());
    }

    fn reject_closed(closed: bool) -> Result<(), Error> {
        if closed {
            super::bail!(ErrorKind::ScannerClosed);
        }
        Ok(())
    }

    #[test]
    fn it_creates_logged_errors() {
        let err = super::warn_error!(ErrorKind::NotFound);
        assert!(err.is_not_found());

        assert!(reject_closed(false).is_ok());
        let err = reject_closed(true).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ScannerClosed);
    }

    #[test]
    fn it_checks_not_found() {
        let err = Error::new(ErrorKind::NotFound);
        assert!(super::not_found(&err));
        assert!(!super::not_found(&Error::new(ErrorKind::ScannerClosed)));

        let wrapped = err.wrap(ErrorKind::Config);
        assert!(!wrapped.is_not_found());
        assert_eq!(wrapped.to_string(), "invalid scan config: no rows in result set");
    }
}
