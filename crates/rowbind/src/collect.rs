use crate::{
    LazyLock, Querier, RowScanner, RowSource, Scan, ScanConfig, StructIndexer, Value,
    error::{Error, ErrorKind, Phase, ShapeViolation, bail},
    shape::classify,
    source::source_error,
};

/// A configured entry point for scanning rows.
///
/// # Examples
///
/// ```rust
/// use rowbind::{MemoryRows, ScanConfig, Scanner, Value};
///
/// let scanner = Scanner::new(ScanConfig::new().with_tag_key("column"));
/// let rows = MemoryRows::new(["id"])
///     .with_row(vec![Value::Int(1)])
///     .with_row(vec![Value::Int(2)]);
/// let mut ids = vec![7_i64];
/// scanner.scan_all(&mut ids, rows)?;
/// assert_eq!(ids, [1, 2]);
/// # Ok::<(), rowbind::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    /// Scanning config.
    config: ScanConfig,
    /// Indexer for struct destinations.
    indexer: StructIndexer,
}

impl Scanner {
    /// Creates a new instance with the config.
    #[inline]
    pub fn new(config: ScanConfig) -> Self {
        let indexer = StructIndexer::new(&config);
        Self { config, indexer }
    }

    /// Returns the config.
    #[inline]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Returns the indexer for struct destinations.
    #[inline]
    pub fn indexer(&self) -> &StructIndexer {
        &self.indexer
    }

    /// Creates a row scanner over the rows.
    #[inline]
    pub fn row_scanner<R: RowSource>(&self, rows: R) -> RowScanner<R> {
        RowScanner::with_indexer(rows, self.indexer.clone())
    }

    /// Scans all the rows into the sequence destination.
    ///
    /// The destination is cleared first, then grown by one element per row.
    /// The rows are always closed.
    pub fn scan_all<D: Scan, R: RowSource>(&self, dst: &mut D, rows: R) -> Result<(), Error> {
        let mut scanner = self.row_scanner(rows);
        let result = collect_rows(&mut scanner, dst);
        let len = dst
            .as_sequence()
            .map(|sequence| sequence.len())
            .unwrap_or_default();
        finish(result, scanner.close())?;
        tracing::debug!(
            type_name = std::any::type_name::<D>(),
            num_rows = len,
            "scan all the rows",
        );
        Ok(())
    }

    /// Scans exactly one row into the destination.
    ///
    /// It fails with [`ErrorKind::NotFound`] for zero rows
    /// and with [`ErrorKind::TooManyRows`] for more than one row.
    /// The rows are always closed.
    pub fn scan_one<D: Scan, R: RowSource>(&self, dst: &mut D, rows: R) -> Result<(), Error> {
        let mut scanner = self.row_scanner(rows);
        let result = fetch_one(&mut scanner, dst);
        finish(result, scanner.close())?;
        tracing::debug!(type_name = std::any::type_name::<D>(), "scan one row");
        Ok(())
    }

    /// Scans the current row into the destination without advancing or closing the rows.
    #[inline]
    pub fn scan_row<D: Scan, R: RowSource>(&self, dst: &mut D, rows: R) -> Result<(), Error> {
        self.row_scanner(rows).scan(dst)
    }

    /// Runs the query and scans all the rows into the sequence destination.
    pub fn query_all<D: Scan, Q: Querier>(
        &self,
        dst: &mut D,
        querier: &mut Q,
        sql: &str,
        params: &[Value],
    ) -> Result<(), Error> {
        let rows = querier
            .query(sql, params)
            .map_err(|err| source_error(Phase::Query, err))?;
        self.scan_all(dst, rows)
    }

    /// Runs the query and scans exactly one row into the destination.
    pub fn query_one<D: Scan, Q: Querier>(
        &self,
        dst: &mut D,
        querier: &mut Q,
        sql: &str,
        params: &[Value],
    ) -> Result<(), Error> {
        let rows = querier
            .query(sql, params)
            .map_err(|err| source_error(Phase::Query, err))?;
        self.scan_one(dst, rows)
    }
}

/// Clears the sequence destination and appends one element per row.
fn collect_rows<D: Scan, R: RowSource>(
    scanner: &mut RowScanner<R>,
    dst: &mut D,
) -> Result<(), Error> {
    let destination = classify::<D>()?;
    let Some(sequence) = dst
        .as_sequence()
        .filter(|_| destination.shape().is_sequence())
    else {
        bail!(ErrorKind::InvalidDestination {
            type_name: destination.type_name(),
            reason: ShapeViolation::NotSequence,
        });
    };
    sequence.clear();
    while scanner.advance()? {
        scanner.append(dst)?;
    }
    Ok(())
}

/// Binds the only row, then drains and counts the remaining ones.
fn fetch_one<D: Scan, R: RowSource>(scanner: &mut RowScanner<R>, dst: &mut D) -> Result<(), Error> {
    let destination = classify::<D>()?;
    if destination.shape().is_sequence() {
        bail!(ErrorKind::InvalidDestination {
            type_name: destination.type_name(),
            reason: ShapeViolation::UnexpectedSequence,
        });
    }
    if !scanner.advance()? {
        return Err(Error::new(ErrorKind::NotFound));
    }
    scanner.scan(dst)?;

    let mut count = 1;
    while scanner.advance()? {
        count += 1;
    }
    if count > 1 {
        bail!(ErrorKind::TooManyRows { count });
    }
    Ok(())
}

/// Combines the result with the outcome of closing the rows,
/// reporting a close failure only if nothing else failed.
fn finish(result: Result<(), Error>, closed: Result<(), Error>) -> Result<(), Error> {
    result?;
    closed
}

/// Default scanner.
static DEFAULT_SCANNER: LazyLock<Scanner> = LazyLock::new(Scanner::default);

/// Returns the default scanner.
#[inline]
pub fn default_scanner() -> &'static Scanner {
    &DEFAULT_SCANNER
}

/// Scans all the rows into the sequence destination with the default scanner.
///
/// # Examples
///
/// ```rust
/// use rowbind::{MemoryRows, Value};
/// use std::collections::HashMap;
///
/// let rows = MemoryRows::new(["foo", "bar"])
///     .with_row(vec![Value::from("foo val"), Value::from("bar val")]);
/// let mut maps = Vec::<HashMap<String, Value>>::new();
/// rowbind::scan_all(&mut maps, rows)?;
/// assert_eq!(maps[0]["bar"], Value::from("bar val"));
/// # Ok::<(), rowbind::Error>(())
/// ```
#[inline]
pub fn scan_all<D: Scan, R: RowSource>(dst: &mut D, rows: R) -> Result<(), Error> {
    DEFAULT_SCANNER.scan_all(dst, rows)
}

/// Scans exactly one row into the destination with the default scanner.
#[inline]
pub fn scan_one<D: Scan, R: RowSource>(dst: &mut D, rows: R) -> Result<(), Error> {
    DEFAULT_SCANNER.scan_one(dst, rows)
}

/// Scans the current row into the destination with the default scanner.
#[inline]
pub fn scan_row<D: Scan, R: RowSource>(dst: &mut D, rows: R) -> Result<(), Error> {
    DEFAULT_SCANNER.scan_row(dst, rows)
}

/// Runs the query and scans all the rows with the default scanner.
#[inline]
pub fn query_all<D: Scan, Q: Querier>(
    dst: &mut D,
    querier: &mut Q,
    sql: &str,
    params: &[Value],
) -> Result<(), Error> {
    DEFAULT_SCANNER.query_all(dst, querier, sql, params)
}

/// Runs the query and scans exactly one row with the default scanner.
#[inline]
pub fn query_one<D: Scan, Q: Querier>(
    dst: &mut D,
    querier: &mut Q,
    sql: &str,
    params: &[Value],
) -> Result<(), Error> {
    DEFAULT_SCANNER.query_one(dst, querier, sql, params)
}
