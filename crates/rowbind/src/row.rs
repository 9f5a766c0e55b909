use crate::{
    Destination, FieldPath, FieldTarget, ScanStruct, Shape, StructIndexer, Value,
    decode::Decode,
    error::{Error, ErrorKind, bail},
};

/// How the columns of a row are routed into a destination element.
#[derive(Debug, Clone)]
pub(crate) enum BindPlan {
    /// The single column is decoded into the element.
    Primitive,
    /// Every column is inserted into the map at its name.
    Map,
    /// Every column is bound to the field at its path.
    Struct {
        /// Name of the struct type.
        type_name: &'static str,
        /// Field paths in the column order.
        paths: Vec<FieldPath>,
    },
}

impl BindPlan {
    /// Builds the plan for the destination and the columns.
    /// Columns which can not be routed are rejected before any row is bound.
    pub(crate) fn new(
        destination: &Destination,
        columns: &[String],
        indexer: &StructIndexer,
    ) -> Result<Self, Error> {
        let element = destination.element();
        match destination.shape().element_shape() {
            Shape::Primitive => {
                if columns.len() != 1 {
                    bail!(ErrorKind::ColumnCount {
                        type_name: element.type_name(),
                        count: columns.len(),
                    });
                }
                Ok(Self::Primitive)
            }
            Shape::Struct => {
                let index = indexer.index(element)?;
                let type_name = element.type_name();
                let mut paths = Vec::with_capacity(columns.len());
                for column in columns {
                    let Some(path) = index.get(column) else {
                        bail!(ErrorKind::UnmappedColumn {
                            type_name,
                            column: column.clone(),
                        });
                    };
                    paths.push(path.clone());
                }
                Ok(Self::Struct { type_name, paths })
            }
            _ => Ok(Self::Map),
        }
    }

    /// Returns the name of the plan.
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Map => "map",
            Self::Struct { .. } => "struct",
        }
    }
}

/// Column values of the current row, routed by the binding plan of a session.
///
/// It is passed to [`Scan::scan_row`](crate::Scan::scan_row).
/// Each value is moved out when it is bound.
#[derive(Debug)]
pub struct RowValues<'r> {
    /// Column names.
    columns: &'r [String],
    /// Values written by the row source.
    values: &'r mut [Value],
    /// Routing of the columns.
    plan: &'r BindPlan,
}

impl<'r> RowValues<'r> {
    /// Creates a new instance.
    #[inline]
    pub(crate) fn new(columns: &'r [String], values: &'r mut [Value], plan: &'r BindPlan) -> Self {
        Self {
            columns,
            values,
            plan,
        }
    }

    /// Returns the column names.
    #[inline]
    pub fn columns(&self) -> &[String] {
        self.columns
    }

    /// Returns `true` if the row is a single `NULL` bound to a primitive.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self.plan, BindPlan::Primitive) && self.values.first().is_some_and(Value::is_null)
    }

    /// Binds the single column to the target.
    pub fn scan_primitive<T: FieldTarget + ?Sized>(&mut self, target: &mut T) -> Result<(), Error> {
        self.expect_plan("primitive")?;
        if let (Some(column), Some(value)) = (self.columns.first(), self.values.first_mut()) {
            bind_value(target, column, None, value.take())?;
        }
        Ok(())
    }

    /// Decodes every column and passes it to `insert` with the column name.
    /// Nothing is inserted if any column fails.
    pub fn scan_map<V: Decode>(&mut self, mut insert: impl FnMut(String, V)) -> Result<(), Error> {
        self.expect_plan("map")?;

        let mut entries = Vec::with_capacity(self.columns.len());
        for (column, value) in self.columns.iter().zip(self.values.iter_mut()) {
            let value = value.take();
            let value = if value.is_null() {
                let Some(value) = V::decode_null() else {
                    bail!(ErrorKind::NullValue {
                        column: column.clone(),
                        field: None,
                        type_name: std::any::type_name::<V>(),
                    });
                };
                value
            } else {
                V::decode(value).map_err(|err| decode_error(column, None, err))?
            };
            entries.push((column.clone(), value));
        }
        for (key, value) in entries {
            insert(key, value);
        }
        Ok(())
    }

    /// Binds every column to its field in the struct,
    /// allocating the optional embedded structs along the paths.
    pub fn scan_struct<S: ScanStruct>(&mut self, dst: &mut S) -> Result<(), Error> {
        let BindPlan::Struct { type_name, paths } = self.plan else {
            return Err(self.plan_mismatch("struct"));
        };
        let entries = self.columns.iter().zip(self.values.iter_mut()).zip(paths);
        for ((column, value), path) in entries {
            let Some(target) = dst.field_mut(path.indices()) else {
                bail!(ErrorKind::UnmappedColumn {
                    type_name: *type_name,
                    column: column.clone(),
                });
            };
            bind_value(target, column, Some(path), value.take())?;
        }
        Ok(())
    }

    /// Checks that the columns are routed as expected.
    fn expect_plan(&self, expected: &'static str) -> Result<(), Error> {
        if self.plan.as_str() == expected {
            Ok(())
        } else {
            Err(self.plan_mismatch(expected))
        }
    }

    /// Creates an error for a destination bound with another plan.
    fn plan_mismatch(&self, expected: &'static str) -> Error {
        crate::error::warn_error!(ErrorKind::TypeMismatch {
            expected,
            found: self.plan.as_str(),
        })
    }
}

/// Binds a value to the target, checking the nullability.
fn bind_value<T: FieldTarget + ?Sized>(
    target: &mut T,
    column: &str,
    field: Option<&FieldPath>,
    value: Value,
) -> Result<(), Error> {
    if !value.is_null() {
        return target
            .set_value(value)
            .map_err(|err| decode_error(column, field, err));
    }
    if !target.set_null() {
        bail!(ErrorKind::NullValue {
            column: column.to_owned(),
            field: field.cloned(),
            type_name: target.target_type(),
        });
    }
    Ok(())
}

/// Creates an error for a value which can not be decoded.
fn decode_error(column: &str, field: Option<&FieldPath>, err: crate::BoxError) -> Error {
    let err = Error::with_source(
        ErrorKind::Decode {
            column: column.to_owned(),
            field: field.cloned(),
        },
        err,
    );
    tracing::warn!("{err}");
    err
}
