use crate::{
    FieldDescriptor, FieldPath, LazyLock, ScanConfig, ScanStruct, SharedString, TypeInfo,
    error::{Error, ErrorKind, bail},
    shape::Kind,
};
use ahash::{HashMap, HashMapExt};
use parking_lot::RwLock;
use regex::Regex;
use std::{any::TypeId, sync::Arc};

/// A mapping from column names to the field paths receiving them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIndex {
    /// Name of the struct type.
    type_name: &'static str,
    /// Columns in the declaration order of their fields.
    columns: Vec<(String, FieldPath)>,
    /// Positions of the columns.
    positions: HashMap<String, usize>,
}

impl FieldIndex {
    /// Creates an empty index for the type.
    fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            columns: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Registers the column, failing if another field already claims it.
    fn insert(&mut self, column: String, path: FieldPath) -> Result<(), Error> {
        if let Some(&position) = self.positions.get(&column) {
            let first = self.columns[position].1.clone();
            bail!(ErrorKind::DuplicateColumn {
                type_name: self.type_name,
                column,
                first,
                second: path,
            });
        }
        self.positions.insert(column.clone(), self.columns.len());
        self.columns.push((column, path));
        Ok(())
    }

    /// Returns the name of the struct type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the field path for the column.
    #[inline]
    pub fn get(&self, column: &str) -> Option<&FieldPath> {
        self.positions
            .get(column)
            .map(|&position| &self.columns[position].1)
    }

    /// Returns an iterator over the columns and their field paths.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldPath)> {
        self.columns
            .iter()
            .map(|(column, path)| (column.as_str(), path))
    }

    /// Returns the number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if no column is mapped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Builds column mappings for struct types.
#[derive(Debug, Clone)]
pub struct StructIndexer {
    /// Key of the field tags naming columns.
    tag_key: SharedString,
}

impl StructIndexer {
    /// Creates a new instance with the config.
    #[inline]
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            tag_key: config.tag_key().to_owned().into(),
        }
    }

    /// Returns the key of the field tags.
    #[inline]
    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }

    /// Returns the memoized column mapping of the struct type `S`.
    #[inline]
    pub fn index_of<S: ScanStruct>(&self) -> Result<Arc<FieldIndex>, Error> {
        self.index(&TypeInfo::structure::<S>())
    }

    /// Returns the memoized column mapping of the struct type.
    pub fn index(&self, info: &TypeInfo) -> Result<Arc<FieldIndex>, Error> {
        let Kind::Struct(fields) = info.kind() else {
            return Err(Error::new(ErrorKind::TypeMismatch {
                expected: "struct",
                found: info.type_name(),
            }));
        };
        let key = (info.type_id(), self.tag_key.clone());
        if let Some(index) = FIELD_INDEXES.read().get(&key) {
            return Ok(index.clone());
        }

        let index = Arc::new(self.build(info.type_name(), fields())?);
        tracing::debug!(
            type_name = index.type_name(),
            tag_key = self.tag_key(),
            num_columns = index.len(),
            "build the field index",
        );
        Ok(FIELD_INDEXES.write().entry(key).or_insert(index).clone())
    }

    /// Builds the column mapping for the fields of a struct type without memoization.
    pub fn build(
        &self,
        type_name: &'static str,
        fields: &'static [FieldDescriptor],
    ) -> Result<FieldIndex, Error> {
        let mut index = FieldIndex::new(type_name);
        self.visit(fields, &FieldPath::default(), "", &mut index)?;
        Ok(index)
    }

    /// Registers the columns of the fields with the path and column prefix.
    fn visit(
        &self,
        fields: &'static [FieldDescriptor],
        parent: &FieldPath,
        prefix: &str,
        index: &mut FieldIndex,
    ) -> Result<(), Error> {
        for field in fields {
            if !field.is_public() {
                continue;
            }

            let tag = field.tag(&self.tag_key).filter(|tag| !tag.is_empty());
            if field.is_skipped() || tag == Some("-") {
                continue;
            }

            let mut path = parent.clone();
            path.push(field);
            if let Some(children) = field.embedded() {
                if let Some(tag) = tag {
                    let prefix = format!("{prefix}{tag}.");
                    self.visit(children, &path, &prefix, index)?;
                } else {
                    self.visit(children, &path, prefix, index)?;
                }
            } else {
                let column = if let Some(tag) = tag {
                    format!("{prefix}{tag}")
                } else {
                    format!("{prefix}{}", to_snake_case(field.name()))
                };
                index.insert(column, path)?;
            }
        }
        Ok(())
    }
}

impl Default for StructIndexer {
    #[inline]
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}

/// Converts an identifier to lower snake case.
pub fn to_snake_case(s: &str) -> String {
    let snake = FIRST_CAP.replace_all(s, "${1}_${2}");
    let snake = ALL_CAP.replace_all(&snake, "${1}_${2}");
    snake.to_lowercase()
}

/// A capital letter followed by lowercase letters.
static FIRST_CAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(.)([A-Z][a-z]+)").expect("fail to create a regex for the first capital")
});

/// A lowercase letter or digit followed by a capital letter.
static ALL_CAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("([a-z0-9])([A-Z])").expect("fail to create a regex for the capitals")
});

/// Memoized field indexes keyed by the type identity and the tag key.
static FIELD_INDEXES: LazyLock<RwLock<HashMap<(TypeId, SharedString), Arc<FieldIndex>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));
