use crate::FieldTarget;
use smallvec::SmallVec;
use std::fmt;

/// A struct field with the metadata used for column mapping.
///
/// Tables of descriptors are generated by `#[derive(Scan)]`.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Field identifier.
    name: &'static str,
    /// Position of the field in the declaration order.
    index: usize,
    /// A flag which indicates whether the field is visible outside its module.
    public: bool,
    /// Field type name.
    type_name: &'static str,
    /// Tags as key-value pairs.
    tags: &'static [(&'static str, &'static str)],
    /// A flag which indicates whether the field should never be bound.
    skipped: bool,
    /// Descriptors of the embedded struct if the field is flattened.
    embedded: Option<fn() -> &'static [FieldDescriptor]>,
}

impl FieldDescriptor {
    /// Creates a new instance.
    #[inline]
    pub const fn new(
        name: &'static str,
        index: usize,
        public: bool,
        type_name: &'static str,
    ) -> Self {
        Self {
            name,
            index,
            public,
            type_name,
            tags: &[],
            skipped: false,
            embedded: None,
        }
    }

    /// Sets the tags.
    #[inline]
    pub const fn tags(mut self, tags: &'static [(&'static str, &'static str)]) -> Self {
        self.tags = tags;
        self
    }

    /// Marks the field as skipped.
    #[inline]
    pub const fn skip(mut self) -> Self {
        self.skipped = true;
        self
    }

    /// Marks the field as an embedded struct described by the function.
    #[inline]
    pub const fn flatten(mut self, fields: fn() -> &'static [FieldDescriptor]) -> Self {
        self.embedded = Some(fields);
        self
    }

    /// Returns the field identifier.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the position of the field.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` if the field is visible outside its module.
    #[inline]
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Returns the field type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the value of the tag for the key.
    #[inline]
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find_map(|&(k, v)| (k == key).then_some(v))
    }

    /// Returns `true` if the field is skipped explicitly.
    #[inline]
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Returns the descriptors of the embedded struct.
    #[inline]
    pub fn embedded(&self) -> Option<&'static [FieldDescriptor]> {
        self.embedded.map(|fields| fields())
    }
}

/// A path of field-access steps from a struct root to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    /// Field positions.
    indices: SmallVec<[usize; 4]>,
    /// Field identifiers.
    names: SmallVec<[&'static str; 4]>,
}

impl FieldPath {
    /// Creates a path for the field.
    #[inline]
    pub fn new(field: &FieldDescriptor) -> Self {
        let mut path = Self::default();
        path.push(field);
        path
    }

    /// Appends a step.
    #[inline]
    pub fn push(&mut self, field: &FieldDescriptor) {
        self.indices.push(field.index());
        self.names.push(field.name());
    }

    /// Returns a new path with the steps of `child` appended.
    pub fn join(&self, child: &FieldPath) -> Self {
        let mut path = self.clone();
        path.indices.extend_from_slice(&child.indices);
        path.names.extend_from_slice(&child.names);
        path
    }

    /// Returns the field positions.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns the number of steps.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if the path has no steps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// A struct whose fields can be mapped to columns.
///
/// This trait can be derived by `rowbind::Scan`.
pub trait ScanStruct: Default + 'static {
    /// Returns the field descriptors in declaration order.
    fn fields() -> &'static [FieldDescriptor];

    /// Returns the scan target of the field at the path,
    /// allocating the optional embedded structs along it.
    fn field_mut(&mut self, path: &[usize]) -> Option<&mut dyn FieldTarget>;
}
