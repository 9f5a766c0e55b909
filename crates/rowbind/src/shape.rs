use crate::{
    FieldDescriptor, Scan, ScanStruct,
    error::{Error, ErrorKind, ShapeViolation, bail},
};
use std::{any::TypeId, fmt};

/// Structural category of a type as declared by its [`Scan`] impl.
#[derive(Debug, Clone)]
pub enum Kind {
    /// A value decoded from a single column.
    Primitive,
    /// A string-keyed map receiving every column.
    Map,
    /// A struct with its field descriptors.
    Struct(fn() -> &'static [FieldDescriptor]),
    /// An optional value of the inner type.
    Nullable(Box<TypeInfo>),
    /// A growable sequence of the element type.
    Sequence(Box<TypeInfo>),
}

/// Type information for scanning destinations.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// Type identity.
    type_id: TypeId,
    /// Type name.
    type_name: &'static str,
    /// Structural category.
    kind: Kind,
}

impl TypeInfo {
    /// Creates a new instance for `T`.
    #[inline]
    pub fn new<T: ?Sized + 'static>(kind: Kind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            kind,
        }
    }

    /// Type information for the primitive type `T`.
    #[inline]
    pub fn primitive<T: ?Sized + 'static>() -> Self {
        Self::new::<T>(Kind::Primitive)
    }

    /// Type information for the map type `T`.
    #[inline]
    pub fn map<T: ?Sized + 'static>() -> Self {
        Self::new::<T>(Kind::Map)
    }

    /// Type information for the struct type `T`.
    #[inline]
    pub fn structure<T: ScanStruct>() -> Self {
        Self::new::<T>(Kind::Struct(T::fields))
    }

    /// Type information for `Option<T>`.
    #[inline]
    pub fn nullable<T: Scan>() -> Self {
        Self::new::<Option<T>>(Kind::Nullable(Box::new(T::type_info())))
    }

    /// Type information for `Vec<T>`.
    #[inline]
    pub fn sequence<T: Scan>() -> Self {
        Self::new::<Vec<T>>(Kind::Sequence(Box::new(T::type_info())))
    }

    /// Returns the type identity.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the structural category.
    #[inline]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }
}

/// Classified structural category of a scanning destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single value from one column.
    Primitive,
    /// A single map.
    Map,
    /// A single struct.
    Struct,
    /// A sequence of primitive values.
    SliceOfPrimitive,
    /// A sequence of maps.
    SliceOfMap,
    /// A sequence of structs.
    SliceOfStruct,
}

impl Shape {
    /// Returns `true` if the shape is one of the sequence shapes.
    #[inline]
    pub fn is_sequence(&self) -> bool {
        matches!(
            self,
            Shape::SliceOfPrimitive | Shape::SliceOfMap | Shape::SliceOfStruct
        )
    }

    /// Returns the shape of a single element.
    #[inline]
    pub fn element_shape(&self) -> Shape {
        match self {
            Shape::Primitive | Shape::SliceOfPrimitive => Shape::Primitive,
            Shape::Map | Shape::SliceOfMap => Shape::Map,
            Shape::Struct | Shape::SliceOfStruct => Shape::Struct,
        }
    }

    /// Returns `self` as `&'static str`.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Primitive => "primitive",
            Shape::Map => "map",
            Shape::Struct => "struct",
            Shape::SliceOfPrimitive => "slice of primitive",
            Shape::SliceOfMap => "slice of map",
            Shape::SliceOfStruct => "slice of struct",
        }
    }
}

impl fmt::Display for Shape {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified destination.
#[derive(Debug, Clone)]
pub struct Destination {
    /// Classified shape.
    shape: Shape,
    /// Type identity of the destination.
    type_id: TypeId,
    /// Name of the destination type.
    type_name: &'static str,
    /// Type information of a single element, with indirections removed.
    element: TypeInfo,
    /// A flag which indicates whether the elements are optional.
    nullable_elements: bool,
}

impl Destination {
    /// Returns the shape.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the type identity of the destination.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the name of the destination type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type information of a single element.
    #[inline]
    pub fn element(&self) -> &TypeInfo {
        &self.element
    }

    /// Returns `true` if the elements are optional.
    #[inline]
    pub fn nullable_elements(&self) -> bool {
        self.nullable_elements
    }
}

/// Classifies the destination type `D`.
#[inline]
pub fn classify<D: Scan>() -> Result<Destination, Error> {
    classify_type(D::type_info())
}

/// Classifies a destination from its type information.
pub fn classify_type(info: TypeInfo) -> Result<Destination, Error> {
    let TypeInfo {
        type_id,
        type_name,
        kind,
    } = info;
    let invalid = |reason| ErrorKind::InvalidDestination { type_name, reason };
    let (shape, element, nullable_elements) = match kind {
        Kind::Nullable(inner) => {
            if !matches!(inner.kind, Kind::Primitive) {
                bail!(invalid(ShapeViolation::NestedIndirection));
            }
            (Shape::Primitive, *inner, true)
        }
        Kind::Sequence(element) => {
            let TypeInfo {
                type_id: element_type_id,
                type_name: element_type_name,
                kind: element_kind,
            } = *element;
            let (element, nullable) = match element_kind {
                Kind::Nullable(inner) => (*inner, true),
                kind => {
                    let element = TypeInfo {
                        type_id: element_type_id,
                        type_name: element_type_name,
                        kind,
                    };
                    (element, false)
                }
            };
            let shape = match element.kind {
                Kind::Primitive => Shape::SliceOfPrimitive,
                Kind::Map => Shape::SliceOfMap,
                Kind::Struct(_) => Shape::SliceOfStruct,
                Kind::Nullable(_) => bail!(invalid(ShapeViolation::NestedIndirection)),
                Kind::Sequence(_) => bail!(invalid(ShapeViolation::NestedSequence)),
            };
            (shape, element, nullable)
        }
        kind => {
            let shape = match kind {
                Kind::Map => Shape::Map,
                Kind::Struct(_) => Shape::Struct,
                _ => Shape::Primitive,
            };
            let element = TypeInfo {
                type_id,
                type_name,
                kind,
            };
            (shape, element, false)
        }
    };
    Ok(Destination {
        shape,
        type_id,
        type_name,
        element,
        nullable_elements,
    })
}
