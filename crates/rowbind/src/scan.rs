use crate::{
    Decimal, JsonValue, Map, RowValues, SharedString, TypeInfo, Uuid, Value,
    decode::{Decode, Json},
    error::{Error, ErrorKind, ShapeViolation, bail},
};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

/// A destination which rows can be scanned into.
///
/// It is implemented for primitives, `Option<T>`, `Vec<T>`, string-keyed maps,
/// and derived by `#[derive(Scan)]` for structs.
pub trait Scan: Default + 'static {
    /// Returns the type information used to classify the destination.
    fn type_info() -> TypeInfo;

    /// Binds the current row to `self`.
    fn scan_row(&mut self, row: &mut RowValues<'_>) -> Result<(), Error>;

    /// Returns `self` as a growable sequence if it is one.
    #[doc(hidden)]
    #[inline]
    fn as_sequence(&mut self) -> Option<&mut dyn Sequence> {
        None
    }
}

/// A growable sequence of destinations, one element per row.
pub trait Sequence {
    /// Removes all elements.
    fn clear(&mut self);

    /// Binds the current row to a new element and appends it.
    /// The sequence is left untouched if the binding fails.
    fn scan_element(&mut self, row: &mut RowValues<'_>) -> Result<(), Error>;

    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if the sequence contains no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Scan> Sequence for Vec<T> {
    #[inline]
    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn scan_element(&mut self, row: &mut RowValues<'_>) -> Result<(), Error> {
        let mut element = T::default();
        element.scan_row(row)?;
        self.push(element);
        Ok(())
    }

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T: Scan> Scan for Vec<T> {
    #[inline]
    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<T>()
    }

    fn scan_row(&mut self, _row: &mut RowValues<'_>) -> Result<(), Error> {
        bail!(ErrorKind::InvalidDestination {
            type_name: std::any::type_name::<Self>(),
            reason: ShapeViolation::UnexpectedSequence,
        });
    }

    #[inline]
    fn as_sequence(&mut self) -> Option<&mut dyn Sequence> {
        Some(self)
    }
}

impl<T: Scan> Scan for Option<T> {
    #[inline]
    fn type_info() -> TypeInfo {
        TypeInfo::nullable::<T>()
    }

    fn scan_row(&mut self, row: &mut RowValues<'_>) -> Result<(), Error> {
        if row.is_null() {
            *self = None;
        } else {
            let mut value = T::default();
            value.scan_row(row)?;
            *self = Some(value);
        }
        Ok(())
    }
}

macro_rules! impl_scan_primitive {
    ($($Ty:ty),+ $(,)?) => {
        $(
            impl Scan for $Ty {
                #[inline]
                fn type_info() -> TypeInfo {
                    TypeInfo::primitive::<Self>()
                }

                #[inline]
                fn scan_row(&mut self, row: &mut RowValues<'_>) -> Result<(), Error> {
                    row.scan_primitive(self)
                }
            }
        )+
    }
}

impl_scan_primitive!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    SharedString,
    Bytes,
    JsonValue,
    Uuid,
    Decimal,
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
    DateTime<Utc>,
    Value,
);

impl<T: DeserializeOwned + Default + 'static> Scan for Json<T> {
    #[inline]
    fn type_info() -> TypeInfo {
        TypeInfo::primitive::<Self>()
    }

    #[inline]
    fn scan_row(&mut self, row: &mut RowValues<'_>) -> Result<(), Error> {
        row.scan_primitive(self)
    }
}

impl<V, S> Scan for HashMap<String, V, S>
where
    V: Decode + 'static,
    S: BuildHasher + Default + 'static,
{
    #[inline]
    fn type_info() -> TypeInfo {
        TypeInfo::map::<Self>()
    }

    fn scan_row(&mut self, row: &mut RowValues<'_>) -> Result<(), Error> {
        row.scan_map(|key, value| {
            self.insert(key, value);
        })
    }
}

impl<V: Decode + 'static> Scan for BTreeMap<String, V> {
    #[inline]
    fn type_info() -> TypeInfo {
        TypeInfo::map::<Self>()
    }

    fn scan_row(&mut self, row: &mut RowValues<'_>) -> Result<(), Error> {
        row.scan_map(|key, value| {
            self.insert(key, value);
        })
    }
}

impl Scan for Map {
    #[inline]
    fn type_info() -> TypeInfo {
        TypeInfo::map::<Self>()
    }

    fn scan_row(&mut self, row: &mut RowValues<'_>) -> Result<(), Error> {
        row.scan_map(|key, value: JsonValue| {
            self.insert(key, value);
        })
    }
}
