use crate::{BoxError, Decimal, JsonValue, SharedString, Uuid, Value, error::Error};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use std::ops::{Deref, DerefMut};

/// Decoding a column value into a concrete type.
///
/// Every type which can receive a single column implements this trait:
/// struct fields, map values and primitive destinations.
/// A custom type owns its decoding by implementing it directly.
pub trait Decode: Sized {
    /// Decodes a non-null value.
    fn decode(value: Value) -> Result<Self, BoxError>;

    /// Returns the representation of `NULL`,
    /// or `None` if the type can not hold it.
    #[inline]
    fn decode_null() -> Option<Self> {
        None
    }
}

/// An addressable slot in a destination which receives one column.
///
/// It is implemented for all types implementing [`Decode`].
pub trait FieldTarget {
    /// Sets the target to `NULL`, returning `false` if it is not nullable.
    fn set_null(&mut self) -> bool;

    /// Sets the target to the decoded non-null value.
    fn set_value(&mut self, value: Value) -> Result<(), BoxError>;

    /// Returns the name of the target type.
    fn target_type(&self) -> &'static str;
}

impl<T: Decode> FieldTarget for T {
    #[inline]
    fn set_null(&mut self) -> bool {
        if let Some(value) = T::decode_null() {
            *self = value;
            true
        } else {
            false
        }
    }

    #[inline]
    fn set_value(&mut self, value: Value) -> Result<(), BoxError> {
        *self = T::decode(value)?;
        Ok(())
    }

    #[inline]
    fn target_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Returns an error for a value which is incompatible with `T`.
#[inline]
fn mismatch<T>(value: &Value) -> BoxError {
    Error::mismatch::<T>(value.kind_name()).into()
}

impl Decode for Value {
    #[inline]
    fn decode(value: Value) -> Result<Self, BoxError> {
        Ok(value)
    }

    #[inline]
    fn decode_null() -> Option<Self> {
        Some(Value::Null)
    }
}

impl<T: Decode> Decode for Option<T> {
    #[inline]
    fn decode(value: Value) -> Result<Self, BoxError> {
        T::decode(value).map(Some)
    }

    #[inline]
    fn decode_null() -> Option<Self> {
        Some(None)
    }
}

impl Decode for bool {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i @ (0 | 1)) => Ok(i == 1),
            Value::UInt(u @ (0 | 1)) => Ok(u == 1),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

macro_rules! impl_decode_integer {
    ($($Int:ty),+ $(,)?) => {
        $(
            impl Decode for $Int {
                fn decode(value: Value) -> Result<Self, BoxError> {
                    match value {
                        Value::Int(i) => Ok(<$Int>::try_from(i)?),
                        Value::UInt(u) => Ok(<$Int>::try_from(u)?),
                        _ => Err(mismatch::<Self>(&value)),
                    }
                }
            }
        )+
    }
}

impl_decode_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Largest integer magnitude which a `f64` represents exactly.
const MAX_SAFE_INTEGER: u64 = 1 << 53;

impl Decode for f64 {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) if i.unsigned_abs() <= MAX_SAFE_INTEGER => Ok(i as f64),
            Value::UInt(u) if u <= MAX_SAFE_INTEGER => Ok(u as f64),
            Value::Int(i) => Err(format!("integer `{i}` is not exact as a float").into()),
            Value::UInt(u) => Err(format!("integer `{u}` is not exact as a float").into()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl Decode for f32 {
    fn decode(value: Value) -> Result<Self, BoxError> {
        let f = f64::decode(value)?;
        let narrowed = f as f32;
        if f.is_finite() && !narrowed.is_finite() {
            return Err(format!("float `{f}` is out of range for `f32`").into());
        }
        Ok(narrowed)
    }
}

impl Decode for String {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Text(s) => Ok(s),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl Decode for SharedString {
    #[inline]
    fn decode(value: Value) -> Result<Self, BoxError> {
        String::decode(value).map(SharedString::Owned)
    }
}

impl Decode for Bytes {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl Decode for Vec<u8> {
    #[inline]
    fn decode(value: Value) -> Result<Self, BoxError> {
        Bytes::decode(value).map(Vec::from)
    }
}

impl Decode for JsonValue {
    #[inline]
    fn decode(value: Value) -> Result<Self, BoxError> {
        Ok(value.into_json())
    }

    #[inline]
    fn decode_null() -> Option<Self> {
        Some(JsonValue::Null)
    }
}

impl Decode for Uuid {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Uuid(id) => Ok(id),
            Value::Text(s) => Ok(s.parse()?),
            Value::Bytes(bytes) => Ok(Uuid::from_slice(&bytes)?),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl Decode for Decimal {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::Int(i) => Ok(i.into()),
            Value::UInt(u) => Ok(u.into()),
            Value::Float(f) => Ok(Decimal::try_from(f)?),
            Value::Text(s) => Ok(s.parse()?),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl Decode for NaiveDate {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Date(date) => Ok(date),
            Value::Text(s) => Ok(s.parse()?),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl Decode for NaiveTime {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Time(time) => Ok(time),
            Value::Text(s) => Ok(s.parse()?),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl Decode for NaiveDateTime {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            Value::Timestamp(dt) => Ok(dt.naive_utc()),
            Value::Text(s) => {
                let dt = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f")
                    .or_else(|_| s.parse())?;
                Ok(dt)
            }
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl Decode for DateTime<Utc> {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Timestamp(dt) => Ok(dt),
            Value::DateTime(dt) => Ok(dt.and_utc()),
            Value::Text(s) => Ok(DateTime::parse_from_rfc3339(&s)?.to_utc()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

/// A column holding a JSON document which is deserialized into `T`.
///
/// This is the explicit hint for columns whose values are maps or lists:
/// the document is decoded as a whole instead of being spread into a map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consumes `self` and returns the inner value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: DeserializeOwned> Decode for Json<T> {
    fn decode(value: Value) -> Result<Self, BoxError> {
        match value {
            Value::Json(value) => Ok(Json(serde_json::from_value(value)?)),
            Value::Text(s) => Ok(Json(serde_json::from_str(&s)?)),
            Value::Bytes(bytes) => Ok(Json(serde_json::from_slice(&bytes)?)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}
