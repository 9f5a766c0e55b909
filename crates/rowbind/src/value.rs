use crate::{Decimal, JsonValue, SharedString, Uuid};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// A column value written by a row source into a scan target.
///
/// This is the tagged variant between a row source and a destination:
/// either an explicit `Null` or a value decoded by the driver.
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// SQL `NULL`.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating-point number.
    Float(f64),
    /// A UTF-8 string.
    Text(String),
    /// A byte sequence.
    Bytes(Bytes),
    /// A JSON document.
    Json(JsonValue),
    /// A UUID.
    Uuid(Uuid),
    /// A fixed-precision decimal number.
    Decimal(Decimal),
    /// A calendar date.
    Date(NaiveDate),
    /// A time of day.
    Time(NaiveTime),
    /// A date and time without time zone.
    DateTime(NaiveDateTime),
    /// A point in time in UTC.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns `true` if the value is `Null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the kind of the value as a str.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Decimal(_) => "decimal",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Takes the value out, leaving `Null` in its place.
    #[inline]
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    /// Converts `self` into a JSON value.
    pub fn into_json(self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => b.into(),
            Value::Int(i) => i.into(),
            Value::UInt(u) => u.into(),
            Value::Float(f) => f.into(),
            Value::Text(s) => s.into(),
            Value::Bytes(bytes) => bytes.to_vec().into(),
            Value::Json(value) => value,
            Value::Uuid(id) => id.to_string().into(),
            Value::Decimal(d) => d.to_string().into(),
            Value::Date(date) => date.to_string().into(),
            Value::Time(time) => time.to_string().into(),
            Value::DateTime(dt) => dt.to_string().into(),
            Value::Timestamp(dt) => dt.to_rfc3339().into(),
        }
    }
}

macro_rules! impl_from_value {
    ($($Ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$Ty> for Value {
                #[inline]
                fn from(value: $Ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )+
    }
}

impl_from_value!(
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    &str => Text,
    String => Text,
    SharedString => Text,
    Bytes => Bytes,
    Vec<u8> => Bytes,
    JsonValue => Json,
    Uuid => Uuid,
    Decimal => Decimal,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    DateTime<Utc> => Timestamp,
);

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map(|v| v.into()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::Value;
    use serde_json::json;

    #[test]
    fn it_converts_values() {
        assert_eq!(Value::from("foo val"), Value::Text("foo val".to_owned()));
        assert_eq!(Value::from(7_i32), Value::Int(7));
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(1.5)), Value::Float(1.5));
        assert!(Value::default().is_null());
    }

    #[test]
    fn it_converts_values_into_json() {
        assert_eq!(Value::Int(42).into_json(), json!(42));
        assert_eq!(Value::Null.into_json(), json!(null));
        assert_eq!(Value::from(json!({"key": "key val"})).into_json(), json!({"key": "key val"}));
        assert_eq!(Value::Text("a".to_owned()).kind_name(), "text");
    }
}
