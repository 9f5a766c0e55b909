#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]

extern crate self as rowbind;

mod collect;
mod config;
mod decode;
mod field;
mod index;
mod row;
mod scan;
mod scanner;
mod shape;
mod source;
mod value;

pub mod error;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use collect::{Scanner, default_scanner, query_all, query_one, scan_all, scan_one, scan_row};
pub use config::{DEFAULT_TAG_KEY, ScanConfig};
pub use decode::{Decode, FieldTarget, Json};
pub use error::{Error, not_found};
pub use field::{FieldDescriptor, FieldPath, ScanStruct};
pub use index::{FieldIndex, StructIndexer, to_snake_case};
pub use row::RowValues;
pub use scan::{Scan, Sequence};
pub use scanner::RowScanner;
pub use shape::{Destination, Kind, Shape, TypeInfo, classify, classify_type};
pub use source::{MemoryRows, Querier, RowSource};
pub use value::Value;

#[doc(no_inline)]
pub use rowbind_derive::Scan;

/// A JSON value.
pub type JsonValue = serde_json::Value;

/// A JSON key-value type.
pub type Map = serde_json::Map<String, JsonValue>;

/// A Universally Unique Identifier (UUID).
pub type Uuid = uuid::Uuid;

/// A 128 bit representation of a fixed-precision decimal number.
pub type Decimal = rust_decimal::Decimal;

/// An allocation-optimized string.
pub type SharedString = std::borrow::Cow<'static, str>;

/// An owned dynamically typed error.
pub type BoxError = Box<dyn std::error::Error + Sync + Send + 'static>;

/// A value which is initialized on the first access.
pub(crate) type LazyLock<T> = std::sync::LazyLock<T>;
