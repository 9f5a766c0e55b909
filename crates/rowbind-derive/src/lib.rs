//! Derived traits for [`rowbind`].
//!
//! [`rowbind`]: https://docs.rs/rowbind

#![forbid(unsafe_code)]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod parser;
mod scan;

/// Derives the `Scan` and `ScanStruct` traits.
///
/// The struct must have named fields, no generic parameters,
/// and implement `Default`.
///
/// # Attributes
///
/// - `#[scan(db = "column")]`: names the column under the tag key `db`;
///   any key is accepted and the configured tag key selects the one applied.
/// - `#[scan(db = "-")]` or `#[scan(skip)]`: never binds the field.
/// - `#[scan(flatten)]`: surfaces the columns of an embedded struct
///   at the parent level; an explicit tag prefixes them with `<tag>.`.
///   The field may be wrapped in `Box` or `Option`.
/// - `#[scan(primitive)]` on the container: scans the type from a single column
///   through its own `Decode` implementation.
#[proc_macro_derive(Scan, attributes(scan))]
pub fn derive_scan(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let output = scan::parse_token_stream(input);
    TokenStream::from(output)
}
