#![forbid(unsafe_code)]
//! partscan-core: the data model shared by every partscan crate.
//!
//! - `schema`: logical types, attributes, and output schemas.
//! - `types`: runtime values, the reusable `Row` buffer, raw/native records.
//! - `descriptor`: catalog-supplied table and partition metadata.
//! - `config`: job settings, the broadcast `SharedConfig`, typed `ScanConfig`.
//! - `cast`: string-literal casting used for partition key values.
//!
//! No I/O lives here; filesystem and format code is in `partscan-io`.

pub mod cast;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod hash;
pub mod prelude;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
