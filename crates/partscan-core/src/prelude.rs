//! Convenient re-exports for downstream crates.

pub use crate::cast::{Caster, DefaultCaster};
pub use crate::config::{Broadcast, JobSettings, ScanConfig, SharedConfig};
pub use crate::descriptor::{PartitionDescriptor, PartitionSpec, SerdeProperties, TableDescriptor};
pub use crate::error::{Error, Result};
pub use crate::schema::{Attribute, DataType, Schema};
pub use crate::types::{NativeRecord, RawRecord, Row, Value};
