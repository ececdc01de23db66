//! The per-split unit of work handed to a worker.
//!
//! A `ScanTask` carries exactly what one worker needs and nothing else:
//! the split, the unit's merged settings, the format and deserializer to
//! instantiate, the physical column layout, and a row template whose
//! partition key slots were filled once for the whole partition.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use partscan_core::config::JobSettings;
use partscan_core::descriptor::SerdeProperties;
use partscan_core::error::Result;
use partscan_core::schema::Attribute;
use partscan_core::types::Row;
use partscan_io::{FileSystem, InputFormat, InputSplit};
use partscan_serde::DeserializerFactory;

use crate::materialize::RowMaterializer;
use crate::resolve::resolve_fields;

/// State shared by every split of one unit.
pub(crate) struct UnitContext {
    pub unit: Arc<str>,
    pub fs: Arc<dyn FileSystem>,
    pub format: Arc<dyn InputFormat>,
    pub settings: Arc<JobSettings>,
    pub properties: SerdeProperties,
    pub deserializer_id: String,
    pub deserializer: DeserializerFactory,
    /// Physical columns and their output slots.
    pub columns: Vec<(Attribute, usize)>,
    /// Output row with partition key slots already written.
    pub template: Row,
}

#[derive(Clone)]
pub struct ScanTask {
    ctx: Arc<UnitContext>,
    split: InputSplit,
}

/// Serializable description of a task, for plans and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub unit: String,
    pub split: InputSplit,
    pub input_format: String,
    pub deserializer: String,
}

impl ScanTask {
    pub(crate) fn new(ctx: Arc<UnitContext>, split: InputSplit) -> Self {
        Self { ctx, split }
    }

    pub fn unit(&self) -> &str {
        &self.ctx.unit
    }

    pub fn split(&self) -> &InputSplit {
        &self.split
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            unit: self.ctx.unit.to_string(),
            split: self.split.clone(),
            input_format: self.ctx.format.name().to_string(),
            deserializer: self.ctx.deserializer_id.clone(),
        }
    }

    /// Open the split and build its materializer.
    ///
    /// The deserializer is created fresh here, resolved against its own
    /// record shape, and never shared with another task.
    pub fn open(&self) -> Result<RowMaterializer> {
        self.open_inner()
            .map_err(|e| e.in_unit(self.ctx.unit.to_string()))
    }

    fn open_inner(&self) -> Result<RowMaterializer> {
        let ctx = &self.ctx;
        trace!(unit = %ctx.unit, split = %self.split, "opening split");
        let mut deserializer = (ctx.deserializer)();
        deserializer.initialize(&ctx.settings, &ctx.properties)?;
        let shape = deserializer.shape()?;
        let fields = resolve_fields(shape.as_ref(), &ctx.columns)?;
        let reader = ctx
            .format
            .open(ctx.fs.as_ref(), &self.split, &ctx.settings)?;
        Ok(RowMaterializer::new(
            ctx.unit.clone(),
            reader,
            deserializer,
            shape,
            fields,
            ctx.template.clone(),
        ))
    }
}

impl fmt::Debug for ScanTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanTask")
            .field("unit", &self.ctx.unit)
            .field("split", &self.split)
            .field("deserializer", &self.ctx.deserializer_id)
            .finish()
    }
}

impl fmt::Display for ScanTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ctx.unit, self.split)
    }
}
