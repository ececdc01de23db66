//! `TableReader`: the scan entry points.
//!
//! A reader owns one broadcast configuration, built at construction and
//! shared by every task of every scan it produces. The split count hint is
//! fixed at construction as well.
//!
//! Every unit (the table, or one partition) gets its own split plan, its own
//! deserializer instances, and its own row buffer. The row stream returned to
//! the caller is the union of the units' split tasks.

use std::sync::Arc;

use tracing::{debug, info, warn};

use partscan_core::cast::{Caster, DefaultCaster};
use partscan_core::config::{Broadcast, JobSettings, SharedConfig};
use partscan_core::descriptor::{PartitionDescriptor, SerdeProperties, TableDescriptor};
use partscan_core::error::{Error, Result};
use partscan_core::schema::{Attribute, Schema};
use partscan_core::types::Row;
use partscan_io::{FileSystem, LocalFileSystem, PathFilter};
use partscan_serde::DeserializerRegistry;

use crate::partition_keys::inject_partition_keys;
use crate::planner::plan_splits;
use crate::registry::InputFormatRegistry;
use crate::stream::RowStream;
use crate::task::{ScanTask, UnitContext};

/// Per-call scan options.
#[derive(Clone, Default)]
pub struct ScanOptions {
    /// Applied to the immediate entries of each storage location.
    pub path_filter: Option<Arc<dyn PathFilter>>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_filter(mut self, filter: impl PathFilter + 'static) -> Self {
        self.path_filter = Some(Arc::new(filter));
        self
    }
}

impl std::fmt::Debug for ScanOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanOptions")
            .field("path_filter", &self.path_filter.is_some())
            .finish()
    }
}

/// One unit of a scan before splits are computed.
struct UnitSpec<'a> {
    identity: String,
    location: &'a str,
    input_format: &'a str,
    deserializer: &'a str,
    properties: &'a SerdeProperties,
    columns: Vec<(Attribute, usize)>,
    template: Row,
}

pub struct TableReader {
    attributes: Vec<Attribute>,
    config: Broadcast<SharedConfig>,
    min_splits: usize,
    fs: Arc<dyn FileSystem>,
    formats: InputFormatRegistry,
    deserializers: DeserializerRegistry,
    caster: Arc<dyn Caster>,
}

impl TableReader {
    /// `attributes` is the output schema of unpartitioned table scans.
    pub fn new(attributes: Vec<Attribute>, settings: JobSettings) -> Result<Self> {
        Schema::try_new(attributes.clone())?;
        let config = SharedConfig::broadcast(settings)?;
        let min_splits = config.scan().min_splits();
        info!(
            fingerprint = %config.fingerprint().short(),
            min_splits,
            max_parallel = config.scan().max_parallel_tasks,
            "table reader configured"
        );
        Ok(Self {
            attributes,
            config,
            min_splits,
            fs: Arc::new(LocalFileSystem::new()),
            formats: InputFormatRegistry::default(),
            deserializers: DeserializerRegistry::default(),
            caster: Arc::new(DefaultCaster),
        })
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_input_formats(mut self, formats: InputFormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_deserializers(mut self, deserializers: DeserializerRegistry) -> Self {
        self.deserializers = deserializers;
        self
    }

    pub fn with_caster(mut self, caster: Arc<dyn Caster>) -> Self {
        self.caster = caster;
        self
    }

    pub fn config(&self) -> &Broadcast<SharedConfig> {
        &self.config
    }

    pub fn min_splits(&self) -> usize {
        self.min_splits
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn scan_table(&self, table: &TableDescriptor) -> Result<RowStream> {
        self.scan_table_with(table, &ScanOptions::default())
    }

    /// Scan an unpartitioned table.
    ///
    /// A partitioned table is rejected before any I/O with
    /// `Error::InvalidTableState`.
    pub fn scan_table_with(
        &self,
        table: &TableDescriptor,
        options: &ScanOptions,
    ) -> Result<RowStream> {
        let tasks = self.plan_table_with(table, options)?;
        Ok(self.stream(tasks))
    }

    pub fn scan_partitions(
        &self,
        partitions: &[PartitionDescriptor],
        output_schema: &[Attribute],
    ) -> Result<RowStream> {
        self.scan_partitions_with(partitions, output_schema, &ScanOptions::default())
    }

    /// Scan a set of partitions, producing the union of their rows.
    ///
    /// An empty partition list yields an empty stream.
    pub fn scan_partitions_with(
        &self,
        partitions: &[PartitionDescriptor],
        output_schema: &[Attribute],
        options: &ScanOptions,
    ) -> Result<RowStream> {
        if partitions.is_empty() {
            info!("no partitions to scan");
            return Ok(RowStream::empty());
        }
        let mut streams = Vec::with_capacity(partitions.len());
        for p in partitions {
            let tasks = self.plan_partition(p, output_schema, options)?;
            streams.push(self.stream(tasks));
        }
        Ok(RowStream::union(streams))
    }

    pub fn plan_table(&self, table: &TableDescriptor) -> Result<Vec<ScanTask>> {
        self.plan_table_with(table, &ScanOptions::default())
    }

    /// Split tasks for an unpartitioned table scan, without reading records.
    pub fn plan_table_with(
        &self,
        table: &TableDescriptor,
        options: &ScanOptions,
    ) -> Result<Vec<ScanTask>> {
        if table.is_partitioned() {
            return Err(Error::InvalidTableState(format!(
                "table '{}' is partitioned by [{}]; scan its partitions instead",
                table.name,
                table.partition_column_names().join(", ")
            )));
        }
        let width = self.attributes.len();
        let unit = UnitSpec {
            identity: table.name.clone(),
            location: &table.location,
            input_format: &table.input_format,
            deserializer: &table.deserializer,
            properties: &table.properties,
            columns: self.attributes.iter().cloned().zip(0..width).collect(),
            template: Row::with_width(width),
        };
        self.plan_unit(unit, options)
    }

    /// Split tasks for a partitioned scan, without reading records.
    pub fn plan_partitions(
        &self,
        partitions: &[PartitionDescriptor],
        output_schema: &[Attribute],
        options: &ScanOptions,
    ) -> Result<Vec<ScanTask>> {
        let mut tasks = Vec::new();
        for p in partitions {
            tasks.extend(self.plan_partition(p, output_schema, options)?);
        }
        Ok(tasks)
    }

    fn plan_partition(
        &self,
        partition: &PartitionDescriptor,
        output_schema: &[Attribute],
        options: &ScanOptions,
    ) -> Result<Vec<ScanTask>> {
        let identity = partition.identity();
        if self.config.scan().verify_partition_path && !self.fs.exists(&partition.location) {
            warn!(
                partition = %identity,
                location = %partition.location,
                "partition path does not exist; skipping"
            );
            return Ok(Vec::new());
        }
        let (columns, template) = self
            .partition_layout(partition, output_schema)
            .map_err(|e| e.in_unit(identity.clone()))?;
        let unit = UnitSpec {
            identity,
            location: &partition.location,
            input_format: &partition.input_format,
            deserializer: &partition.deserializer,
            properties: &partition.properties,
            columns,
            template,
        };
        self.plan_unit(unit, options)
    }

    /// Split the output schema into physical columns and key slots, and
    /// write the partition's key values into a fresh row template.
    fn partition_layout(
        &self,
        partition: &PartitionDescriptor,
        output_schema: &[Attribute],
    ) -> Result<(Vec<(Attribute, usize)>, Row)> {
        Schema::try_new(output_schema.to_vec())?;
        let table = &partition.table;
        let declared = table.partition_column_names();
        let is_key = |a: &Attribute| declared.iter().any(|c| c.eq_ignore_ascii_case(&a.name));

        let (keys, columns): (Vec<_>, Vec<_>) = output_schema
            .iter()
            .cloned()
            .zip(0..output_schema.len())
            .partition(|(a, _)| is_key(a));

        let mut template = Row::with_width(output_schema.len());
        if !keys.is_empty() {
            let values = partition.key_values()?;
            inject_partition_keys(&values, &keys, &declared, self.caster.as_ref(), &mut template)?;
        }
        Ok((columns, template))
    }

    fn plan_unit(&self, unit: UnitSpec<'_>, options: &ScanOptions) -> Result<Vec<ScanTask>> {
        let identity = unit.identity.clone();
        self.plan_unit_inner(unit, options)
            .map_err(|e| e.in_unit(identity))
    }

    fn plan_unit_inner(&self, unit: UnitSpec<'_>, options: &ScanOptions) -> Result<Vec<ScanTask>> {
        let format = self.formats.get(unit.input_format)?;
        let factory = self.deserializers.factory(unit.deserializer)?;
        let plan = plan_splits(
            self.fs.as_ref(),
            format.as_ref(),
            &self.config,
            unit.location,
            unit.properties,
            options.path_filter.as_deref(),
            self.min_splits,
        )?;
        debug!(
            unit = %unit.identity,
            paths = %plan.paths,
            splits = plan.splits.len(),
            "unit planned"
        );

        let ctx = Arc::new(UnitContext {
            unit: Arc::from(unit.identity.as_str()),
            fs: self.fs.clone(),
            format,
            settings: plan.settings,
            properties: unit.properties.clone(),
            deserializer_id: unit.deserializer.to_string(),
            deserializer: factory,
            columns: unit.columns,
            template: unit.template,
        });
        Ok(plan
            .splits
            .into_iter()
            .map(|split| ScanTask::new(ctx.clone(), split))
            .collect())
    }

    fn stream(&self, tasks: Vec<ScanTask>) -> RowStream {
        RowStream::from_tasks(tasks, self.config.scan().max_parallel_tasks)
    }
}

impl std::fmt::Debug for TableReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableReader")
            .field("attributes", &self.attributes)
            .field("fingerprint", &self.config.fingerprint().short())
            .field("min_splits", &self.min_splits)
            .field("formats", &self.formats)
            .field("deserializers", &self.deserializers)
            .finish()
    }
}
