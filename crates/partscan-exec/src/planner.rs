//! Split planning for one storage location (a table or one partition).
//!
//! The physical split layer consumes a comma-delimited path list; filtered
//! listings are joined into that form before splits are computed.

use std::sync::Arc;

use tracing::debug;

use partscan_core::config::{JobSettings, SharedConfig, IO_BUFFER_SIZE};
use partscan_core::descriptor::SerdeProperties;
use partscan_core::error::Result;
use partscan_io::input::PATH_LIST_SEPARATOR;
use partscan_io::{FileSystem, InputFormat, InputSplit, PathFilter};

/// Resolve the delimited path list to hand to the split layer.
///
/// Without a filter `base` is returned unmodified (it may already be a path
/// list). With a filter the immediate entries of `base` are listed and only
/// the accepted ones are kept. Listing failures propagate as I/O errors.
pub fn resolve_input_paths(
    fs: &dyn FileSystem,
    base: &str,
    filter: Option<&dyn PathFilter>,
) -> Result<String> {
    let Some(filter) = filter else {
        return Ok(base.to_string());
    };
    let mut joined = String::new();
    for entry in fs.list_dir(base)? {
        if !filter.accept(&entry.path) {
            continue;
        }
        if !joined.is_empty() {
            joined.push(PATH_LIST_SEPARATOR);
        }
        joined.push_str(&entry.path);
    }
    Ok(joined)
}

/// Job settings seen by the workers of one unit: the broadcast settings with
/// the unit's serialization properties overlaid, and the I/O buffer size
/// pinned to the broadcast value.
pub fn unit_settings(config: &SharedConfig, properties: &SerdeProperties) -> JobSettings {
    let mut settings = config.settings().merged_with(properties);
    settings.set(IO_BUFFER_SIZE, config.scan().io_buffer_size.to_string());
    settings
}

/// The physical split source for one unit.
#[derive(Debug, Clone)]
pub struct SplitPlan {
    pub paths: String,
    pub settings: Arc<JobSettings>,
    pub splits: Vec<InputSplit>,
}

pub fn plan_splits(
    fs: &dyn FileSystem,
    format: &dyn InputFormat,
    config: &SharedConfig,
    location: &str,
    properties: &SerdeProperties,
    filter: Option<&dyn PathFilter>,
    min_splits: usize,
) -> Result<SplitPlan> {
    let paths = resolve_input_paths(fs, location, filter)?;
    let settings = unit_settings(config, properties);
    let splits = format.get_splits(fs, &paths, &settings, min_splits)?;
    debug!(
        location,
        format = format.name(),
        min_splits,
        splits = splits.len(),
        "planned splits"
    );
    Ok(SplitPlan {
        paths,
        settings: Arc::new(settings),
        splits,
    })
}
