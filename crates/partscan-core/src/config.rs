//! Job settings, the broadcast `SharedConfig`, and the typed `ScanConfig` view.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::descriptor::SerdeProperties;
use crate::error::{Error, Result};
use crate::hash::{hash_serde, Hash256};

pub const MAP_TASKS_HINT: &str = "map.tasks.hint";
pub const SUGGESTED_MIN_PARTITIONS: &str = "engine.suggested.min.partitions";
pub const IO_BUFFER_SIZE: &str = "io.buffer.size";
pub const BLOCK_SIZE: &str = "fs.block.size";
pub const MAX_PARALLEL_TASKS: &str = "scan.max.parallel.tasks";
pub const VERIFY_PARTITION_PATH: &str = "scan.verify.partition.path";

pub const DEFAULT_IO_BUFFER_SIZE: usize = 64 * 1024;
pub const DEFAULT_BLOCK_SIZE: u64 = 32 * 1024 * 1024;

/// Handle through which an immutable value is shared with every worker.
pub type Broadcast<T> = Arc<T>;

/// Ordered string -> string settings (site and job level).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobSettings {
    entries: BTreeMap<String, String>,
}

impl JobSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Typed lookup; `Ok(None)` when unset, `Error::Config` when malformed.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| Error::Config(format!("setting '{key}' has invalid value '{raw}'"))),
        }
    }

    /// Copy of these settings with `properties` overlaid.
    pub fn merged_with(&self, properties: &SerdeProperties) -> Self {
        let mut out = self.clone();
        for (k, v) in properties {
            out.entries.insert(k.clone(), v.clone());
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for JobSettings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Immutable configuration broadcast once to every worker of a scan.
///
/// There is no mutating API: a `SharedConfig` is frozen at construction.
#[derive(Debug)]
pub struct SharedConfig {
    settings: JobSettings,
    scan: ScanConfig,
    fingerprint: Hash256,
}

impl SharedConfig {
    pub fn new(settings: JobSettings) -> Result<Self> {
        let scan = ScanConfig::from_settings(&settings)?;
        let fingerprint = hash_serde(&settings)?;
        Ok(Self {
            settings,
            scan,
            fingerprint,
        })
    }

    pub fn broadcast(settings: JobSettings) -> Result<Broadcast<Self>> {
        Self::new(settings).map(Arc::new)
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    pub fn scan(&self) -> &ScanConfig {
        &self.scan
    }

    pub fn fingerprint(&self) -> Hash256 {
        self.fingerprint
    }
}

/// Typed view of the settings the scan engine itself consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Lower bound for the number of splits; unset means 1.
    pub map_tasks_hint: Option<usize>,

    /// Minimum partition count suggested by the execution engine.
    pub suggested_min_partitions: usize,

    /// Read buffer capacity for record readers, in bytes.
    pub io_buffer_size: usize,

    /// Upper bound for a single split, in bytes.
    pub block_size: u64,

    /// Worker threads used by `RowStream::collect_parallel`.
    pub max_parallel_tasks: usize,

    /// Skip partitions whose storage path does not exist.
    pub verify_partition_path: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            map_tasks_hint: None,
            suggested_min_partitions: 1,
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
            block_size: DEFAULT_BLOCK_SIZE,
            max_parallel_tasks: 4,
            verify_partition_path: false,
        }
    }
}

impl ScanConfig {
    pub fn from_settings(settings: &JobSettings) -> Result<Self> {
        let d = Self::default();
        let cfg = Self {
            map_tasks_hint: settings.parse(MAP_TASKS_HINT)?,
            suggested_min_partitions: settings
                .parse(SUGGESTED_MIN_PARTITIONS)?
                .unwrap_or(d.suggested_min_partitions),
            io_buffer_size: settings.parse(IO_BUFFER_SIZE)?.unwrap_or(d.io_buffer_size),
            block_size: settings.parse(BLOCK_SIZE)?.unwrap_or(d.block_size),
            max_parallel_tasks: settings
                .parse(MAX_PARALLEL_TASKS)?
                .unwrap_or(d.max_parallel_tasks),
            verify_partition_path: settings
                .parse(VERIFY_PARTITION_PATH)?
                .unwrap_or(d.verify_partition_path),
        };
        if cfg.io_buffer_size == 0 {
            return Err(Error::Config(format!("{IO_BUFFER_SIZE} must be positive")));
        }
        if cfg.block_size == 0 {
            return Err(Error::Config(format!("{BLOCK_SIZE} must be positive")));
        }
        Ok(cfg)
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `PARTSCAN_MAP_TASKS_HINT`: split-count hint
    /// - `PARTSCAN_SUGGESTED_MIN_PARTITIONS`: engine-suggested minimum
    /// - `PARTSCAN_IO_BUFFER_SIZE`: reader buffer size in bytes
    /// - `PARTSCAN_BLOCK_SIZE`: maximum split size in bytes
    /// - `PARTSCAN_MAX_PARALLEL_TASKS`: worker threads
    /// - `PARTSCAN_VERIFY_PARTITION_PATH`: skip missing partition paths
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("PARTSCAN_MAP_TASKS_HINT") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.map_tasks_hint = Some(v);
            }
        }

        if let Ok(s) = std::env::var("PARTSCAN_SUGGESTED_MIN_PARTITIONS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.suggested_min_partitions = v;
            }
        }

        if let Ok(s) = std::env::var("PARTSCAN_IO_BUFFER_SIZE") {
            if let Ok(v) = s.parse::<usize>() {
                if v > 0 {
                    cfg.io_buffer_size = v;
                }
            }
        }

        if let Ok(s) = std::env::var("PARTSCAN_BLOCK_SIZE") {
            if let Ok(v) = s.parse::<u64>() {
                if v > 0 {
                    cfg.block_size = v;
                }
            }
        }

        if let Ok(s) = std::env::var("PARTSCAN_MAX_PARALLEL_TASKS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_parallel_tasks = v;
            }
        }

        if let Ok(s) = std::env::var("PARTSCAN_VERIFY_PARTITION_PATH") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.verify_partition_path = v;
            }
        }

        cfg
    }

    /// Write this config into `settings` under the recognized keys.
    pub fn apply_to(&self, settings: &mut JobSettings) {
        if let Some(hint) = self.map_tasks_hint {
            settings.set(MAP_TASKS_HINT, hint.to_string());
        }
        settings.set(
            SUGGESTED_MIN_PARTITIONS,
            self.suggested_min_partitions.to_string(),
        );
        settings.set(IO_BUFFER_SIZE, self.io_buffer_size.to_string());
        settings.set(BLOCK_SIZE, self.block_size.to_string());
        settings.set(MAX_PARALLEL_TASKS, self.max_parallel_tasks.to_string());
        settings.set(
            VERIFY_PARTITION_PATH,
            self.verify_partition_path.to_string(),
        );
    }

    /// Degree of parallelism for split planning:
    /// `max(map_tasks_hint or 1, suggested_min_partitions)`.
    pub fn min_splits(&self) -> usize {
        self.map_tasks_hint
            .unwrap_or(1)
            .max(self.suggested_min_partitions)
    }
}
