//! Catalog-supplied table and partition metadata.
//!
//! Descriptors are immutable and read-only to the scan engine. A partition
//! keeps a shared handle to its table so the declared partition column order
//! is always available next to the partition's own key values.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::Attribute;

/// Serialization properties (`columns`, `field.delim`, ...).
pub type SerdeProperties = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    /// Base storage path; may already be a comma-separated path list.
    pub location: String,
    pub input_format: String,
    pub deserializer: String,
    #[serde(default)]
    pub properties: SerdeProperties,
    /// Declared partition columns, in path order. Empty for unpartitioned tables.
    #[serde(default)]
    pub partition_columns: Vec<Attribute>,
}

impl TableDescriptor {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        input_format: impl Into<String>,
        deserializer: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            input_format: input_format.into(),
            deserializer: deserializer.into(),
            properties: SerdeProperties::new(),
            partition_columns: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_partition_columns(mut self, cols: Vec<Attribute>) -> Self {
        self.partition_columns = cols;
        self
    }

    pub fn is_partitioned(&self) -> bool {
        !self.partition_columns.is_empty()
    }

    pub fn partition_column_names(&self) -> Vec<&str> {
        self.partition_columns.iter().map(|a| a.name.as_str()).collect()
    }
}

/// Ordered partition key spec: column name -> raw string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSpec {
    entries: Vec<(String, String)>,
}

impl PartitionSpec {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Parse a path-encoded spec such as `year=2020/region=us`.
    ///
    /// Values are unescaped (`%2F` -> `/`). Segments without `=` are skipped.
    pub fn parse_path(path: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for seg in path.split('/').filter(|s| !s.is_empty()) {
            let Some((k, v)) = seg.split_once('=') else {
                continue;
            };
            if k.is_empty() {
                return Err(Error::Schema(format!("empty partition column in '{path}'")));
            }
            entries.push((unescape_path_name(k)?, unescape_path_name(v)?));
        }
        Ok(Self { entries })
    }

    /// Value for `column`; column names match case-insensitively.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for PartitionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

fn unescape_path_name(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
            if let Ok(b) = u8::from_str_radix(hex, 16) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).map_err(|e| Error::Schema(format!("partition path '{s}': {e}")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionDescriptor {
    pub table: Arc<TableDescriptor>,
    pub location: String,
    pub input_format: String,
    pub deserializer: String,
    #[serde(default)]
    pub properties: SerdeProperties,
    /// `None` when the partition carries no key spec at all.
    #[serde(default)]
    pub spec: Option<PartitionSpec>,
}

impl PartitionDescriptor {
    /// A partition inheriting the table's input format, deserializer, and
    /// serialization properties.
    pub fn new(table: Arc<TableDescriptor>, location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            input_format: table.input_format.clone(),
            deserializer: table.deserializer.clone(),
            properties: table.properties.clone(),
            spec: None,
            table,
        }
    }

    pub fn with_spec(mut self, spec: PartitionSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    pub fn with_deserializer(mut self, deserializer: impl Into<String>) -> Self {
        self.deserializer = deserializer.into();
        self
    }

    pub fn with_input_format(mut self, input_format: impl Into<String>) -> Self {
        self.input_format = input_format.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Human-readable identity used in logs and error context.
    pub fn identity(&self) -> String {
        match &self.spec {
            Some(spec) if !spec.is_empty() => format!("{}[{}]", self.table.name, spec),
            _ => format!("{}[{}]", self.table.name, self.location),
        }
    }

    /// Raw key values in declared partition-column order.
    ///
    /// An absent spec yields empty strings for every declared column. A
    /// present spec that lacks a declared column is a schema error.
    pub fn key_values(&self) -> Result<Vec<String>> {
        let declared = &self.table.partition_columns;
        match &self.spec {
            None => Ok(vec![String::new(); declared.len()]),
            Some(spec) => declared
                .iter()
                .map(|col| {
                    spec.get(&col.name).map(str::to_string).ok_or_else(|| {
                        Error::Schema(format!(
                            "partition {} has no value for partition column '{}'",
                            self.identity(),
                            col.name
                        ))
                    })
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    fn sales() -> Arc<TableDescriptor> {
        Arc::new(
            TableDescriptor::new("sales", "/warehouse/sales", "text", "delimited")
                .with_partition_columns(vec![
                    Attribute::new("year", DataType::Int32),
                    Attribute::new("region", DataType::Utf8),
                ]),
        )
    }

    #[test]
    fn parse_path_spec() {
        let spec = PartitionSpec::parse_path("year=2020/region=us%2Feast").unwrap();
        assert_eq!(spec.get("year"), Some("2020"));
        assert_eq!(spec.get("region"), Some("us/east"));
        assert_eq!(spec.to_string(), "year=2020/region=us/east");
    }

    #[test]
    fn key_values_follow_declared_order() {
        let spec = PartitionSpec::new(vec![
            ("region".into(), "us".into()),
            ("year".into(), "2020".into()),
        ]);
        let p = PartitionDescriptor::new(sales(), "/warehouse/sales/p1").with_spec(spec);
        assert_eq!(p.key_values().unwrap(), vec!["2020", "us"]);
        assert_eq!(p.identity(), "sales[region=us/year=2020]");
    }

    #[test]
    fn key_values_match_column_names_ignoring_case() {
        let t = Arc::new(
            TableDescriptor::new("t", "/t", "text", "delimited")
                .with_partition_columns(vec![Attribute::new("Year", DataType::Int32)]),
        );
        let spec = PartitionSpec::parse_path("year=2020").unwrap();
        assert_eq!(spec.get("YEAR"), Some("2020"));
        let p = PartitionDescriptor::new(t, "/t/year=2020").with_spec(spec);
        assert_eq!(p.key_values().unwrap(), vec!["2020"]);
    }

    #[test]
    fn absent_spec_falls_back_to_empty_strings() {
        let p = PartitionDescriptor::new(sales(), "/warehouse/sales/p1");
        assert_eq!(p.key_values().unwrap(), vec!["", ""]);
    }

    #[test]
    fn incomplete_spec_is_an_error() {
        let spec = PartitionSpec::new(vec![("year".into(), "2020".into())]);
        let p = PartitionDescriptor::new(sales(), "/warehouse/sales/p1").with_spec(spec);
        assert!(matches!(p.key_values(), Err(Error::Schema(_))));
    }
}
