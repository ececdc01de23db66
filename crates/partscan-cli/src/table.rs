//! YAML table definitions.
//!
//! ```yaml
//! name: sales
//! location: /warehouse/sales
//! input_format: text
//! serde: delimited
//! properties: { field.delim: "," }
//! columns:
//!   - { name: item, type: string }
//!   - { name: amount, type: int }
//! partition_columns:
//!   - { name: year, type: int }
//! partitions:
//!   - location: /warehouse/sales/year=2020
//!   - location: /warehouse/sales/legacy
//!     spec: { year: 2019 }
//!     serde: csv
//! settings: { map.tasks.hint: "4" }
//! ```
//!
//! `columns` / `columns.types` serialization properties are derived from
//! `columns` unless given explicitly. A partition without `spec` takes its
//! key values from `key=value` segments of its location, if any.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use partscan_core::config::JobSettings;
use partscan_core::descriptor::{
    PartitionDescriptor, PartitionSpec, SerdeProperties, TableDescriptor,
};
use partscan_core::schema::{Attribute, DataType};

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartitionDef {
    pub location: String,
    #[serde(default)]
    pub spec: Option<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    pub input_format: Option<String>,
    #[serde(default)]
    pub serde: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub location: String,
    #[serde(default = "default_input_format")]
    pub input_format: String,
    #[serde(default = "default_serde")]
    pub serde: String,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_yaml::Value>,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub partition_columns: Vec<ColumnDef>,
    #[serde(default)]
    pub partitions: Vec<PartitionDef>,
    #[serde(default)]
    pub settings: BTreeMap<String, serde_yaml::Value>,
}

fn default_input_format() -> String {
    "text".to_string()
}

fn default_serde() -> String {
    "delimited".to_string()
}

/// Descriptors and schemas built from a `TableDef`.
#[derive(Debug)]
pub struct ResolvedTable {
    pub table: Arc<TableDescriptor>,
    pub partitions: Vec<PartitionDescriptor>,
    /// Physical columns followed by partition columns.
    pub output_schema: Vec<Attribute>,
    pub settings: JobSettings,
}

pub fn parse_table(yaml: &str) -> Result<TableDef> {
    serde_yaml::from_str(yaml).context("parsing table definition")
}

fn scalar(key: &str, v: &serde_yaml::Value) -> Result<String> {
    Ok(match v {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => bail!("'{key}' must be a scalar value"),
    })
}

fn string_map(map: &BTreeMap<String, serde_yaml::Value>) -> Result<BTreeMap<String, String>> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), scalar(k, v)?)))
        .collect()
}

fn attributes(defs: &[ColumnDef]) -> Result<Vec<Attribute>> {
    defs.iter()
        .map(|c| {
            let dt: DataType = c
                .data_type
                .parse()
                .with_context(|| format!("column '{}'", c.name))?;
            Ok(Attribute::new(c.name.clone(), dt))
        })
        .collect()
}

impl TableDef {
    pub fn resolve(&self) -> Result<ResolvedTable> {
        let columns = attributes(&self.columns)?;
        let partition_columns = attributes(&self.partition_columns)?;

        let mut properties: SerdeProperties = string_map(&self.properties)?;
        properties.entry("columns".to_string()).or_insert_with(|| {
            self.columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(",")
        });
        properties.entry("columns.types".to_string()).or_insert_with(|| {
            self.columns
                .iter()
                .map(|c| c.data_type.as_str())
                .collect::<Vec<_>>()
                .join(":")
        });

        let mut table = TableDescriptor::new(
            self.name.clone(),
            self.location.clone(),
            self.input_format.clone(),
            self.serde.clone(),
        )
        .with_partition_columns(partition_columns.clone());
        table.properties = properties;
        let table = Arc::new(table);

        let mut partitions = Vec::with_capacity(self.partitions.len());
        for def in &self.partitions {
            partitions.push(self.partition(&table, def)?);
        }

        let mut settings = JobSettings::new();
        for (k, v) in string_map(&self.settings)? {
            settings.set(k, v);
        }

        let mut output_schema = columns;
        output_schema.extend(partition_columns);
        Ok(ResolvedTable {
            table,
            partitions,
            output_schema,
            settings,
        })
    }

    fn partition(
        &self,
        table: &Arc<TableDescriptor>,
        def: &PartitionDef,
    ) -> Result<PartitionDescriptor> {
        let mut p = PartitionDescriptor::new(table.clone(), def.location.clone());
        if let Some(fmt) = &def.input_format {
            p = p.with_input_format(fmt.clone());
        }
        if let Some(serde) = &def.serde {
            p = p.with_deserializer(serde.clone());
        }
        for (k, v) in string_map(&def.properties)? {
            p = p.with_property(k, v);
        }

        let spec = match &def.spec {
            Some(map) => {
                let values = string_map(map)?;
                // declared order first, then anything else
                let mut entries: Vec<(String, String)> = Vec::with_capacity(values.len());
                for c in &self.partition_columns {
                    let found = values.iter().find(|(k, _)| k.eq_ignore_ascii_case(&c.name));
                    if let Some((k, v)) = found {
                        entries.push((k.clone(), v.clone()));
                    }
                }
                for (k, v) in &values {
                    if !entries.iter().any(|(e, _)| e == k) {
                        entries.push((k.clone(), v.clone()));
                    }
                }
                Some(PartitionSpec::new(entries))
            }
            None => {
                let parsed = PartitionSpec::parse_path(&def.location)
                    .with_context(|| format!("partition '{}'", def.location))?;
                (!parsed.is_empty()).then_some(parsed)
            }
        };
        if let Some(spec) = spec {
            p = p.with_spec(spec);
        }
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALES: &str = r#"
name: sales
location: /warehouse/sales
properties: { field.delim: "," }
columns:
  - { name: item, type: string }
  - { name: amount, type: int }
partition_columns:
  - { name: year, type: int }
  - { name: region, type: string }
partitions:
  - location: /warehouse/sales/year=2020/region=us
  - location: /warehouse/sales/legacy
    spec: { region: eu, year: 2019 }
    serde: csv
settings: { map.tasks.hint: 4 }
"#;

    #[test]
    fn resolves_descriptors() {
        let resolved = parse_table(SALES).unwrap().resolve().unwrap();
        let t = &resolved.table;
        assert_eq!(t.input_format, "text");
        assert_eq!(t.deserializer, "delimited");
        assert_eq!(t.properties.get("columns").unwrap(), "item,amount");
        assert_eq!(t.properties.get("columns.types").unwrap(), "string:int");
        assert_eq!(resolved.settings.get("map.tasks.hint"), Some("4"));

        let names: Vec<_> = resolved.output_schema.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["item", "amount", "year", "region"]);

        let p0 = &resolved.partitions[0];
        assert_eq!(p0.key_values().unwrap(), vec!["2020", "us"]);
        let p1 = &resolved.partitions[1];
        assert_eq!(p1.deserializer, "csv");
        assert_eq!(p1.key_values().unwrap(), vec!["2019", "eu"]);
        assert_eq!(p1.identity(), "sales[year=2019/region=eu]");
    }

    #[test]
    fn rejects_unknown_types() {
        let yaml = "name: t\nlocation: /t\ncolumns: [{ name: a, type: decimal }]\n";
        assert!(parse_table(yaml).unwrap().resolve().is_err());
    }
}
