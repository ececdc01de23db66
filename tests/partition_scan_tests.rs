//! Partitioned scans: key injection, unions, and per-partition formats.

use std::sync::Arc;

use partscan_core::cast::DEFAULT_PARTITION_NAME;
use partscan_core::config::JobSettings;
use partscan_core::descriptor::{PartitionDescriptor, PartitionSpec, TableDescriptor};
use partscan_core::schema::{Attribute, DataType};
use partscan_core::types::{Row, Value};
use partscan_core::{Error, Result};
use partscan_exec::{ScanOptions, TableReader};
use partscan_io::{GlobFilter, MemoryFileSystem};

fn sales_table() -> Arc<TableDescriptor> {
    Arc::new(
        TableDescriptor::new("sales", "/warehouse/sales", "text", "delimited")
            .with_property("columns", "name,value")
            .with_property("columns.types", "string:int")
            .with_property("field.delim", ",")
            .with_partition_columns(vec![
                Attribute::new("year", DataType::Int32),
                Attribute::new("region", DataType::Utf8),
            ]),
    )
}

fn output_schema() -> Vec<Attribute> {
    vec![
        Attribute::new("name", DataType::Utf8),
        Attribute::new("value", DataType::Int32),
        Attribute::new("year", DataType::Int32),
        Attribute::new("region", DataType::Utf8),
    ]
}

fn spec(pairs: &[(&str, &str)]) -> PartitionSpec {
    PartitionSpec::new(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn reader(fs: &MemoryFileSystem) -> TableReader {
    TableReader::new(Vec::new(), JobSettings::new())
        .unwrap()
        .with_file_system(Arc::new(fs.clone()))
}

fn collect(reader: &TableReader, parts: &[PartitionDescriptor]) -> Result<Vec<Row>> {
    reader.scan_partitions(parts, &output_schema())?.collect()
}

fn sorted(rows: &[Row]) -> Vec<String> {
    let mut v: Vec<String> = rows.iter().map(|r| format!("{:?}", r.values())).collect();
    v.sort();
    v
}

#[test]
fn test_empty_partition_list_is_empty_not_error() {
    let fs = MemoryFileSystem::new();
    let mut stream = reader(&fs).scan_partitions(&[], &output_schema()).unwrap();
    assert!(!stream.advance().unwrap());
    assert!(collect(&reader(&fs), &[]).unwrap().is_empty());
}

#[test]
fn test_partition_keys_are_synthesized() {
    let fs = MemoryFileSystem::new();
    fs.insert("/warehouse/sales/year=2020/region=us/part-0", "a,10\n");
    let p = PartitionDescriptor::new(sales_table(), "/warehouse/sales/year=2020/region=us")
        .with_spec(spec(&[("year", "2020"), ("region", "us")]));

    let rows = collect(&reader(&fs), &[p]).unwrap();
    assert_eq!(
        rows,
        vec![Row::from_values(vec![
            Value::Str("a".into()),
            Value::I32(10),
            Value::I32(2020),
            Value::Str("us".into()),
        ])]
    );
}

#[test]
fn test_key_columns_may_interleave_with_physical_columns() {
    let fs = MemoryFileSystem::new();
    fs.insert("/p/f", "a,10\nb,20\n");
    let p = PartitionDescriptor::new(sales_table(), "/p")
        .with_spec(spec(&[("year", "2021"), ("region", "eu")]));
    let schema = vec![
        Attribute::new("region", DataType::Utf8),
        Attribute::new("value", DataType::Int32),
        Attribute::new("year", DataType::Int64),
    ];
    let rows: Vec<Row> = reader(&fs)
        .scan_partitions(&[p], &schema)
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(
        rows[1].values(),
        &[Value::Str("eu".into()), Value::I32(20), Value::I64(2021)]
    );
}

#[test]
fn test_union_has_m_plus_n_rows_in_any_order() {
    let fs = MemoryFileSystem::new();
    fs.insert("/s/year=2020/region=us/f", "a,1\nb,2\nc,3\n");
    fs.insert("/s/year=2021/region=eu/f", "d,4\ne,5\n");
    let parts = vec![
        PartitionDescriptor::new(sales_table(), "/s/year=2020/region=us")
            .with_spec(spec(&[("year", "2020"), ("region", "us")])),
        PartitionDescriptor::new(sales_table(), "/s/year=2021/region=eu")
            .with_spec(spec(&[("year", "2021"), ("region", "eu")])),
    ];
    let r = reader(&fs);
    let forward = collect(&r, &parts).unwrap();
    let mut reversed_parts = parts.clone();
    reversed_parts.reverse();
    let backward = collect(&r, &reversed_parts).unwrap();

    assert_eq!(forward.len(), 5);
    assert_eq!(sorted(&forward), sorted(&backward));
    assert!(forward.iter().all(|row| row.width() == 4));

    let parallel = r
        .scan_partitions(&parts, &output_schema())
        .unwrap()
        .collect_parallel()
        .unwrap();
    assert_eq!(sorted(&parallel), sorted(&forward));
}

#[test]
fn test_absent_spec_uses_empty_key_strings() {
    let fs = MemoryFileSystem::new();
    fs.insert("/s/unknown/f", "a,1\n");
    let p = PartitionDescriptor::new(sales_table(), "/s/unknown");
    let rows = collect(&reader(&fs), &[p]).unwrap();
    // "" casts to NULL for int and stays "" for string
    assert_eq!(rows[0].get(2), Some(&Value::Null));
    assert_eq!(rows[0].get(3), Some(&Value::Str(String::new())));
}

#[test]
fn test_default_partition_marker_is_null() {
    let fs = MemoryFileSystem::new();
    fs.insert("/s/p/f", "a,1\n");
    let p = PartitionDescriptor::new(sales_table(), "/s/p")
        .with_spec(spec(&[("year", DEFAULT_PARTITION_NAME), ("region", "us")]));
    let rows = collect(&reader(&fs), &[p]).unwrap();
    assert_eq!(rows[0].get(2), Some(&Value::Null));
}

#[test]
fn test_spec_missing_declared_column_is_schema_error() {
    let fs = MemoryFileSystem::new();
    fs.insert("/s/p/f", "a,1\n");
    let p =
        PartitionDescriptor::new(sales_table(), "/s/p").with_spec(spec(&[("year", "2020")]));
    let err = reader(&fs)
        .scan_partitions(&[p], &output_schema())
        .unwrap_err();
    assert!(matches!(err.root(), Error::Schema(_)));
}

#[test]
fn test_partitions_choose_their_own_deserializer() {
    let fs = MemoryFileSystem::new();
    fs.insert("/s/a/f", "a,1\n");
    fs.insert("/s/b/f", "\"b, quoted\",2\n");
    fs.insert("/s/c/f", "{\"NAME\":\"c\",\"value\":3}\n");
    let t = sales_table();
    let parts = vec![
        PartitionDescriptor::new(t.clone(), "/s/a")
            .with_spec(spec(&[("year", "1"), ("region", "a")])),
        PartitionDescriptor::new(t.clone(), "/s/b")
            .with_spec(spec(&[("year", "2"), ("region", "b")]))
            .with_deserializer("org.apache.hadoop.hive.serde2.OpenCSVSerde"),
        PartitionDescriptor::new(t, "/s/c")
            .with_spec(spec(&[("year", "3"), ("region", "c")]))
            .with_deserializer("json"),
    ];
    let rows = collect(&reader(&fs), &parts).unwrap();
    let names: Vec<_> = rows.iter().map(|r| r.get(0).cloned()).collect();
    assert_eq!(
        names,
        vec![
            Some(Value::Str("a".into())),
            Some(Value::Str("b, quoted".into())),
            Some(Value::Str("c".into())),
        ]
    );
    assert_eq!(rows[2].get(2), Some(&Value::I32(3)));
}

#[test]
fn test_decode_error_names_the_partition() {
    let fs = MemoryFileSystem::new();
    fs.insert("/s/bad/f", "a,1\nb,x\n");
    let p = PartitionDescriptor::new(sales_table(), "/s/bad")
        .with_spec(spec(&[("year", "2020"), ("region", "us")]));
    let err = collect(&reader(&fs), &[p]).unwrap_err();
    match err.root() {
        Error::Deserialization { unit, position, .. } => {
            assert_eq!(unit, "sales[year=2020/region=us]");
            assert_eq!(*position, 4);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_filter_applies_to_each_partition() {
    let fs = MemoryFileSystem::new();
    fs.insert("/s/p1/a.dat", "a,1\n");
    fs.insert("/s/p1/b.tmp", "junk,0\n");
    fs.insert("/s/p2/c.dat", "c,3\n");
    let t = sales_table();
    let parts = vec![
        PartitionDescriptor::new(t.clone(), "/s/p1")
            .with_spec(spec(&[("year", "1"), ("region", "x")])),
        PartitionDescriptor::new(t, "/s/p2").with_spec(spec(&[("year", "2"), ("region", "y")])),
    ];
    let options = ScanOptions::new().with_path_filter(GlobFilter::new("*.dat"));
    let rows: Vec<Row> = reader(&fs)
        .scan_partitions_with(&parts, &output_schema(), &options)
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_key_columns_match_spec_ignoring_case() {
    let fs = MemoryFileSystem::new();
    fs.insert("/t/year=2020/f", "a,1\n");
    let table = Arc::new(
        TableDescriptor::new("t", "/t", "text", "delimited")
            .with_property("columns", "name,value")
            .with_property("columns.types", "string:int")
            .with_property("field.delim", ",")
            .with_partition_columns(vec![Attribute::new("Year", DataType::Int32)]),
    );
    let p = PartitionDescriptor::new(table, "/t/year=2020")
        .with_spec(PartitionSpec::parse_path("year=2020").unwrap());
    let schema = vec![
        Attribute::new("name", DataType::Utf8),
        Attribute::new("year", DataType::Int32),
    ];
    let rows: Vec<Row> = reader(&fs)
        .scan_partitions(&[p], &schema)
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(
        rows,
        vec![Row::from_values(vec![Value::Str("a".into()), Value::I32(2020)])]
    );
}
