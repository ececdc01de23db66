//! String-literal casting for partition key values.
//!
//! Partition keys arrive as the raw strings encoded in storage paths
//! (`year=2020/region=us`). The `Caster` turns them into typed values.

use crate::error::{Error, Result};
use crate::schema::DataType;
use crate::types::Value;

/// Marker the catalog writes for a NULL partition key value.
pub const DEFAULT_PARTITION_NAME: &str = "__HIVE_DEFAULT_PARTITION__";

/// Cast/evaluate collaborator used by the partition key injector.
pub trait Caster: Send + Sync {
    fn cast_string_literal(&self, value: &str, target: DataType) -> Result<Value>;
}

/// Lenient casts: unparseable input becomes `Null` rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCaster;

impl Caster for DefaultCaster {
    fn cast_string_literal(&self, value: &str, target: DataType) -> Result<Value> {
        if value == DEFAULT_PARTITION_NAME {
            return Ok(Value::Null);
        }
        if target == DataType::Utf8 {
            return Ok(Value::Str(value.to_string()));
        }
        if target == DataType::Binary {
            return Ok(Value::Bin(value.as_bytes().to_vec()));
        }
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        Ok(parse_scalar(trimmed, target).unwrap_or(Value::Null))
    }
}

/// Strict cast used by deserializers: a token that does not parse is an error.
pub fn parse_strict(token: &str, target: DataType) -> Result<Value> {
    match target {
        DataType::Utf8 => Ok(Value::Str(token.to_string())),
        DataType::Binary => Ok(Value::Bin(token.as_bytes().to_vec())),
        _ => parse_scalar(token.trim(), target)
            .ok_or_else(|| Error::Cast(format!("cannot parse '{token}' as {target}"))),
    }
}

fn parse_scalar(s: &str, target: DataType) -> Option<Value> {
    match target {
        DataType::Boolean => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Some(Value::Bool(true)),
            "false" | "f" | "0" | "no" => Some(Value::Bool(false)),
            _ => None,
        },
        DataType::Int32 => s.parse().ok().map(Value::I32),
        DataType::Int64 => s.parse().ok().map(Value::I64),
        DataType::Float32 => s.parse().ok().map(Value::F32),
        DataType::Float64 => s.parse().ok().map(Value::F64),
        DataType::Date32 => parse_date(s).map(Value::Date),
        DataType::Utf8 => Some(Value::Str(s.to_string())),
        DataType::Binary => Some(Value::Bin(s.as_bytes().to_vec())),
    }
}

/// Parse `YYYY-MM-DD` into days since the Unix epoch.
pub fn parse_date(s: &str) -> Option<i32> {
    let mut parts = s.splitn(3, '-');
    let y: i64 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let d: u32 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&m) || d == 0 || d > days_in_month(y, m) {
        return None;
    }
    i32::try_from(days_from_civil(y, m, d)).ok()
}

fn days_in_month(y: i64, m: u32) -> u32 {
    match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if (y % 4 == 0 && y % 100 != 0) || y % 400 == 0 => 29,
        _ => 28,
    }
}

// Howard Hinnant's days_from_civil.
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let m = i64::from(m);
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + i64::from(d) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Format days since the Unix epoch as `YYYY-MM-DD`.
pub fn format_date(days: i32) -> String {
    let (y, m, d) = civil_from_days(i64::from(days));
    format!("{y:04}-{m:02}-{d:02}")
}

fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}
