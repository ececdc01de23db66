//! Logical schema types. Pure data; no Arrow dependency here.
//!
//! An output schema is an ordered list of `Attribute`s. Attribute order fixes
//! the slot order of every `Row` produced by one scan.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
    /// Days since 1970-01-01.
    Date32,
}

impl FromStr for DataType {
    type Err = Error;

    /// Parse a catalog type name (`int`, `bigint`, `varchar(20)`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        // Strip length/precision parameters: varchar(10) -> varchar
        let base = match lower.find('(') {
            Some(idx) => lower[..idx].trim(),
            None => lower.as_str(),
        };
        let dt = match base {
            "boolean" | "bool" => DataType::Boolean,
            "tinyint" | "smallint" | "int" | "integer" | "int32" => DataType::Int32,
            "bigint" | "long" | "int64" => DataType::Int64,
            "float" | "real" | "float32" => DataType::Float32,
            "double" | "float64" => DataType::Float64,
            "string" | "varchar" | "char" | "utf8" => DataType::Utf8,
            "binary" => DataType::Binary,
            "date" | "date32" => DataType::Date32,
            _ => return Err(Error::Schema(format!("unsupported type name '{s}'"))),
        };
        Ok(dt)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "boolean",
            DataType::Int32 => "int",
            DataType::Int64 => "bigint",
            DataType::Float32 => "float",
            DataType::Float64 => "double",
            DataType::Utf8 => "string",
            DataType::Binary => "binary",
            DataType::Date32 => "date",
        };
        f.write_str(name)
    }
}

/// One output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn non_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
}

impl Schema {
    /// Build a schema, rejecting duplicate attribute names.
    pub fn try_new(attributes: Vec<Attribute>) -> Result<Self, Error> {
        for (i, a) in attributes.iter().enumerate() {
            if attributes[..i].iter().any(|b| b.name == a.name) {
                return Err(Error::Schema(format!("duplicate attribute '{}'", a.name)));
            }
        }
        Ok(Self { attributes })
    }

    pub fn width(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute(&self, idx: usize) -> Option<&Attribute> {
        self.attributes.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }
}
