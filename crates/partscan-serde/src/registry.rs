//! Deserializer lookup by descriptor identifier.

use std::collections::BTreeMap;
use std::sync::Arc;

use partscan_core::error::{Error, Result};

use crate::csv::CsvDeserializer;
use crate::delimited::DelimitedTextDeserializer;
use crate::deserializer::Deserializer;
use crate::json::JsonDeserializer;

pub type DeserializerFactory = Arc<dyn Fn() -> Box<dyn Deserializer> + Send + Sync>;

/// Maps identifiers to factories. Every `create` returns a fresh instance.
#[derive(Clone)]
pub struct DeserializerRegistry {
    factories: BTreeMap<String, DeserializerFactory>,
}

impl Default for DeserializerRegistry {
    fn default() -> Self {
        let mut r = Self::empty();
        r.register_all(
            &[
                "delimited",
                "lazy-simple",
                "org.apache.hadoop.hive.serde2.lazy.LazySimpleSerDe",
            ],
            || Box::new(DelimitedTextDeserializer::new()),
        );
        r.register_all(&["csv", "org.apache.hadoop.hive.serde2.OpenCSVSerde"], || {
            Box::new(CsvDeserializer::new())
        });
        r.register_all(
            &["json", "org.apache.hive.hcatalog.data.JsonSerDe"],
            || Box::new(JsonDeserializer::new()),
        );
        r
    }
}

impl DeserializerRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Deserializer> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory));
    }

    fn register_all<F>(&mut self, ids: &[&str], factory: F)
    where
        F: Fn() -> Box<dyn Deserializer> + Send + Sync + 'static,
    {
        let factory: DeserializerFactory = Arc::new(factory);
        for id in ids {
            self.factories.insert(id.to_string(), factory.clone());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// The factory registered for `id`, for handing to worker-side tasks.
    pub fn factory(&self, id: &str) -> Result<DeserializerFactory> {
        self.factories
            .get(id)
            .cloned()
            .ok_or_else(|| Error::Config(format!("no deserializer registered for '{id}'")))
    }

    pub fn create(&self, id: &str) -> Result<Box<dyn Deserializer>> {
        Ok((self.factory(id)?)())
    }
}

impl std::fmt::Debug for DeserializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
