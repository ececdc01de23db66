//! Input-format lookup by descriptor identifier.

use std::collections::BTreeMap;
use std::sync::Arc;

use partscan_core::error::{Error, Result};
use partscan_io::input::TextInputFormat;
use partscan_io::InputFormat;

#[derive(Clone)]
pub struct InputFormatRegistry {
    formats: BTreeMap<String, Arc<dyn InputFormat>>,
}

impl Default for InputFormatRegistry {
    fn default() -> Self {
        let mut r = Self::empty();
        let text: Arc<dyn InputFormat> = Arc::new(TextInputFormat::new());
        r.register("text", text.clone());
        r.register("org.apache.hadoop.mapred.TextInputFormat", text);
        r
    }
}

impl InputFormatRegistry {
    pub fn empty() -> Self {
        Self {
            formats: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, id: impl Into<String>, format: Arc<dyn InputFormat>) {
        self.formats.insert(id.into(), format);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn InputFormat>> {
        self.formats
            .get(id)
            .cloned()
            .ok_or_else(|| Error::Config(format!("no input format registered for '{id}'")))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for InputFormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.formats.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_aliases() {
        let r = InputFormatRegistry::default();
        assert_eq!(r.get("text").unwrap().name(), "text");
        assert_eq!(
            r.get("org.apache.hadoop.mapred.TextInputFormat")
                .unwrap()
                .name(),
            "text"
        );
        assert!(matches!(r.get("orc").err(), Some(Error::Config(_))));
    }
}
