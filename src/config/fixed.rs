//! In-memory adapters whose data is fixed at construction.

use serde_json::{Map, Value};

use super::adapter::{normalized_map, Adapter, AdapterKind};
use super::Result;

/// Baseline values, loaded before every other adapter.
///
/// ```
/// use serde_json::json;
/// use strata::{Adapter, Defaults};
///
/// let defaults = Defaults::new([("log level", json!("info"))]);
/// assert_eq!(defaults.data()["LOG_LEVEL"], json!("info"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Defaults {
    data: Map<String, Value>,
}

impl Defaults {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        Self {
            data: normalized_map(entries),
        }
    }
}

impl From<Map<String, Value>> for Defaults {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}

impl Adapter for Defaults {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Defaults
    }

    fn name(&self) -> String {
        "defaults".to_string()
    }

    fn load(&mut self, _known_keys: &[String]) -> Result<()> {
        Ok(())
    }

    fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

/// Final values, loaded after every other adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    data: Map<String, Value>,
}

impl Overrides {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        Self {
            data: normalized_map(entries),
        }
    }
}

impl From<Map<String, Value>> for Overrides {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}

impl Adapter for Overrides {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Overrides
    }

    fn name(&self) -> String {
        "overrides".to_string()
    }

    fn load(&mut self, _known_keys: &[String]) -> Result<()> {
        Ok(())
    }

    fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}
