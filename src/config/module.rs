use serde::Serialize;
use serde_json::{Map, Value};

use super::adapter::Adapter;
use super::keys::{is_uppercase_name, normalize};
use super::{ConfigError, Result};

/// Harvests uppercase bindings from an in-memory object.
///
/// This is the in-process counterpart of a settings file: given a set of named
/// values (or any serializable struct), only names written in uppercase are
/// collected on load.
///
/// ```
/// use serde::Serialize;
/// use strata::{Adapter, ModuleAdapter};
///
/// #[derive(Serialize)]
/// #[allow(non_snake_case)]
/// struct Settings {
///     TIMEOUT: u32,
///     scratch: bool,
/// }
///
/// let mut module = ModuleAdapter::from_serialize(&Settings { TIMEOUT: 30, scratch: true })?;
/// module.load(&[])?;
/// assert_eq!(module.data().len(), 1);
/// # Ok::<(), strata::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModuleAdapter {
    bindings: Map<String, Value>,
    data: Map<String, Value>,
}

impl ModuleAdapter {
    pub fn new<K, V>(bindings: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            bindings: bindings
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
            data: Map::new(),
        }
    }

    /// Uses the serialized fields of `source` as bindings.
    ///
    /// Fails with [`ConfigError::InvalidModule`] unless `source` serializes to
    /// a mapping.
    pub fn from_serialize<T: Serialize + ?Sized>(source: &T) -> Result<Self> {
        let value =
            serde_json::to_value(source).map_err(|e| ConfigError::InvalidModule(e.to_string()))?;
        match value {
            Value::Object(bindings) => Ok(Self {
                bindings,
                data: Map::new(),
            }),
            other => Err(ConfigError::InvalidModule(format!(
                "expected a mapping, got {}",
                kind_of(&other)
            ))),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

impl Adapter for ModuleAdapter {
    fn name(&self) -> String {
        "module".to_string()
    }

    fn load(&mut self, _known_keys: &[String]) -> Result<()> {
        self.data = self
            .bindings
            .iter()
            .filter(|(name, _)| is_uppercase_name(name))
            .map(|(name, value)| (normalize(name), value.clone()))
            .collect();
        Ok(())
    }

    fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}
