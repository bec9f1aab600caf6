use std::fmt;

use serde_json::{Map, Value};

use super::keys::normalize;
use super::Result;

/// Positional role of an adapter inside an [`AdapterSet`](super::AdapterSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Baseline values; at most one per set, always first.
    Defaults,
    /// Final values; at most one per set, always last.
    Overrides,
    /// Any other source (environment, files, modules, custom adapters).
    Ordinary,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterKind::Defaults => write!(f, "defaults"),
            AdapterKind::Overrides => write!(f, "overrides"),
            AdapterKind::Ordinary => write!(f, "ordinary"),
        }
    }
}

/// A source of configuration values.
///
/// `load` fills the adapter's private mapping; [`Config`](super::Config) then
/// copies [`data`](Adapter::data) into its own storage. Keys in `data` are
/// always normalized.
///
/// `known_keys` holds the keys the aggregating config already knows about when
/// this adapter runs. Sources that can probe for arbitrary keys (the
/// environment) use it; everything else ignores it.
pub trait Adapter: Send + Sync + fmt::Debug {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Ordinary
    }

    /// Human-readable name, used in logs.
    fn name(&self) -> String;

    fn load(&mut self, known_keys: &[String]) -> Result<()>;

    fn data(&self) -> &Map<String, Value>;
}

/// Builds a map with every top-level key normalized.
pub(crate) fn normalized_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Map<String, Value>
where
    K: AsRef<str>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(key, value)| (normalize(key.as_ref()), value.into()))
        .collect()
}
