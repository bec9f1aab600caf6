use std::path::PathBuf;
use thiserror::Error;

use super::adapter::AdapterKind;

/// Convenience alias used throughout the crate.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("expected a {expected} adapter, got a {found} adapter")]
    WrongAdapterKind {
        expected: AdapterKind,
        found: AdapterKind,
    },

    #[error("an adapter set can hold only one {0} adapter")]
    DuplicateAdapter(AdapterKind),

    #[error("{kind} adapter cannot be placed at index {index}")]
    MisplacedAdapter { kind: AdapterKind, index: usize },

    #[error("index {index} is out of bounds for an adapter set of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("malformed key '{0}'")]
    MalformedKey(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("cannot address '{key}': '{segment}' is not a mapping")]
    NotAMapping { key: String, segment: String },

    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unhandled file extension `{extension}` for '{path}'")]
    UnsupportedExtension { path: PathBuf, extension: String },

    #[error("failed to parse JSON file '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to parse YAML file '{path}': {source}")]
    ParseYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to parse settings file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file '{path}' must contain a mapping at its root")]
    RootNotMapping { path: PathBuf },

    #[error("invalid module source: {0}")]
    InvalidModule(String),

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] serde_json::Error),
}
