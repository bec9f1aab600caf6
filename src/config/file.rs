//! File-based configuration source.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::adapter::Adapter;
use super::keys::{is_uppercase_name, normalize};
use super::{ConfigError, Result};

/// On-disk formats understood by [`FileAdapter`], selected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.json`
    Json,
    /// `.yml` / `.yaml`
    Yaml,
    /// `.toml` settings file. Only top-level names written in uppercase are
    /// collected; lowercase bindings are ignored.
    Settings,
}

impl FileFormat {
    /// Picks the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(FileFormat::Json),
            "yml" | "yaml" => Ok(FileFormat::Yaml),
            "toml" => Ok(FileFormat::Settings),
            _ => Err(ConfigError::UnsupportedExtension {
                path: path.to_path_buf(),
                extension: if extension.is_empty() {
                    String::new()
                } else {
                    format!(".{extension}")
                },
            }),
        }
    }
}

/// A configuration source that loads from a JSON, YAML or settings file.
///
/// Files can be marked as strict. A strict adapter refuses to be built for a
/// path that doesn't exist; a non-strict one loads nothing when the file is
/// missing.
///
/// Top-level keys are normalized in file order, so when two keys normalize to
/// the same name (`abc` and `ABC`) the one written last wins.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    path: PathBuf,
    strict: bool,
    data: Map<String, Value>,
}

impl FileAdapter {
    /// Creates a new file adapter.
    ///
    /// Fails with [`ConfigError::FileNotFound`] if `strict` is set and the path
    /// does not exist.
    pub fn new(path: impl AsRef<Path>, strict: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if strict && !path.exists() {
            return Err(ConfigError::FileNotFound(path));
        }
        Ok(Self {
            path,
            strict,
            data: Map::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

impl Adapter for FileAdapter {
    fn name(&self) -> String {
        format!("file({})", self.path.display())
    }

    fn load(&mut self, _known_keys: &[String]) -> Result<()> {
        self.data = match load_config_file(&self.path, self.strict)? {
            Some(table) => table,
            None => Map::new(),
        };
        Ok(())
    }

    fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

/// Loads and parses a config file into a map with normalized keys.
///
/// Returns `Ok(None)` if the file doesn't exist and `strict` is false.
fn load_config_file(path: &Path, strict: bool) -> Result<Option<Map<String, Value>>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if strict {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "optional config file not found, skipping");
            return Ok(None);
        }
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let table = match FileFormat::from_path(path)? {
        FileFormat::Json => {
            let value: Value =
                serde_json::from_str(&contents).map_err(|e| ConfigError::ParseJson {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            root_mapping(path, value)?
        }
        FileFormat::Yaml => {
            let value: Value =
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseYaml {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            root_mapping(path, value)?
        }
        FileFormat::Settings => {
            let table: toml::Table =
                toml::from_str(&contents).map_err(|e| ConfigError::ParseToml {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            table
                .into_iter()
                .filter(|(name, _)| is_uppercase_name(name))
                .map(|(name, value)| (name, from_toml(value)))
                .collect()
        }
    };

    Ok(Some(
        table
            .into_iter()
            .map(|(key, value)| (normalize(&key), value))
            .collect(),
    ))
}

fn root_mapping(path: &Path, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        // a YAML document holding only `~`
        Value::Null => Ok(Map::new()),
        _ => Err(ConfigError::RootNotMapping {
            path: path.to_path_buf(),
        }),
    }
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, from_toml(value)))
                .collect(),
        ),
    }
}
