use std::path::{Path, PathBuf};

use serde_json::Value;

use super::adapter::Adapter;
use super::aggregate::Config;
use super::env::EnvAdapter;
use super::file::FileAdapter;
use super::fixed::{Defaults, Overrides};
use super::module::ModuleAdapter;
use super::Result;

/// An adapter waiting to be registered.
#[derive(Debug)]
enum PendingAdapter {
    Ready(Box<dyn Adapter>),
    File { path: PathBuf, strict: bool },
}

/// Fluent front end for assembling a [`Config`].
///
/// Adapters are registered in the order they are added, except that defaults
/// always end up first and overrides last, whatever the call order.
///
/// ## Example
///
/// ```no_run
/// use serde_json::json;
/// use strata::Config;
///
/// // defaults -> settings file -> env -> local file -> overrides
/// let config = Config::builder()
///     .with_defaults([("port", json!(8080)), ("log level", json!("info"))])
///     .with_file("config/settings.toml", true)
///     .with_env(["port", "log level"])
///     .with_file("config/local.yaml", false)
///     .with_overrides([("log level", json!("debug"))])
///     .load()?;
///
/// println!("port = {}", config["PORT"]);
/// # Ok::<(), strata::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() or .load() is called"]
pub struct ConfigBuilder {
    adapters: Vec<PendingAdapter>,
    subconfigs: Vec<(String, Config)>,
}

impl ConfigBuilder {
    /// Sets the defaults adapter. A later call replaces an earlier one.
    pub fn with_defaults<K, V>(self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.with_adapter(Defaults::new(entries))
    }

    /// Sets the overrides adapter. A later call replaces an earlier one.
    pub fn with_overrides<K, V>(self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.with_adapter(Overrides::new(entries))
    }

    /// Reads the given environment variables.
    pub fn with_env<K: AsRef<str>>(self, keys: impl IntoIterator<Item = K>) -> Self {
        self.with_adapter(EnvAdapter::new(keys))
    }

    /// Reads the given environment variables, storing remapped ones under
    /// their destination key.
    pub fn with_env_remapped<K, S, D>(
        self,
        keys: impl IntoIterator<Item = K>,
        remaps: impl IntoIterator<Item = (S, D)>,
    ) -> Self
    where
        K: AsRef<str>,
        S: AsRef<str>,
        D: AsRef<str>,
    {
        self.with_adapter(EnvAdapter::new(keys).with_remaps(remaps))
    }

    /// Adds a JSON, YAML or settings file.
    ///
    /// If `strict` is `true`, [`build`](Self::build) fails when the file
    /// doesn't exist. Missing non-strict files are skipped on load.
    pub fn with_file(mut self, path: impl AsRef<Path>, strict: bool) -> Self {
        self.adapters.push(PendingAdapter::File {
            path: path.as_ref().to_path_buf(),
            strict,
        });
        self
    }

    /// Harvests uppercase bindings from in-memory values.
    pub fn with_module(self, module: ModuleAdapter) -> Self {
        self.with_adapter(module)
    }

    /// Adds any adapter, custom ones included.
    pub fn with_adapter<A: Adapter + 'static>(mut self, adapter: A) -> Self {
        self.adapters.push(PendingAdapter::Ready(Box::new(adapter)));
        self
    }

    /// Attaches a named child configuration.
    pub fn with_subconfig(mut self, name: impl Into<String>, subconfig: Config) -> Self {
        self.subconfigs.push((name.into(), subconfig));
        self
    }

    /// Registers every adapter and returns the configuration, not yet loaded.
    pub fn build(self) -> Result<Config> {
        let mut config = Config::new();

        for pending in self.adapters {
            let adapter: Box<dyn Adapter> = match pending {
                PendingAdapter::Ready(adapter) => adapter,
                PendingAdapter::File { path, strict } => Box::new(FileAdapter::new(path, strict)?),
            };
            config.register_boxed(adapter)?;
        }

        for (name, subconfig) in self.subconfigs {
            config.add_subconfig(name, subconfig);
        }

        Ok(config)
    }

    /// Builds the configuration and loads it.
    pub fn load(self) -> Result<Config> {
        let mut config = self.build()?;
        config.load()?;
        Ok(config)
    }
}
