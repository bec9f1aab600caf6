use std::collections::BTreeMap;
use std::ops::Index;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::adapter::{Adapter, AdapterKind};
use super::builder::ConfigBuilder;
use super::fixed::Defaults;
use super::keys::{self, normalize};
use super::set::AdapterSet;
use super::Result;

/// Merged configuration assembled from an ordered set of adapters.
///
/// Adapters are loaded in order and their data is folded into this mapping;
/// when two adapters provide the same key the later one wins. A
/// [`Defaults`] adapter always loads first and an
/// [`Overrides`](super::Overrides) adapter always loads last.
///
/// ## Example
///
/// ```
/// use serde_json::json;
/// use strata::{Config, Defaults, Overrides};
///
/// let mut config = Config::with_defaults(Defaults::new([
///     ("port", json!(8080)),
///     ("host", json!("localhost")),
/// ]));
/// config.register(Overrides::new([("port", 9090)]))?;
/// config.load()?;
///
/// assert_eq!(config.get("port")?, &json!(9090));
/// assert_eq!(config["HOST"], json!("localhost"));
/// # Ok::<(), strata::ConfigError>(())
/// ```
#[derive(Debug, Default)]
pub struct Config {
    values: Map<String, Value>,
    adapters: AdapterSet,
    subconfigs: BTreeMap<String, Config>,
}

impl Config {
    /// Creates an empty configuration with no adapters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fluent builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Creates a configuration whose only adapter holds `defaults`.
    ///
    /// Accepts either a raw map or a prepared [`Defaults`] adapter.
    pub fn with_defaults(defaults: impl Into<Defaults>) -> Self {
        Self {
            adapters: AdapterSet::from_defaults(defaults.into()),
            ..Self::default()
        }
    }

    /// Registers an adapter at the position its kind calls for.
    ///
    /// A defaults adapter replaces the current one (or becomes the first
    /// adapter); an overrides adapter replaces the current one (or becomes the
    /// last adapter). Any other adapter is placed after every adapter
    /// registered so far, but before the overrides adapter.
    pub fn register<A: Adapter + 'static>(&mut self, adapter: A) -> Result<()> {
        self.register_boxed(Box::new(adapter))
    }

    pub fn register_boxed(&mut self, adapter: Box<dyn Adapter>) -> Result<()> {
        match adapter.kind() {
            AdapterKind::Defaults => {
                if self.adapters.defaults().is_some() {
                    debug!("replacing registered defaults adapter");
                }
                self.adapters.set_defaults_boxed(adapter)
            }
            AdapterKind::Overrides => {
                if self.adapters.overrides().is_some() {
                    debug!("replacing registered overrides adapter");
                }
                self.adapters.set_overrides_boxed(adapter)
            }
            AdapterKind::Ordinary => match self.adapters.overrides_index() {
                Some(index) => self.adapters.insert_boxed(index, adapter),
                None => self.adapters.push_boxed(adapter),
            },
        }
    }

    /// Registers several adapters in turn, stopping at the first failure.
    pub fn register_all(
        &mut self,
        adapters: impl IntoIterator<Item = Box<dyn Adapter>>,
    ) -> Result<()> {
        adapters
            .into_iter()
            .try_for_each(|adapter| self.register_boxed(adapter))
    }

    pub fn adapters(&self) -> &AdapterSet {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut AdapterSet {
        &mut self.adapters
    }

    /// Swaps in a whole adapter set, returning the previous one.
    pub fn set_adapters(&mut self, adapters: AdapterSet) -> AdapterSet {
        std::mem::replace(&mut self.adapters, adapters)
    }

    pub fn defaults(&self) -> Option<&dyn Adapter> {
        self.adapters.defaults()
    }

    pub fn overrides(&self) -> Option<&dyn Adapter> {
        self.adapters.overrides()
    }

    /// Loads every adapter in order, then every sub-configuration.
    ///
    /// Each adapter sees the keys gathered so far. The first adapter that
    /// fails aborts the load; values merged before the failure are kept.
    pub fn load(&mut self) -> Result<()> {
        for adapter in self.adapters.iter_mut() {
            let known_keys: Vec<String> = self.values.keys().cloned().collect();
            adapter.load(&known_keys)?;

            let data = adapter.data();
            debug!(adapter = %adapter.name(), keys = data.len(), "loaded adapter");
            for (key, value) in data {
                self.values.insert(key.clone(), value.clone());
            }
        }

        for (name, subconfig) in &mut self.subconfigs {
            debug!(subconfig = %name, "loading sub-configuration");
            subconfig.load()?;
        }

        Ok(())
    }

    /// Looks up a flat or dotted key. Each segment is normalized first.
    pub fn get(&self, key: &str) -> Result<&Value> {
        keys::get(&self.values, key)
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Value> {
        keys::get_mut(&mut self.values, key)
    }

    /// Assigns a value at a flat or dotted key, returning the previous value.
    ///
    /// The value is kept until a later [`load`](Self::load) overwrites it.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<Option<Value>> {
        keys::set(&mut self.values, key, value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The merged values.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Deserializes the merged values into `T`.
    ///
    /// Keys are normalized, so field names usually need
    /// `#[serde(rename_all = "SCREAMING_SNAKE_CASE")]`.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.values.clone()))?)
    }

    /// Attaches a named child configuration, loaded along with this one.
    ///
    /// Returns the child previously registered under `name`, if any.
    pub fn add_subconfig(&mut self, name: impl Into<String>, subconfig: Config) -> Option<Config> {
        self.subconfigs.insert(name.into(), subconfig)
    }

    pub fn subconfig(&self, name: &str) -> Option<&Config> {
        self.subconfigs.get(name)
    }

    pub fn subconfig_mut(&mut self, name: &str) -> Option<&mut Config> {
        self.subconfigs.get_mut(name)
    }

    pub fn subconfigs(&self) -> impl Iterator<Item = (&String, &Config)> {
        self.subconfigs.iter()
    }
}

impl Index<&str> for Config {
    type Output = Value;

    /// Flat lookup of a normalized key.
    ///
    /// # Panics
    ///
    /// Panics if the key is missing.
    fn index(&self, key: &str) -> &Value {
        &self.values[normalize(key).as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, EnvAdapter, FileAdapter, ModuleAdapter, Overrides};
    use serde::Deserialize;
    use serde_json::json;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::Builder;

    fn env() -> EnvAdapter {
        EnvAdapter::new(Vec::<String>::new())
    }

    fn names(config: &Config) -> Vec<String> {
        config.adapters().iter().map(|a| a.name()).collect()
    }

    /// Adapter that always fails to load.
    #[derive(Debug, Default)]
    struct Broken {
        data: Map<String, Value>,
    }

    impl Adapter for Broken {
        fn name(&self) -> String {
            "broken".to_string()
        }

        fn load(&mut self, _known_keys: &[String]) -> Result<()> {
            Err(ConfigError::KeyNotFound("broken".to_string()))
        }

        fn data(&self) -> &Map<String, Value> {
            &self.data
        }
    }

    #[test]
    fn test_init_with_defaults_adapter() {
        let config = Config::with_defaults(Defaults::new([("abc", "123")]));

        assert_eq!(config.adapters().len(), 1);
        assert_eq!(config.defaults().unwrap().data()["ABC"], json!("123"));
    }

    #[test]
    fn test_init_with_defaults_map() {
        let mut map = Map::new();
        map.insert("abc".to_string(), json!("123"));
        let config = Config::with_defaults(map);

        assert_eq!(config.adapters().kinds(), [AdapterKind::Defaults]);
    }

    #[test]
    fn test_set_adapters_keeps_validated_set() {
        let mut config = Config::new();
        let set = AdapterSet::from_adapters(vec![Box::new(env()), Box::new(Overrides::default())])
            .unwrap();

        let previous = config.set_adapters(set);

        assert!(previous.is_empty());
        assert_eq!(config.adapters().len(), 2);
        assert!(config.overrides().is_some());
    }

    #[test]
    fn test_register_defaults_first_with_existing_adapters() {
        let mut config = Config::new();
        config.register(env()).unwrap();
        config.register(Defaults::new([("abc", "123")])).unwrap();

        assert_eq!(names(&config), ["defaults", "env"]);
    }

    #[test]
    fn test_register_second_defaults_replaces_first() {
        let mut config = Config::new();
        config.register(Defaults::new([("abc", "123")])).unwrap();
        config.register(env()).unwrap();
        config.register(Defaults::new([("easy as", "do re mi")])).unwrap();

        assert_eq!(names(&config), ["defaults", "env"]);
        let defaults = config.defaults().unwrap().data();
        assert_eq!(defaults["EASY_AS"], json!("do re mi"));
        assert!(!defaults.contains_key("ABC"));
    }

    #[test]
    fn test_register_overrides_last_with_existing_adapters() {
        let mut config = Config::new();
        config.register(env()).unwrap();
        config.register(Overrides::new([("abc", "123")])).unwrap();

        assert_eq!(names(&config), ["env", "overrides"]);
    }

    #[test]
    fn test_register_second_overrides_replaces_first() {
        let mut config = Config::new();
        config.register(env()).unwrap();
        config.register(Overrides::new([("abc", "123")])).unwrap();
        config.register(Overrides::new([("easy as", "do re mi")])).unwrap();

        assert_eq!(config.adapters().len(), 2);
        assert_eq!(
            config.overrides().unwrap().data()["EASY_AS"],
            json!("do re mi")
        );
    }

    #[test]
    fn test_register_ordinary_adapters_keep_order_before_overrides() {
        let mut config = Config::new();
        config.register(Overrides::default()).unwrap();
        config.register(env()).unwrap();
        config
            .register(FileAdapter::new("/tmp/test", false).unwrap())
            .unwrap();
        config.register(Defaults::default()).unwrap();

        assert_eq!(
            names(&config),
            ["defaults", "env", "file(/tmp/test)", "overrides"]
        );
    }

    #[test]
    fn test_register_all_places_each_adapter() {
        let mut config = Config::new();
        config
            .register_all([
                Box::new(Overrides::default()) as Box<dyn Adapter>,
                Box::new(Defaults::default()),
                Box::new(env()),
                Box::new(FileAdapter::new("/tmp/test", false).unwrap()),
            ])
            .unwrap();

        assert_eq!(
            names(&config),
            ["defaults", "env", "file(/tmp/test)", "overrides"]
        );
    }

    #[test]
    fn test_load_applies_defaults() {
        let mut config = Config::new();
        config.register(Defaults::new([("abc", "123")])).unwrap();
        config.load().unwrap();

        assert!(config.contains_key("ABC"));
        assert_eq!(config["ABC"], json!("123"));
    }

    #[test]
    fn test_load_last_adapter_wins() {
        let mut config = Config::with_defaults(Defaults::new([("a", 1)]));
        config.register(Overrides::new([("a", 2)])).unwrap();
        config
            .register(ModuleAdapter::new([("A", 3), ("B", 4)]))
            .unwrap();
        config.load().unwrap();

        assert_eq!(config["A"], json!(2));
        assert_eq!(config["B"], json!(4));
    }

    #[test]
    #[serial]
    fn test_load_env_overrides_defaults() {
        std::env::set_var("STRATA_AGG_B", "9");

        let mut config = Config::with_defaults(Defaults::new([
            ("strata agg a", json!(1)),
            ("strata agg b", json!(2)),
        ]));
        config.register(EnvAdapter::new(["strata agg b"])).unwrap();
        let result = config.load();
        std::env::remove_var("STRATA_AGG_B");

        result.unwrap();
        assert_eq!(config["STRATA_AGG_A"], json!(1));
        assert_eq!(config["STRATA_AGG_B"], json!("9"));
    }

    #[test]
    #[serial]
    fn test_load_passes_known_keys_to_env() {
        std::env::set_var("STRATA_AGG_KNOWN", "from env");
        std::env::set_var("STRATA_AGG_OWN", "own");

        let mut config = Config::with_defaults(Defaults::new([("strata agg known", Value::Null)]));
        config.register(EnvAdapter::new(["strata agg own"])).unwrap();
        let result = config.load();
        std::env::remove_var("STRATA_AGG_KNOWN");
        std::env::remove_var("STRATA_AGG_OWN");

        result.unwrap();
        assert_eq!(config["STRATA_AGG_KNOWN"], json!("from env"));
        assert_eq!(config["STRATA_AGG_OWN"], json!("own"));
    }

    #[test]
    fn test_load_merges_files_in_order() {
        let mut json_file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(json_file, r#"{{"host": "json", "port": 1}}"#).unwrap();
        let mut yaml_file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(yaml_file, "port: 2\n").unwrap();

        let mut config = Config::new();
        config
            .register(FileAdapter::new(json_file.path(), true).unwrap())
            .unwrap();
        config
            .register(FileAdapter::new(yaml_file.path(), true).unwrap())
            .unwrap();
        config.load().unwrap();

        assert_eq!(config["HOST"], json!("json"));
        assert_eq!(config["PORT"], json!(2));
    }

    #[test]
    fn test_failing_adapter_aborts_load() {
        let mut sub = Config::with_defaults(Defaults::new([("x", 1)]));
        sub.register(Broken::default()).unwrap();

        let mut config = Config::with_defaults(Defaults::new([("a", 1)]));
        config.register(Broken::default()).unwrap();
        config.register(Overrides::new([("a", 2)])).unwrap();
        config.add_subconfig("sub", sub);

        assert!(matches!(config.load(), Err(ConfigError::KeyNotFound(_))));
        assert_eq!(config["A"], json!(1));
        assert!(config.subconfig("sub").unwrap().is_empty());
    }

    #[test]
    fn test_load_is_repeatable() {
        let mut config = Config::with_defaults(Defaults::new([("a", 1)]));
        config.register(Overrides::new([("b", 2)])).unwrap();

        config.load().unwrap();
        config.load().unwrap();

        assert_eq!(config.len(), 2);
        assert_eq!(config["B"], json!(2));
    }

    #[test]
    fn test_subconfig_is_exposed_by_name() {
        let mut main = Config::new();
        let sub = Config::with_defaults(Defaults::new([("abc", "123")]));
        let previous = main.add_subconfig("mysubconfig", sub);

        assert!(previous.is_none());
        assert!(main.subconfig("mysubconfig").is_some());
        assert!(main.subconfig("other").is_none());
        assert_eq!(main.subconfigs().count(), 1);
    }

    #[test]
    #[serial]
    fn test_load_loads_subconfigs() {
        std::env::set_var("STRATA_AGG_SUB", "test");

        let mut sub = Config::new();
        sub.register(EnvAdapter::new(["strata agg sub"])).unwrap();
        let mut main = Config::new();
        main.add_subconfig("test_subconfig", sub);
        assert!(main.subconfig("test_subconfig").unwrap().is_empty());

        let result = main.load();
        std::env::remove_var("STRATA_AGG_SUB");

        result.unwrap();
        let sub = main.subconfig("test_subconfig").unwrap();
        assert_eq!(sub["STRATA_AGG_SUB"], json!("test"));
        assert!(main.is_empty());
    }

    #[test]
    fn test_nested_get_and_set() {
        let mut config = Config::new();
        config.set("server.host", "localhost").unwrap();
        config.set("server port", 8080).unwrap();

        assert_eq!(config.get("Server.Host").unwrap(), &json!("localhost"));
        assert_eq!(config.get("SERVER_PORT").unwrap(), &json!(8080));
        assert!(matches!(
            config.get("server..host"),
            Err(ConfigError::MalformedKey(_))
        ));

        *config.get_mut("server.host").unwrap() = json!("example.com");
        assert_eq!(config.values()["SERVER"]["HOST"], json!("example.com"));
    }

    #[test]
    fn test_extract_typed() {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        struct App {
            log_level: String,
            workers: u16,
        }

        let mut config = Config::with_defaults(Defaults::new([
            ("log level", json!("info")),
            ("workers", json!(4)),
        ]));
        config.register(Overrides::new([("workers", 8)])).unwrap();
        config.load().unwrap();

        let app: App = config.extract().unwrap();
        assert_eq!(app.log_level, "info");
        assert_eq!(app.workers, 8);
    }
}
