use std::collections::HashSet;

use serde_json::{Map, Value};

use super::adapter::Adapter;
use super::keys::normalize;
use super::Result;

/// Reads a fixed list of environment variables.
///
/// Keys are normalized at construction, so `"log level"` probes `LOG_LEVEL`.
/// A remap entry stores the value of one variable under another key:
/// with `with_remap("db url", "database url")` and `DB_URL=...` set, the value
/// lands under `DATABASE_URL` and `DB_URL` is absent from the data.
///
/// Values are kept as strings; unset variables are skipped.
#[derive(Debug, Clone, Default)]
pub struct EnvAdapter {
    keys: Vec<String>,
    remaps: Vec<(String, String)>,
    data: Map<String, Value>,
}

impl EnvAdapter {
    pub fn new<K: AsRef<str>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            keys: keys.into_iter().map(|k| normalize(k.as_ref())).collect(),
            remaps: Vec::new(),
            data: Map::new(),
        }
    }

    pub fn with_remap(mut self, source: impl AsRef<str>, destination: impl AsRef<str>) -> Self {
        let source = normalize(source.as_ref());
        let destination = normalize(destination.as_ref());
        self.remaps.retain(|(existing, _)| *existing != source);
        self.remaps.push((source, destination));
        self
    }

    pub fn with_remaps<S, D>(self, remaps: impl IntoIterator<Item = (S, D)>) -> Self
    where
        S: AsRef<str>,
        D: AsRef<str>,
    {
        remaps
            .into_iter()
            .fold(self, |adapter, (source, destination)| {
                adapter.with_remap(source, destination)
            })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Probes the environment and replaces the adapter's data.
    ///
    /// `extra_keys` are probed in addition to the adapter's own keys and remap
    /// sources; they are normalized first.
    pub fn load_with(&mut self, extra_keys: Option<&[String]>) {
        let extras = extra_keys.unwrap_or_default();
        let mut seen = HashSet::new();
        let mut data = Map::new();

        let probed = self
            .keys
            .iter()
            .cloned()
            .chain(self.remaps.iter().map(|(source, _)| source.clone()))
            .chain(extras.iter().map(|k| normalize(k)));

        for key in probed {
            if !seen.insert(key.clone()) {
                continue;
            }
            let Ok(value) = std::env::var(&key) else {
                continue;
            };

            let destination = self
                .remaps
                .iter()
                .find(|(source, _)| *source == key)
                .map_or(key.as_str(), |(_, destination)| destination.as_str());

            tracing::trace!(variable = %key, key = %destination, "read environment variable");
            data.insert(destination.to_string(), Value::String(value));
        }

        self.data = data;
    }
}

impl Adapter for EnvAdapter {
    fn name(&self) -> String {
        "env".to_string()
    }

    fn load(&mut self, known_keys: &[String]) -> Result<()> {
        self.load_with(Some(known_keys));
        Ok(())
    }

    fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard(Vec<&'static str>);

    impl EnvGuard {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self(vars.iter().map(|(key, _)| *key).collect())
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for key in &self.0 {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_init_normalizes_keys() {
        let env = EnvAdapter::new(["abc", " easy as "]);
        assert_eq!(env.keys(), ["ABC", "EASY_AS"]);
    }

    #[test]
    #[serial]
    fn test_load_existing_vars() {
        let _guard = EnvGuard::set(&[("STRATA_ENV_ABC", "456")]);

        let mut env = EnvAdapter::new(["strata env abc"]);
        env.load_with(None);

        assert_eq!(env.data()["STRATA_ENV_ABC"], Value::String("456".into()));
    }

    #[test]
    #[serial]
    fn test_load_skips_missing_vars() {
        let _guard = EnvGuard::set(&[("STRATA_ENV_PRESENT", "123")]);

        let mut env = EnvAdapter::new(["strata env present", "strata env missing"]);
        env.load_with(None);

        assert_eq!(env.data().len(), 1);
        assert!(env.data().contains_key("STRATA_ENV_PRESENT"));
        assert!(!env.data().contains_key("STRATA_ENV_MISSING"));
    }

    #[test]
    #[serial]
    fn test_load_with_extra_keys() {
        let _guard = EnvGuard::set(&[
            ("STRATA_ENV_OWN", "123"),
            ("STRATA_ENV_EASY_AS", "do re mi"),
        ]);

        let mut env = EnvAdapter::new(["strata_env_own"]);
        env.load_with(Some(&["strata env easy as".to_string()]));

        assert_eq!(env.data()["STRATA_ENV_OWN"], "123");
        assert_eq!(env.data()["STRATA_ENV_EASY_AS"], "do re mi");

        // extras are per call, not accumulated
        env.load_with(None);
        assert!(!env.data().contains_key("STRATA_ENV_EASY_AS"));
        assert_eq!(env.keys(), ["STRATA_ENV_OWN"]);
    }

    #[test]
    #[serial]
    fn test_remap_stores_under_destination() {
        let _guard = EnvGuard::set(&[("STRATA_ENV_SRC", "5")]);

        let mut env = EnvAdapter::new(Vec::<String>::new()).with_remap("strata env src", "dest");
        env.load(&[]).unwrap();

        assert_eq!(env.data()["DEST"], "5");
        assert!(!env.data().contains_key("STRATA_ENV_SRC"));
    }

    #[test]
    #[serial]
    fn test_remap_applies_to_own_keys() {
        let _guard = EnvGuard::set(&[("STRATA_ENV_DB_URL", "postgres://db")]);

        let mut env = EnvAdapter::new(["strata env db url"])
            .with_remaps([("strata env db url", "database url")]);
        env.load(&[]).unwrap();

        assert_eq!(env.data().len(), 1);
        assert_eq!(env.data()["DATABASE_URL"], "postgres://db");
    }

    #[test]
    #[serial]
    fn test_reload_drops_unset_vars() {
        let guard = EnvGuard::set(&[("STRATA_ENV_TRANSIENT", "1")]);
        let mut env = EnvAdapter::new(["strata env transient"]);

        env.load(&[]).unwrap();
        assert!(env.data().contains_key("STRATA_ENV_TRANSIENT"));

        drop(guard);
        env.load(&[]).unwrap();
        assert!(env.data().is_empty());
    }
}
