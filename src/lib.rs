//! Ordered, multi-source configuration.
//!
//! Values from defaults, environment variables, JSON/YAML/settings files,
//! in-memory modules and overrides are merged into one [`Config`] in a fixed
//! precedence order: defaults first, overrides last, everything else in
//! registration order in between.

pub mod config;

pub use config::{
    Adapter, AdapterKind, AdapterSet, Config, ConfigBuilder, ConfigError, Defaults, EnvAdapter,
    FileAdapter, FileFormat, ModuleAdapter, Overrides, Result,
};
