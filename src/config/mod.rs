//! Configuration loading and management.

mod adapter;
mod aggregate;
mod builder;
mod env;
mod error;
mod file;
mod fixed;
pub mod keys;
mod module;
mod set;

pub use adapter::{Adapter, AdapterKind};
pub use aggregate::Config;
pub use builder::ConfigBuilder;
pub use env::EnvAdapter;
pub use error::{ConfigError, Result};
pub use file::{FileAdapter, FileFormat};
pub use fixed::{Defaults, Overrides};
pub use module::ModuleAdapter;
pub use set::AdapterSet;
