use serde::Deserialize;
use serde_json::json;
use strata::{Config, ModuleAdapter};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(dead_code)]
struct AppConfig {
    app_name: String,
    debug: bool,
    database: Database,
    workers: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(dead_code)]
struct Database {
    host: String,
    port: u16,
}

fn main() -> Result<(), strata::ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // defaults -> json -> settings -> module -> env -> overrides
    let config = Config::builder()
        .with_defaults([("app name", json!("strata-demo")), ("debug", json!(false))])
        .with_file("demos/default.json", true)
        .with_file("demos/settings.toml", false)
        .with_module(ModuleAdapter::new([("WORKERS", 2)]))
        .with_env_remapped(["debug"], [("demo workers", "workers")])
        .with_overrides([("app name", "strata-demo (overridden)")])
        .load()?;

    println!("database.host = {}", config.get("database.host")?);

    // env values stay strings, so only extract when they weren't set
    if std::env::var_os("DEBUG").is_none() && std::env::var_os("DEMO_WORKERS").is_none() {
        let app: AppConfig = config.extract()?;
        println!("{app:#?}");
    } else {
        for (key, value) in config.iter() {
            println!("{key} = {value}");
        }
    }

    Ok(())
}
