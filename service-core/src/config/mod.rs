use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Settings shared by every service binary.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load from an optional `configuration.{toml,yaml,json}` file, then the
    /// process environment (`PORT`). A `.env` file is honored if present.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .ignore_empty(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
