use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const SETTINGS_FILE: &str = "gumbo-book";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Build(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub cache_path: PathBuf,
    pub api_base_url: String,
    pub output_dir: PathBuf,
    pub browser: String,
}

/// Defaults, then `gumbo-book.toml` in the working directory, then `GUMBO_*` env vars.
pub fn load() -> Result<Settings, SettingsError> {
    let builder = Config::builder()
        .set_default("cache_path", "data/gumbo-book.sqlite")?
        .set_default("api_base_url", "https://www.gumbo-millennium.nl/")?
        .set_default("output_dir", "dist")?
        .set_default("browser", "chromium")?
        .add_source(File::with_name(SETTINGS_FILE).required(false))
        .add_source(Environment::with_prefix("GUMBO"));

    let settings = builder.build()?.try_deserialize()?;
    Ok(settings)
}
