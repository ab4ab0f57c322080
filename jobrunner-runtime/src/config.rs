use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

/// Runner settings, read from the `jobs` table
///
/// ```toml
/// [jobs]
/// pool = 10             # max job bodies running at once, 0 = unlimited
/// selfconcurrent = false # allow overlapping runs of the same job
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub pool: usize,
    #[serde(rename = "selfconcurrent")]
    pub self_concurrent: bool,
}

impl RunnerConfig {
    /// Extract the `jobs` table, falling back to defaults when it is absent
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.get::<RunnerConfig>("jobs") {
            Ok(settings) => Ok(settings),
            Err(config::ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Load config from a specific TOML file
pub fn load_toml_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    load_config(path.as_ref(), FileFormat::Toml)
}

/// Load config from a specific YAML file
pub fn load_yaml_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    load_config(path.as_ref(), FileFormat::Yaml)
}

fn load_config(path: &Path, format: FileFormat) -> Result<Config> {
    let config = Config::builder()
        .add_source(File::from(path).format(format))
        .add_source(config::Environment::with_prefix("APP").separator("_"))
        .build()?;
    Ok(config)
}

/// Resolve a placeholder like ${cron.frequent} or ${cron.report:@every 1h}
///
/// Values that are not placeholders are returned unchanged.
pub fn resolve_config_value(value: &str, config: &Config) -> Result<String> {
    let Some(inner) = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return Ok(value.to_string());
    };

    match inner.split_once(':') {
        Some((key, default_value)) => match config.get_string(key) {
            Ok(resolved) => Ok(resolved),
            Err(_) => Ok(default_value.to_string()),
        },
        None => Ok(config.get_string(inner)?),
    }
}
