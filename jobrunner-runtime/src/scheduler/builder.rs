use super::handle::RunnerHandle;
use super::runner::Runner;
use crate::config::{load_toml_config, load_yaml_config, RunnerConfig};
use crate::error::Result;
use crate::job::ExecutionPolicy;
use config::Config;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Builder for a [`Runner`]
pub struct RunnerBuilder {
    config: Arc<Config>,
    settings: RunnerConfig,
}

impl Default for RunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerBuilder {
    /// Create a builder with empty config: unlimited pool, serialized runs
    pub fn new() -> Self {
        Self {
            config: Arc::new(Config::default()),
            settings: RunnerConfig::default(),
        }
    }

    /// Create with a TOML config file; `[jobs]` provides pool settings and
    /// other keys can be referenced from schedules as `${key}`
    pub fn with_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(load_toml_config(path)?)
    }

    /// Create with a YAML config file
    pub fn with_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(load_yaml_config(path)?)
    }

    /// Create with custom config
    pub fn with_config(config: Config) -> Result<Self> {
        let settings = RunnerConfig::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            settings,
        })
    }

    /// Maximum number of job bodies running at once, 0 for unlimited
    pub fn pool(mut self, pool: usize) -> Self {
        self.settings.pool = pool;
        self
    }

    /// Allow runs of the same job to overlap
    pub fn self_concurrent(mut self, self_concurrent: bool) -> Self {
        self.settings.self_concurrent = self_concurrent;
        self
    }

    /// Build the runner (does not start it yet)
    pub fn build(self) -> Runner {
        info!(
            pool = self.settings.pool,
            self_concurrent = self.settings.self_concurrent,
            "Building job runner"
        );

        Runner {
            config: self.config,
            policy: Arc::new(ExecutionPolicy::new(
                self.settings.pool,
                self.settings.self_concurrent,
            )),
        }
    }

    /// Build and start in one step
    pub async fn start(self) -> Result<RunnerHandle> {
        self.build().start().await
    }
}
