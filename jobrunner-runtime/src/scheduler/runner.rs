use super::handle::RunnerHandle;
use crate::error::Result;
use crate::job::ExecutionPolicy;
use config::Config;
use std::sync::{Arc, Mutex};
use tokio_cron_scheduler::JobScheduler;
use tracing::info;

/// Configured runner ready to start
pub struct Runner {
    pub(crate) config: Arc<Config>,
    pub(crate) policy: Arc<ExecutionPolicy>,
}

impl Runner {
    /// Start the cron trigger driver and return a handle for scheduling jobs
    pub async fn start(self) -> Result<RunnerHandle> {
        let cron_scheduler = JobScheduler::new().await?;
        cron_scheduler.start().await?;

        info!(
            pool = self.policy.limiter().capacity(),
            self_concurrent = self.policy.self_concurrent(),
            "Job runner started"
        );

        Ok(RunnerHandle {
            config: self.config,
            policy: self.policy,
            cron_scheduler,
            task_handles: Mutex::new(Vec::new()),
            jobs: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }
}
