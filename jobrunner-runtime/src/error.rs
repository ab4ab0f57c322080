use tokio_cron_scheduler::JobSchedulerError;

use crate::duration::ParseDurationError;

/// Errors returned while configuring a runner or scheduling a job
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidCron {
        expression: String,
        reason: String,
        /// Set when the trigger driver rejected the expression
        #[source]
        source: Option<JobSchedulerError>,
    },

    #[error("invalid duration in schedule '{descriptor}': {source}")]
    InvalidDuration {
        descriptor: String,
        #[source]
        source: ParseDurationError,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
