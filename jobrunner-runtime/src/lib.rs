//! Jobrunner Runtime - execution engine and dispatcher for scheduled jobs
//!
//! Jobs run now, after a delay, on a fixed interval or on a cron schedule.
//! Every run passes through [`Job::run`], which isolates panics, honours the
//! runner's concurrency pool and serializes runs of the same job.

mod config;
mod duration;
mod error;
mod fault;
mod job;
mod limiter;
mod registry;
mod runnable;
pub mod scheduler;

// Re-export public API
pub use config::{load_toml_config, load_yaml_config, resolve_config_value, RunnerConfig};
pub use duration::{parse_duration, ParseDurationError, TimeUnit};
pub use error::{Result, RunnerError};
pub use job::{ExecutionPolicy, Job, JobSnapshot, JobStatus, UNNAMED};
pub use limiter::AdmissionLimiter;
pub use linkme;
pub use registry::{RegisteredJob, REGISTERED_JOBS};
pub use runnable::{Func, Runnable};
pub use scheduler::{Runner, RunnerBuilder, RunnerHandle, ScheduleSpec};
