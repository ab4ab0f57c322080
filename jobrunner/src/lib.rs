//! # Jobrunner - panic-safe, bounded job scheduling for Rust
//!
//! Schedule units of work to run now, after a delay, on a fixed interval or
//! on a cron schedule, without letting a failing job take the process down.
//!
//! ## Features
//!
//! - **Panic isolation**: a panicking job is logged with its backtrace and
//!   keeps being scheduled
//! - **Bounded pool**: optionally cap how many jobs run at once
//! - **No self-overlap**: by default a job that is still running delays its
//!   next run instead of running twice
//! - **Config support**: reuse schedules from config files as `${cron.frequent}`
//! - **Status reporting**: each job exposes `IDLE`/`RUNNING` and its last latency
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jobrunner::{job, Func, RunnerBuilder};
//!
//! #[job(schedule = "@every 5m")]
//! fn purge_sessions() {
//!     println!("purging expired sessions");
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = RunnerBuilder::with_toml("config/application.toml")?
//!         .start()
//!         .await?;
//!
//!     runner.schedule_registered().await?;
//!     runner
//!         .schedule("0 3 * * *", Func::new(|| println!("nightly")), "nightly", Vec::new())
//!         .await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     runner.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [jobs]
//! pool = 10
//! selfconcurrent = false
//!
//! [cron]
//! frequent = "*/5 * * * *"
//! ```
//!
//! Environment variables with the `APP_` prefix override file values, e.g.
//! `APP_JOBS_POOL=4`.

// Re-export macro
pub use jobrunner_macro::job;

// Re-export core types
pub use jobrunner_runtime::{
    Func, Job, JobSnapshot, JobStatus, Runnable, RunnerBuilder, RunnerError, RunnerHandle,
    ScheduleSpec, UNNAMED,
};

// Make jobrunner_runtime available for macro expansion
pub use jobrunner_runtime;
