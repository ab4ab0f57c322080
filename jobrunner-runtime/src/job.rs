use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::fault;
use crate::limiter::AdmissionLimiter;
use crate::runnable::Runnable;

/// Name given to jobs that have neither an explicit nor an inherent name
pub const UNNAMED: &str = "(unnamed)";

/// Observable execution state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Idle,
    Running,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "IDLE",
            JobStatus::Running => "RUNNING",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gating shared by every job of one runner
#[derive(Debug, Default)]
pub struct ExecutionPolicy {
    pub(crate) limiter: AdmissionLimiter,
    /// When false, runs of the same job are serialized
    pub(crate) self_concurrent: bool,
}

impl ExecutionPolicy {
    pub fn new(pool: usize, self_concurrent: bool) -> Self {
        Self {
            limiter: AdmissionLimiter::new(pool),
            self_concurrent,
        }
    }

    pub fn limiter(&self) -> &AdmissionLimiter {
        &self.limiter
    }

    pub fn self_concurrent(&self) -> bool {
        self.self_concurrent
    }
}

/// A scheduled unit of work plus its status and last latency
pub struct Job {
    name: String,
    spec: String,
    outer: Vec<u8>,
    inner: Arc<dyn Runnable>,
    policy: Arc<ExecutionPolicy>,
    state: Arc<RunState>,
    run_lock: Arc<tokio::sync::Mutex<()>>,
    driver_ids: OnceLock<Vec<Uuid>>,
}

/// Status and latency, shared with the blocking thread running the body
#[derive(Debug, Default)]
struct RunState {
    running: AtomicBool,
    latency_nanos: AtomicU64,
}

/// Point-in-time view of a job for status pages and persistence
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub name: String,
    pub spec: String,
    pub status: JobStatus,
    pub latency: String,
    pub outer: Vec<u8>,
}

impl Job {
    /// Build an idle job. The name is `name` when non-empty, else the
    /// runnable's own name, else [`UNNAMED`].
    pub fn new(
        inner: Arc<dyn Runnable>,
        name: &str,
        outer: Vec<u8>,
        spec: impl Into<String>,
        policy: Arc<ExecutionPolicy>,
    ) -> Self {
        let name = if !name.is_empty() {
            name.to_string()
        } else {
            inner
                .name()
                .filter(|n| !n.is_empty())
                .unwrap_or(UNNAMED)
                .to_string()
        };

        Self {
            name,
            spec: spec.into(),
            outer,
            inner,
            policy,
            state: Arc::new(RunState::default()),
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
            driver_ids: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schedule descriptor this job was created from
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// Opaque payload supplied by the caller
    pub fn outer(&self) -> &[u8] {
        &self.outer
    }

    pub fn status(&self) -> JobStatus {
        if self.state.running.load(Ordering::SeqCst) {
            JobStatus::Running
        } else {
            JobStatus::Idle
        }
    }

    /// Wall time of the most recently finished run
    pub fn latency(&self) -> Duration {
        Duration::from_nanos(self.state.latency_nanos.load(Ordering::SeqCst))
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            name: self.name.clone(),
            spec: self.spec.clone(),
            status: self.status(),
            latency: format!("{:?}", self.latency()),
            outer: self.outer.clone(),
        }
    }

    /// Cron driver entries firing this job, empty for other strategies
    pub fn driver_ids(&self) -> &[Uuid] {
        self.driver_ids.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn set_driver_ids(&self, ids: Vec<Uuid>) {
        let _ = self.driver_ids.set(ids);
    }

    /// Execute the job once
    ///
    /// Waits for this job's previous run when runs are serialized, then for a
    /// pool slot when the pool is bounded. The body runs on the blocking pool
    /// and owns the lock, the slot and the status reset, so they are released
    /// only when the body returns, even if this future is dropped first. A
    /// panic in the body is logged and swallowed.
    pub async fn run(&self) {
        let start = Instant::now();

        let serial = if self.policy.self_concurrent {
            None
        } else {
            Some(self.run_lock.clone().lock_owned().await)
        };
        let permit = self.policy.limiter.acquire().await;

        let inner = self.inner.clone();
        let reset = RunGuard {
            state: self.state.clone(),
            name: self.name.clone(),
            start,
        };
        self.state.running.store(true, Ordering::SeqCst);
        debug!(job = %self.name, "job started");

        let body = tokio::task::spawn_blocking(move || {
            // Drop order: status reset, then pool slot, then run lock
            let _serial = serial;
            let _permit = permit;
            let reset = reset;

            if let Err(fault) = fault::catch(|| inner.run()) {
                let backtrace = fault
                    .backtrace
                    .map(|b| b.to_string())
                    .unwrap_or_default();
                error!(
                    job = %reset.name,
                    panic = %fault.message,
                    backtrace = %backtrace,
                    "job panicked"
                );
            }
        });

        match body.await {
            Ok(()) => {}
            Err(e) if e.is_panic() => {
                let message = fault::panic_message(e.into_panic().as_ref());
                error!(job = %self.name, panic = %message, "job panicked");
            }
            Err(e) => {
                warn!(job = %self.name, error = %e, "job run was cancelled");
            }
        }
    }
}

/// Restores idle status and records latency when the body finishes
struct RunGuard {
    state: Arc<RunState>,
    name: String,
    start: Instant,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.state.latency_nanos.store(nanos, Ordering::SeqCst);
        self.state.running.store(false, Ordering::SeqCst);
        debug!(job = %self.name, latency = ?elapsed, "job finished");
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("status", &self.status())
            .field("latency", &self.latency())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runnable::Func;
    use std::sync::atomic::AtomicUsize;

    struct Named;

    impl Runnable for Named {
        fn run(&self) {}

        fn name(&self) -> Option<&str> {
            Some("Named")
        }
    }

    fn policy() -> Arc<ExecutionPolicy> {
        Arc::new(ExecutionPolicy::default())
    }

    #[test]
    fn explicit_name_wins() {
        let job = Job::new(Arc::new(Named), "nightly", vec![], "now", policy());
        assert_eq!(job.name(), "nightly");
    }

    #[test]
    fn falls_back_to_runnable_name() {
        let job = Job::new(Arc::new(Named), "", vec![], "now", policy());
        assert_eq!(job.name(), "Named");
    }

    #[test]
    fn bare_func_is_unnamed() {
        let job = Job::new(Arc::new(Func::new(|| {})), "", vec![1, 2], "in 5s", policy());
        assert_eq!(job.name(), UNNAMED);
        assert_eq!(job.spec(), "in 5s");
        assert_eq!(job.outer(), &[1, 2]);
    }

    #[test]
    fn new_job_is_idle_with_zero_latency() {
        let job = Job::new(Arc::new(Named), "", vec![], "now", policy());
        assert_eq!(job.status(), JobStatus::Idle);
        assert_eq!(job.status().as_str(), "IDLE");
        assert_eq!(job.latency(), Duration::ZERO);
    }

    #[tokio::test]
    async fn run_records_latency_and_returns_to_idle() {
        let job = Job::new(
            Arc::new(Func::new(|| std::thread::sleep(Duration::from_millis(30)))),
            "sleepy",
            vec![],
            "now",
            policy(),
        );
        job.run().await;
        assert_eq!(job.status(), JobStatus::Idle);
        assert!(job.latency() >= Duration::from_millis(30));
        assert!(job.latency() < Duration::from_secs(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn status_is_running_during_the_body() {
        let job = Arc::new(Job::new(
            Arc::new(Func::new(|| std::thread::sleep(Duration::from_millis(200)))),
            "slow",
            vec![],
            "now",
            policy(),
        ));
        let handle = {
            let job = job.clone();
            tokio::spawn(async move { job.run().await })
        };

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(job.status(), JobStatus::Running);

        handle.await.unwrap();
        assert_eq!(job.status(), JobStatus::Idle);
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let job = Job::new(
            Arc::new(Func::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                panic!("bad input");
            })),
            "faulty",
            vec![],
            "now",
            policy(),
        );

        job.run().await;
        job.run().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(job.status(), JobStatus::Idle);
    }

    #[test]
    fn snapshot_serializes_status_in_uppercase() {
        let job = Job::new(Arc::new(Named), "report", b"{}".to_vec(), "@every 1m", policy());
        let value = serde_json::to_value(job.snapshot()).unwrap();
        assert_eq!(value["name"], "report");
        assert_eq!(value["spec"], "@every 1m");
        assert_eq!(value["status"], "IDLE");
        assert_eq!(value["latency"], "0ns");
    }
}
