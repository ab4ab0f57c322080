use super::descriptor::{to_driver_expressions, ScheduleSpec};
use crate::config::resolve_config_value;
use crate::duration::ParseDurationError;
use crate::error::{Result, RunnerError};
use crate::job::{ExecutionPolicy, Job, JobSnapshot};
use crate::registry::REGISTERED_JOBS;
use crate::runnable::{Func, Runnable};
use chrono::{DateTime, Utc};
use config::Config;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type JobList = Arc<Mutex<Vec<Arc<Job>>>>;

/// Handle for a running job runner
/// Used to schedule jobs, inspect them and shut the runner down
pub struct RunnerHandle {
    pub(crate) config: Arc<Config>,
    pub(crate) policy: Arc<ExecutionPolicy>,
    pub(crate) cron_scheduler: JobScheduler,
    pub(crate) task_handles: Mutex<Vec<JoinHandle<()>>>,
    pub(crate) jobs: JobList,
}

impl RunnerHandle {
    /// Schedule a job from a descriptor
    ///
    /// Accepted descriptors:
    /// - `@every <duration>`: run now, then again each time `<duration>` has
    ///   passed since the previous run finished
    /// - `now`: run once, immediately
    /// - `in <duration>`: run once after the delay
    /// - a 5-field cron expression or `@daily`-style descriptor
    ///
    /// `${key}` and `${key:default}` placeholders are resolved against the
    /// runner's config first. Returns the job right away; runs happen in the
    /// background.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use jobrunner_runtime::{Func, RunnerBuilder};
    ///
    /// # async fn demo() -> jobrunner_runtime::Result<()> {
    /// let runner = RunnerBuilder::new().pool(4).start().await?;
    /// let job = runner
    ///     .schedule("@every 30s", Func::new(|| println!("tick")), "ticker", Vec::new())
    ///     .await?;
    /// println!("{} is {}", job.name(), job.status());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn schedule<R>(
        &self,
        descriptor: &str,
        runnable: R,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<Arc<Job>>
    where
        R: Runnable + 'static,
    {
        self.schedule_arc(descriptor, Arc::new(runnable), name, payload)
            .await
    }

    /// Same as [`schedule`](Self::schedule) for an already shared runnable
    pub async fn schedule_arc(
        &self,
        descriptor: &str,
        runnable: Arc<dyn Runnable>,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<Arc<Job>> {
        let resolved = resolve_config_value(descriptor, &self.config)?;

        match ScheduleSpec::parse(&resolved)? {
            ScheduleSpec::Every(interval) => {
                Ok(self.spawn_every(interval, self.new_job(runnable, name, payload, resolved)))
            }
            ScheduleSpec::Now => Ok(self.spawn_now(self.new_job(runnable, name, payload, resolved))),
            ScheduleSpec::In(delay) => {
                Ok(self.spawn_after(delay, self.new_job(runnable, name, payload, resolved)))
            }
            ScheduleSpec::Cron(expression) => {
                self.add_cron(&expression, runnable, name, payload).await
            }
        }
    }

    /// Run the job at a fixed interval.
    /// The interval is the time between one run ending and the next starting;
    /// the time the job takes to run is not included. A zero interval is
    /// rejected.
    pub fn every<R>(
        &self,
        interval: Duration,
        runnable: R,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<Arc<Job>>
    where
        R: Runnable + 'static,
    {
        let spec = format!("@every {:?}", interval);
        if interval.is_zero() {
            return Err(RunnerError::InvalidDuration {
                descriptor: spec,
                source: ParseDurationError::ZeroInterval,
            });
        }
        Ok(self.spawn_every(interval, self.new_job(Arc::new(runnable), name, payload, spec)))
    }

    /// Run the job right now
    pub fn now<R>(&self, runnable: R, name: &str, payload: Vec<u8>) -> Arc<Job>
    where
        R: Runnable + 'static,
    {
        self.spawn_now(self.new_job(Arc::new(runnable), name, payload, "now".to_string()))
    }

    /// Run the job once, after the given delay
    pub fn after<R>(&self, delay: Duration, runnable: R, name: &str, payload: Vec<u8>) -> Arc<Job>
    where
        R: Runnable + 'static,
    {
        let spec = format!("in {:?}", delay);
        self.spawn_after(delay, self.new_job(Arc::new(runnable), name, payload, spec))
    }

    /// Run the job at every instant matching a cron expression
    pub async fn cron<R>(
        &self,
        expression: &str,
        runnable: R,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<Arc<Job>>
    where
        R: Runnable + 'static,
    {
        self.add_cron(expression, Arc::new(runnable), name, payload)
            .await
    }

    /// Schedule every job declared with `#[job(schedule = "...")]`
    ///
    /// Disabled jobs are skipped. A job whose schedule cannot be parsed is
    /// logged and skipped; the others are still scheduled.
    pub async fn schedule_registered(&self) -> Result<Vec<Arc<Job>>> {
        let mut scheduled = Vec::new();

        for register in REGISTERED_JOBS.iter() {
            let declared = register();
            let enabled = resolve_config_value(declared.enabled, &self.config)?;
            if enabled.eq_ignore_ascii_case("false") {
                info!(job = declared.name, "Skipping disabled job");
                continue;
            }

            match self
                .schedule(declared.schedule, Func::new(declared.handler), declared.name, Vec::new())
                .await
            {
                Ok(job) => scheduled.push(job),
                Err(e) => error!(job = declared.name, error = %e, "Failed to schedule job"),
            }
        }

        Ok(scheduled)
    }

    /// Jobs this runner still drives. One-shot jobs leave the list once
    /// their run has finished.
    pub fn jobs(&self) -> Vec<Arc<Job>> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of every job, for status pages
    pub fn status_report(&self) -> Vec<JobSnapshot> {
        self.jobs().iter().map(|job| job.snapshot()).collect()
    }

    /// Next instant the cron driver will fire the job, `None` for jobs
    /// that are not cron-driven. Instants are UTC.
    pub async fn next_fire(&self, job: &Job) -> Result<Option<DateTime<Utc>>> {
        let mut driver = self.cron_scheduler.clone();
        let mut earliest: Option<DateTime<Utc>> = None;
        for id in job.driver_ids() {
            if let Some(tick) = driver.next_tick_for_job(*id).await? {
                earliest = Some(earliest.map_or(tick, |current| current.min(tick)));
            }
        }
        Ok(earliest)
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    /// Shutdown the cron driver and abort interval and one-shot tasks
    pub async fn shutdown(mut self) -> Result<()> {
        self.cron_scheduler.shutdown().await?;

        let handles = std::mem::take(
            &mut *self
                .task_handles
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            handle.abort();
        }

        info!("Job runner stopped");
        Ok(())
    }

    fn new_job(
        &self,
        runnable: Arc<dyn Runnable>,
        name: &str,
        payload: Vec<u8>,
        spec: String,
    ) -> Arc<Job> {
        let job = Arc::new(Job::new(runnable, name, payload, spec, self.policy.clone()));
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(job.clone());
        info!(job = %job.name(), spec = %job.spec(), "Registered job");
        job
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self
            .task_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    fn spawn_every(&self, interval: Duration, job: Arc<Job>) -> Arc<Job> {
        let runner_job = job.clone();
        self.track(tokio::spawn(async move {
            loop {
                runner_job.run().await;
                tokio::time::sleep(interval).await;
            }
        }));
        job
    }

    fn spawn_now(&self, job: Arc<Job>) -> Arc<Job> {
        let runner_job = job.clone();
        let jobs = self.jobs.clone();
        self.track(tokio::spawn(async move {
            runner_job.run().await;
            forget(&jobs, &runner_job);
        }));
        job
    }

    fn spawn_after(&self, delay: Duration, job: Arc<Job>) -> Arc<Job> {
        let runner_job = job.clone();
        let jobs = self.jobs.clone();
        self.track(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            runner_job.run().await;
            forget(&jobs, &runner_job);
        }));
        job
    }

    async fn add_cron(
        &self,
        expression: &str,
        runnable: Arc<dyn Runnable>,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<Arc<Job>> {
        let driver_expressions = to_driver_expressions(expression)?;

        let job = Arc::new(Job::new(
            runnable,
            name,
            payload,
            expression,
            self.policy.clone(),
        ));

        // Split expressions register one driver entry per day field; the
        // gate keeps a day matching both from running the job twice.
        let gate = Arc::new(FireGate::default());
        let mut driver_ids = Vec::with_capacity(driver_expressions.len());
        for driver_expression in &driver_expressions {
            let added = match cron_job(
                expression,
                driver_expression,
                fire_callback(job.clone(), gate.clone()),
            ) {
                Ok(entry) => self.cron_scheduler.add(entry).await.map_err(RunnerError::from),
                Err(e) => Err(e),
            };

            match added {
                Ok(id) => driver_ids.push(id),
                Err(e) => {
                    warn!(job = %job.name(), error = %e, "Cron driver rejected job");
                    for id in &driver_ids {
                        if let Err(e) = self.cron_scheduler.remove(id).await {
                            warn!(job = %job.name(), error = %e, "Failed to remove cron entry");
                        }
                    }
                    return Err(e);
                }
            }
        }
        job.set_driver_ids(driver_ids);

        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(job.clone());
        info!(
            job = %job.name(),
            spec = %job.spec(),
            entries = driver_expressions.len(),
            "Registered cron job"
        );
        Ok(job)
    }
}

fn forget(jobs: &Mutex<Vec<Arc<Job>>>, job: &Arc<Job>) {
    jobs.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .retain(|tracked| !Arc::ptr_eq(tracked, job));
}

/// Minute of the last admitted fire, shared by the driver entries of one job
#[derive(Debug)]
struct FireGate(AtomicI64);

impl Default for FireGate {
    fn default() -> Self {
        Self(AtomicI64::new(i64::MIN))
    }
}

impl FireGate {
    fn admit(&self, minute: i64) -> bool {
        self.0.swap(minute, Ordering::SeqCst) != minute
    }
}

type FireFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

fn fire_callback(
    job: Arc<Job>,
    gate: Arc<FireGate>,
) -> impl FnMut(Uuid, JobScheduler) -> FireFuture + Send + Sync + 'static {
    move |_id, _driver| {
        let job = job.clone();
        let admitted = gate.admit(Utc::now().timestamp().div_euclid(60));
        let fire: FireFuture = Box::pin(async move {
            if admitted {
                job.run().await;
            } else {
                debug!(job = %job.name(), "Cron fire already handled this minute");
            }
        });
        fire
    }
}

fn cron_job<F>(expression: &str, driver_expression: &str, callback: F) -> Result<CronJob>
where
    F: FnMut(Uuid, JobScheduler) -> FireFuture + Send + Sync + 'static,
{
    CronJob::new_async(driver_expression, callback).map_err(|source| RunnerError::InvalidCron {
        expression: expression.to_string(),
        reason: source.to_string(),
        source: Some(source),
    })
}
