/// A job declared with the `#[job(schedule = "...")]` attribute
#[derive(Debug, Clone, Copy)]
pub struct RegisteredJob {
    pub name: &'static str,
    pub schedule: &'static str,
    pub enabled: &'static str,
    pub handler: fn(),
}

/// Global distributed slice for collecting declared jobs
///
/// Populated by `#[job]`; nothing runs until `RunnerHandle::schedule_registered`
/// is called.
#[linkme::distributed_slice]
pub static REGISTERED_JOBS: [fn() -> RegisteredJob] = [..];
