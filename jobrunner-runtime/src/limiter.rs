use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds how many job bodies execute at the same time across a runner
///
/// A capacity of zero disables the gate.
#[derive(Debug)]
pub struct AdmissionLimiter {
    permits: Option<Arc<Semaphore>>,
    capacity: usize,
}

impl AdmissionLimiter {
    pub fn new(capacity: usize) -> Self {
        let permits = (capacity > 0).then(|| Arc::new(Semaphore::new(capacity)));
        Self { permits, capacity }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Wait for a free slot. The slot is returned when the permit drops,
    /// wherever the permit has been moved to.
    ///
    /// Returns `None` when the gate is disabled.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.permits {
            // The semaphore is never closed, so acquire only fails if it were.
            Some(permits) => permits.clone().acquire_owned().await.ok(),
            None => None,
        }
    }

    /// Configured capacity, zero meaning unlimited
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots right now, `None` when unlimited
    pub fn available(&self) -> Option<usize> {
        self.permits.as_ref().map(|p| p.available_permits())
    }
}

impl Default for AdmissionLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}
