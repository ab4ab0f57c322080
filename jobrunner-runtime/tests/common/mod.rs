use jobrunner_runtime::Runnable;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Shared observations collected by [`Worker`] runnables
#[derive(Default)]
pub struct Observations {
    pub runs: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub spans: Mutex<Vec<(Instant, Instant)>>,
}

impl Observations {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn spans(&self) -> Vec<(Instant, Instant)> {
        let mut spans = self.spans.lock().unwrap().clone();
        spans.sort();
        spans
    }
}

/// A runnable that sleeps for a fixed time and records when it ran
pub struct Worker {
    pub work: Duration,
    pub seen: Arc<Observations>,
}

impl Worker {
    pub fn new(work: Duration, seen: &Arc<Observations>) -> Self {
        Self {
            work,
            seen: seen.clone(),
        }
    }
}

impl Runnable for Worker {
    fn run(&self) {
        let start = Instant::now();
        let now_active = self.seen.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.max_active.fetch_max(now_active, Ordering::SeqCst);

        std::thread::sleep(self.work);

        self.seen.active.fetch_sub(1, Ordering::SeqCst);
        self.seen.runs.fetch_add(1, Ordering::SeqCst);
        self.seen.spans.lock().unwrap().push((start, Instant::now()));
    }

    fn name(&self) -> Option<&str> {
        Some("Worker")
    }
}

/// Poll `condition` until it holds or `limit` passes
pub async fn wait_until(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub fn assert_disjoint(spans: &[(Instant, Instant)]) {
    for pair in spans.windows(2) {
        assert!(
            pair[0].1 <= pair[1].0,
            "runs overlapped: first ended {:?} after second started",
            pair[0].1 - pair[1].0
        );
    }
}
