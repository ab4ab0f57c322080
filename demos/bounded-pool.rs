use jobrunner::{Func, JobStatus, RunnerBuilder};
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let runner = RunnerBuilder::new().pool(3).start().await?;
    let started = Instant::now();

    let mut jobs = Vec::new();
    for i in 0..9 {
        let job = runner
            .schedule(
                "now",
                Func::new(move || {
                    println!("[worker-{}] start", i);
                    std::thread::sleep(Duration::from_millis(500));
                }),
                &format!("worker-{}", i),
                Vec::new(),
            )
            .await?;
        jobs.push(job);
    }

    while jobs.iter().any(|j| j.latency().is_zero() || j.status() == JobStatus::Running) {
        let running = jobs.iter().filter(|j| j.status() == JobStatus::Running).count();
        println!("{:>5}ms  running: {}", started.elapsed().as_millis(), running);
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    println!("9 jobs of 500ms with a pool of 3 drained in {:?}", started.elapsed());
    runner.shutdown().await?;
    Ok(())
}
