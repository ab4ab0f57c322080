use jobrunner::{job, Func, RunnerBuilder};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Runs every 500 milliseconds, measured from the end of the previous run
#[job(schedule = "@every 500ms")]
fn heartbeat() {
    let count = COUNTER.fetch_add(1, Ordering::SeqCst) + 1;
    println!("[HEARTBEAT] run #{} at {}", count, chrono::Local::now().format("%H:%M:%S%.3f"));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let runner = RunnerBuilder::new().start().await?;
    runner.schedule_registered().await?;

    runner
        .schedule("now", Func::new(|| println!("[NOW] runs once, right away")), "greeting", Vec::new())
        .await?;
    runner
        .schedule("in 2s", Func::new(|| println!("[IN] runs once, two seconds later")), "", Vec::new())
        .await?;

    tokio::time::sleep(Duration::from_secs(5)).await;

    for snapshot in runner.status_report() {
        println!("{:<12} {:<14} {:<8} {}", snapshot.name, snapshot.spec, snapshot.status, snapshot.latency);
    }
    println!("heartbeat ran {} times in 5s", COUNTER.load(Ordering::SeqCst));

    runner.shutdown().await?;
    Ok(())
}
