use jobrunner::{job, Runnable, RunnerBuilder};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Example job with state
struct UserSync {
    region: String,
    counter: AtomicU32,
}

#[job]
impl Runnable for UserSync {
    fn run(&self) {
        let count = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[UserSync] syncing users in {} - run #{}", self.region, count);
        std::thread::sleep(Duration::from_millis(300));
    }
}

/// A job that fails every time; the runner logs the panic and keeps going
struct FlakyExport;

#[job(name = "flaky-export")]
impl Runnable for FlakyExport {
    fn run(&self) {
        panic!("export target unreachable");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("jobrunner_runtime=debug"))
        .init();

    let runner = RunnerBuilder::new().start().await?;

    let sync = runner
        .schedule(
            "@every 1s",
            UserSync { region: "eu-west".to_string(), counter: AtomicU32::new(0) },
            "",
            Vec::new(),
        )
        .await?;
    let flaky = runner
        .schedule("@every 2s", FlakyExport, "", b"{\"target\":\"s3\"}".to_vec())
        .await?;

    println!("scheduled {} and {}", sync.name(), flaky.name());

    tokio::time::sleep(Duration::from_secs(6)).await;
    println!("{} last took {:?}, {} is {}", sync.name(), sync.latency(), flaky.name(), flaky.status());

    runner.shutdown().await?;
    Ok(())
}
