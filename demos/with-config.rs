use jobrunner::{job, Func, RunnerBuilder};
use std::time::Duration;

#[job(schedule = "${cron.frequent:@every 1m}")]
fn refresh_cache() {
    println!("[refresh_cache] refreshing");
}

#[job(schedule = "${cron.report}", enabled = "${reports.enabled:false}")]
fn weekly_report() {
    println!("[weekly_report] building report");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    // pool and selfconcurrent come from [jobs]; APP_JOBS_POOL=1 overrides it
    let runner = RunnerBuilder::with_toml("demos/config/application.toml")?
        .start()
        .await?;

    let jobs = runner.schedule_registered().await?;
    println!("registered {} jobs from declarations", jobs.len());

    runner
        .schedule("${cron.frequent}", Func::new(|| println!("[inline] shares cron.frequent")), "inline", Vec::new())
        .await?;

    tokio::time::sleep(Duration::from_secs(3)).await;
    for snapshot in runner.status_report() {
        println!("{:?}", snapshot);
    }

    runner.shutdown().await?;
    Ok(())
}
