//! Wait for a simulated service to report healthy.
//!
//! ```text
//! RUST_LOG=info cargo run -p nebula-poll --example wait_for_service
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use nebula_poll::{LogLevel, LoggingHook, PollError, TimeUnit, poll};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Health {
    Starting,
    Degraded,
    Healthy,
}

/// Fails twice, then warms up through `Starting` and `Degraded`.
async fn probe(calls: Arc<AtomicU32>) -> Result<Health, String> {
    let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    match call {
        1 | 2 => Err(format!("connection refused (call {call})")),
        3 => Ok(Health::Starting),
        4 => Ok(Health::Degraded),
        _ => Ok(Health::Healthy),
    }
}

#[tokio::main]
async fn main() -> Result<(), PollError<Health>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let calls = Arc::new(AtomicU32::new(0));

    let (health, stats) = poll(|| probe(Arc::clone(&calls)))
        .with_interval(200, TimeUnit::Milliseconds)
        .at_most(10, TimeUnit::Seconds)
        .ignore_errors()
        .with_hook(Arc::new(LoggingHook::new(LogLevel::Info)))
        .until_with_stats(|health| *health == Health::Healthy)
        .await?;

    println!(
        "service is {health:?} after {} attempt(s) in {:?}",
        stats.attempts, stats.elapsed
    );
    for record in &stats.history {
        println!("  {record}");
    }

    // The minimum duration keeps polling past the first healthy answer.
    let (_, stats) = poll(|| probe(Arc::clone(&calls)))
        .with_interval(100, TimeUnit::Milliseconds)
        .at_least(1, TimeUnit::Seconds)
        .until_with_stats(|health| *health == Health::Healthy)
        .await?;

    println!(
        "stayed healthy for {:?} across {} attempt(s)",
        stats.elapsed, stats.attempts
    );

    Ok(())
}
