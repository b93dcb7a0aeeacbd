//! Minimal retry example: flaky async work, typed error policy, capped exponential backoff.
use steadfast::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), RetryError<&'static str, std::io::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let policy = RetryPolicy::builder()
        .max_attempts(4)
        .backoff(
            Backoff::exponential(Duration::from_millis(200))
                .with_max(Duration::from_secs(2))
                .expect("valid backoff cap")
                .with_jitter(Jitter::full()),
        )
        .error_policy(retry_on!(std::io::Error))
        .build()
        .expect("valid retry policy");

    let calls = AtomicUsize::new(0);
    let value = policy
        .execute(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                // Replace with your real fallible work
                if n < 2 {
                    Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
                } else {
                    Ok("hello from retry")
                }
            }
        })
        .await?;

    println!("{} (after {} attempts)", value, calls.load(Ordering::SeqCst));
    Ok(())
}
