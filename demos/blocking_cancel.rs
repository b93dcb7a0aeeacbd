//! Blocking retry loop polling for a value, cancelled from another thread.
use steadfast::presets;
use steadfast::{CancellationToken, RetryError};
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let policy = presets::polling::<Option<u32>, std::io::Error>(Duration::from_millis(100))
        .retry_if(|ready: &Option<u32>| ready.is_none())
        .build()
        .expect("valid retry policy");

    let token = CancellationToken::new();
    let remote = token.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(450));
        println!("giving up");
        remote.cancel();
    });

    // The value never shows up; only cancellation ends the loop.
    let result = policy.execute_blocking_with_cancel(&token, || Ok(None));
    match result {
        Err(RetryError::Cancelled { attempts }) => println!("cancelled after {} polls", attempts),
        other => println!("unexpected: {:?}", other),
    }
    let _ = canceller.join();
}
