//! Abstraction for sleeping/waiting between attempts
//!
//! Enables fast, deterministic tests without real time delays. Each sleeper serves both loops:
//! `sleep` is awaited by the async executor (which races it against cancellation itself), while
//! `sleep_blocking` suspends the calling thread and must watch the cancellation token on its own.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Longest uninterrupted thread sleep taken by the default blocking wait.
pub const BLOCKING_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a blocking wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The full duration passed.
    Elapsed,
    /// The cancellation token fired first.
    Cancelled,
}

/// Abstraction for sleeping/waiting
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>>;

    /// Block the current thread for `duration` unless `cancel` fires.
    fn sleep_blocking(&self, duration: Duration, cancel: &CancellationToken) -> Wake {
        sleep_in_slices(duration, cancel, BLOCKING_POLL_INTERVAL)
    }
}

/// Thread sleep broken into `slice`-sized naps, checking `cancel` before and after each nap.
pub fn sleep_in_slices(duration: Duration, cancel: &CancellationToken, slice: Duration) -> Wake {
    let deadline = Instant::now().checked_add(duration);
    loop {
        if cancel.is_cancelled() {
            return Wake::Cancelled;
        }
        let remaining = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => slice,
        };
        if remaining.is_zero() {
            return Wake::Elapsed;
        }
        std::thread::sleep(remaining.min(slice.max(Duration::from_millis(1))));
    }
}

/// Production sleeper using tokio runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Test sleeper that doesn't actually sleep
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async {})
    }

    fn sleep_blocking(&self, _duration: Duration, cancel: &CancellationToken) -> Wake {
        if cancel.is_cancelled() {
            Wake::Cancelled
        } else {
            Wake::Elapsed
        }
    }
}

/// Test sleeper that records every requested delay and returns immediately
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded delays, in request order.
    pub fn calls(&self) -> Vec<Duration> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    pub fn call_at(&self, idx: usize) -> Option<Duration> {
        self.lock().get(idx).copied()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Duration>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        self.lock().push(duration);
        Box::pin(async {})
    }

    fn sleep_blocking(&self, duration: Duration, cancel: &CancellationToken) -> Wake {
        self.lock().push(duration);
        if cancel.is_cancelled() {
            Wake::Cancelled
        } else {
            Wake::Elapsed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn instant_sleeper_doesnt_sleep() {
        let sleeper = InstantSleeper;
        let start = std::time::Instant::now();
        sleeper.sleep(Duration::from_secs(10)).await;
        let elapsed = start.elapsed();
        // Should complete almost instantly
        assert!(elapsed < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn tracking_sleeper_records_calls() {
        let sleeper = TrackingSleeper::new();

        sleeper.sleep(Duration::from_millis(100)).await;
        sleeper.sleep(Duration::from_millis(200)).await;
        sleeper.sleep_blocking(Duration::from_millis(400), &CancellationToken::new());

        let calls = sleeper.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Duration::from_millis(100));
        assert_eq!(calls[1], Duration::from_millis(200));
        assert_eq!(sleeper.call_at(2), Some(Duration::from_millis(400)));
    }

    #[tokio::test]
    async fn tracking_sleeper_can_clear() {
        let sleeper = TrackingSleeper::new();

        sleeper.sleep(Duration::from_millis(100)).await;
        assert_eq!(sleeper.call_count(), 1);

        sleeper.clear();
        assert_eq!(sleeper.call_count(), 0);

        sleeper.sleep(Duration::from_millis(200)).await;
        assert_eq!(sleeper.call_at(0), Some(Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn tokio_sleeper_actually_sleeps() {
        let sleeper = TokioSleeper;
        let start = std::time::Instant::now();
        sleeper.sleep(Duration::from_millis(50)).await;
        let elapsed = start.elapsed();
        // Should take at least the requested duration
        assert!(elapsed >= Duration::from_millis(45)); // Small tolerance for timing jitter
    }

    #[test]
    fn blocking_wait_elapses() {
        let start = std::time::Instant::now();
        let wake = TokioSleeper.sleep_blocking(Duration::from_millis(30), &CancellationToken::new());
        assert_eq!(wake, Wake::Elapsed);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn blocking_wait_wakes_on_cancel() {
        let token = CancellationToken::new();
        let remote = token.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        let start = std::time::Instant::now();
        let wake = TokioSleeper.sleep_blocking(Duration::from_secs(30), &token);
        handle.join().unwrap();

        assert_eq!(wake, Wake::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn blocking_wait_honors_cancel_before_sleeping() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(InstantSleeper.sleep_blocking(Duration::from_secs(1), &token), Wake::Cancelled);
        assert_eq!(sleep_in_slices(Duration::ZERO, &token, BLOCKING_POLL_INTERVAL), Wake::Cancelled);
    }
}
