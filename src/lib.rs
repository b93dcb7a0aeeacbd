#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # steadfast
//!
//! Policy-driven retry for Rust: classify errors and results, compute delays, and run an
//! operation until it succeeds, fails permanently, exhausts its limits, or is cancelled.
//!
//! ## Features
//!
//! - **Error policies**: retry on a set of error types (`retry_on!`), on refinements of a type,
//!   on anything in the `source()` chain, or on any predicate
//! - **Result policies**: treat sentinel or unfit values as soft failures
//! - **Delay policies**: constant, linear, exponential (configurable factor and cap) with full,
//!   equal or proportional jitter, or any closure of the attempt outcome
//! - **Limits**: total attempts and/or elapsed-time budget
//! - **Cancellation** via `tokio_util::sync::CancellationToken`, observed before every attempt
//!   and during every wait
//! - **Async and blocking** executors with identical semantics
//! - **Tower** layer, declarative configuration, `tracing` events
//!
//! ## Quick Start
//!
//! ```rust
//! use steadfast::{retry_on, Backoff, Jitter, RetryPolicy};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let policy = RetryPolicy::<String, std::io::Error>::builder()
//!         .max_attempts(3)
//!         .backoff(Backoff::exponential(Duration::from_millis(10)).with_jitter(Jitter::full()))
//!         .error_policy(retry_on!(std::io::Error))
//!         .build()
//!         .unwrap();
//!
//!     let result = policy.execute(|| async {
//!         // Your async operation here
//!         Ok::<_, std::io::Error>("done".to_string())
//!     }).await;
//!     assert_eq!(result.unwrap(), "done");
//! }
//! ```

pub mod backoff;
pub mod clock;
pub mod config;
pub mod delay;
pub mod error;
pub mod jitter;
pub mod layer;
pub mod outcome;
pub mod policy;
pub mod prelude;
pub mod presets;
pub mod retry;
pub mod sleeper;
pub mod telemetry;

// Re-exports
pub use backoff::{Backoff, BackoffError, MAX_BACKOFF};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::RetryConfig;
pub use delay::DelayPolicy;
pub use error::{Limit, RetryError};
pub use jitter::Jitter;
pub use layer::{RetryLayer, RetryService};
pub use outcome::{AttemptRecord, Outcome};
pub use policy::{
    AnyError, ErrorPolicy, ErrorType, NoError, PolicyError, ResultPolicy, RetryIfResult, RetryOn,
};
pub use retry::{BuildError, RetryPolicy, RetryPolicyBuilder};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper, Wake};
pub use telemetry::{LogListener, MemoryListener, NullListener, RetryEvent, RetryListener};
pub use tokio_util::sync::CancellationToken;
