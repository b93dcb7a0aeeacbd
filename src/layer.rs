//! Tower integration: run every request of a service through a [`RetryPolicy`].
//!
//! Each attempt clones the inner service and drives it with `oneshot`, so readiness is awaited
//! per attempt and readiness errors are classified like call errors. Requests must be `Clone`.
//!
//! ```rust
//! use std::time::Duration;
//! use steadfast::{Backoff, InstantSleeper, RetryLayer, RetryPolicy};
//! use tower::{service_fn, ServiceBuilder, ServiceExt};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::<String, std::io::Error>::builder()
//!     .backoff(Backoff::constant(Duration::from_millis(5)))
//!     .with_sleeper(InstantSleeper)
//!     .build()
//!     .unwrap();
//! let svc = ServiceBuilder::new()
//!     .layer(RetryLayer::new(policy))
//!     .service(service_fn(|req: &'static str| async move {
//!         Ok::<_, std::io::Error>(req.to_uppercase())
//!     }));
//! assert_eq!(svc.oneshot("ping").await.unwrap(), "PING");
//! # });
//! ```

use crate::error::RetryError;
use crate::retry::RetryPolicy;
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::ServiceExt;
use tower_layer::Layer;
use tower_service::Service;

/// Tower layer that wraps services with a retry policy.
pub struct RetryLayer<T, E> {
    policy: RetryPolicy<T, E>,
}

impl<T, E> RetryLayer<T, E> {
    pub fn new(policy: RetryPolicy<T, E>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy<T, E> {
        &self.policy
    }
}

impl<T, E> Clone for RetryLayer<T, E> {
    fn clone(&self) -> Self {
        Self { policy: self.policy.clone() }
    }
}

impl<T, E> std::fmt::Debug for RetryLayer<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryLayer").field("policy", &self.policy).finish()
    }
}

impl<S, T, E> Layer<S> for RetryLayer<T, E> {
    type Service = RetryService<S, T, E>;

    fn layer(&self, service: S) -> Self::Service {
        RetryService { inner: service, policy: self.policy.clone() }
    }
}

/// Retry service produced by [`RetryLayer`].
pub struct RetryService<S, T, E> {
    inner: S,
    policy: RetryPolicy<T, E>,
}

impl<S: Clone, T, E> Clone for RetryService<S, T, E> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), policy: self.policy.clone() }
    }
}

impl<S, T, E, Request> Service<Request> for RetryService<S, T, E>
where
    Request: Clone + Send + 'static,
    S: Service<Request, Response = T, Error = E> + Clone + Send + 'static,
    S::Future: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Response = T;
    type Error = RetryError<T, E>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of the inner service is awaited inside every attempt.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let policy = self.policy.clone();
        let inner = self.inner.clone();
        Box::pin(async move {
            let attempt = move || inner.clone().oneshot(req.clone());
            policy.execute(attempt).await
        })
    }
}
