//! Tower middleware that paces an inner service through a [`FixedWindowLimiter`].
//!
//! Every request reserves one unit before it reaches the inner service. A request that
//! does not fit in the current window is held back until the next one; nothing is rejected.
//!
//! ```rust
//! use std::time::Duration;
//! use tollgate::{FixedWindowLayer, FixedWindowLimiter};
//! use tower::{service_fn, ServiceBuilder, ServiceExt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let limiter = FixedWindowLimiter::with_window(100, Duration::from_secs(1)).unwrap();
//!     let svc = ServiceBuilder::new()
//!         .layer(FixedWindowLayer::new(limiter))
//!         .service(service_fn(|req: u32| async move { Ok::<_, std::io::Error>(req * 2) }));
//!     assert_eq!(svc.oneshot(21).await.unwrap(), 42);
//! }
//! ```

use crate::FixedWindowLimiter;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

/// A layer that paces requests through a shared [`FixedWindowLimiter`].
#[derive(Clone, Debug)]
pub struct FixedWindowLayer {
    limiter: Arc<FixedWindowLimiter>,
}

impl FixedWindowLayer {
    pub fn new(limiter: FixedWindowLimiter) -> Self {
        Self { limiter: Arc::new(limiter) }
    }

    /// Share a limiter that is also used outside the service stack.
    pub fn from_shared(limiter: Arc<FixedWindowLimiter>) -> Self {
        Self { limiter }
    }

    pub fn limiter(&self) -> &Arc<FixedWindowLimiter> {
        &self.limiter
    }
}

impl<S> Layer<S> for FixedWindowLayer {
    type Service = FixedWindowService<S>;

    fn layer(&self, service: S) -> Self::Service {
        FixedWindowService { inner: service, limiter: self.limiter.clone() }
    }
}

/// Middleware service produced by [`FixedWindowLayer`].
#[derive(Clone, Debug)]
pub struct FixedWindowService<S> {
    inner: S,
    limiter: Arc<FixedWindowLimiter>,
}

impl<S, Req> Service<Req> for FixedWindowService<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let limiter = self.limiter.clone();
        // The clone that was driven to readiness is the one that serves this request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            limiter.acquire().await;
            inner.call(req).await
        })
    }
}
