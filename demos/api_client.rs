//! Pacing a batch of outbound calls under a "5 requests per second" cap.
//!
//! Every wait is printed at debug level.
use std::time::{Duration, Instant};
use tollgate::{FixedWindowLayer, FixedWindowLimiter};
use tower::{service_fn, ServiceBuilder, ServiceExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let limiter = FixedWindowLimiter::with_window(5, Duration::from_secs(1))
        .expect("5 per second is a valid config");
    let client = ServiceBuilder::new()
        .layer(FixedWindowLayer::new(limiter))
        .service(service_fn(|id: u32| async move {
            // Stand-in for an HTTP request.
            Ok::<_, std::io::Error>(format!("response #{id}"))
        }));

    let start = Instant::now();
    for id in 0..12 {
        let response = client.clone().oneshot(id).await.expect("fake upstream never fails");
        println!("{:>6.3}s  {response}", start.elapsed().as_secs_f64());
    }
}
