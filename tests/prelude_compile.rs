//! Compile-time prelude coverage test.
use std::time::Duration;
use tollgate::prelude::*;
use tower::service_fn;
use tower_layer::Layer;
use tower_service::Service;

#[tokio::test]
async fn prelude_reexports_core_types() {
    let config = FixedWindowConfig::new(10, Duration::from_secs(1)).expect("valid config");
    let limiter = FixedWindowLimiter::with_config(config)
        .expect("valid limiter")
        .with_clock(SystemClock)
        .with_wait_strategy(TokioSleeper);
    let _snapshot: WindowSnapshot = limiter.snapshot();
    let _closure = sleeper_fn(|_wait| async {});
    let _err: Option<LimiterError> = FixedWindowLimiter::new(0).err();

    let mut svc = FixedWindowLayer::new(limiter)
        .layer(service_fn(|_req: ()| async { Ok::<_, std::io::Error>(()) }));
    svc.call(()).await.expect("service call failed");
}
