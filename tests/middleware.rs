mod common;

use common::test_helpers::manual_limiter;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tollgate::{Clock, FixedWindowLayer};
use tower::{service_fn, ServiceBuilder, ServiceExt};

#[tokio::test]
async fn layer_delays_request_past_window_capacity() {
    let (limiter, clock, sleeper) =
        manual_limiter(2, Duration::from_secs(1), Duration::from_millis(30_200));
    let layer = FixedWindowLayer::new(limiter);
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_clone = calls.clone();
    let svc = ServiceBuilder::new().layer(layer.clone()).service(service_fn(move |req: u32| {
        let calls = calls_clone.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(req + 1)
        }
    }));

    for i in 0..3 {
        assert_eq!(svc.clone().oneshot(i).await.unwrap(), i + 1);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.calls(), vec![Duration::from_millis(800)]);
    assert_eq!(clock.now(), Duration::from_secs(31));
    // The delayed request returns into the 31s window without being counted there.
    assert_eq!(layer.limiter().snapshot().count, 2);
}

#[tokio::test]
async fn inner_errors_pass_through_unchanged() {
    let (limiter, _clock, _sleeper) =
        manual_limiter(5, Duration::from_secs(1), Duration::from_secs(1));
    let svc = ServiceBuilder::new().layer(FixedWindowLayer::new(limiter)).service(service_fn(
        |_req: ()| async {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "upstream down"))
        },
    ));

    let err = svc.oneshot(()).await.unwrap_err();
    assert_eq!(err.to_string(), "upstream down");
}

#[tokio::test]
async fn shared_limiter_counts_calls_from_outside_the_stack() {
    let (limiter, _clock, sleeper) =
        manual_limiter(1, Duration::from_secs(1), Duration::from_millis(2_500));
    let limiter = Arc::new(limiter);
    let svc = ServiceBuilder::new()
        .layer(FixedWindowLayer::from_shared(limiter.clone()))
        .service(service_fn(|_req: ()| async { Ok::<_, std::io::Error>(()) }));

    limiter.acquire().await;
    svc.oneshot(()).await.unwrap();

    assert_eq!(sleeper.calls(), vec![Duration::from_millis(500)]);
}
