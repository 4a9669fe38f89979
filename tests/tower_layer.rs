//! Tower layer integration: retry policies as middleware.

use polly::{retry, wait_and_retry, TrackingSleeper};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{Service, ServiceBuilder, ServiceExt};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("upstream failed")]
struct UpstreamError;

#[derive(Clone)]
struct Upstream {
    succeed_at: usize,
    calls: Arc<AtomicUsize>,
}

impl Upstream {
    fn new(succeed_at: usize) -> Self {
        Self { succeed_at, calls: Arc::new(AtomicUsize::new(0)) }
    }
}

impl Service<&'static str> for Upstream {
    type Response = String;
    type Error = UpstreamError;
    type Future = futures::future::Ready<Result<String, UpstreamError>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: &'static str) -> Self::Future {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.succeed_at {
            futures::future::ready(Ok(format!("{req}:{n}")))
        } else {
            futures::future::ready(Err(UpstreamError))
        }
    }
}

#[tokio::test]
async fn immediate_layer_retries_the_wrapped_service() {
    let upstream = Upstream::new(3);
    let calls = upstream.calls.clone();
    let mut service = ServiceBuilder::new().layer(retry(3).into_layer()).service(upstream);

    let response = service.ready().await.unwrap().call("ping").await;

    assert_eq!(response, Ok("ping:3".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn insufficient_budget_surfaces_the_service_error() {
    let upstream = Upstream::new(3);
    let calls = upstream.calls.clone();
    let mut service = ServiceBuilder::new().layer(retry(1).into_layer()).service(upstream);

    let response = service.ready().await.unwrap().call("ping").await;

    assert_eq!(response, Err(UpstreamError));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn delayed_layer_applies_the_sequence_between_attempts() {
    let sleeper = TrackingSleeper::new();
    let layer = wait_and_retry([Duration::from_millis(3), Duration::from_millis(6)])
        .into_layer()
        .with_sleeper(sleeper.clone());

    let upstream = Upstream::new(usize::MAX);
    let calls = upstream.calls.clone();
    let mut service = ServiceBuilder::new().layer(layer).service(upstream);

    let response = service.ready().await.unwrap().call("ping").await;

    assert_eq!(response, Err(UpstreamError));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.recorded(), vec![Duration::from_millis(3), Duration::from_millis(6)]);
}

#[tokio::test]
async fn successful_first_call_never_sleeps() {
    let sleeper = TrackingSleeper::new();
    let layer = wait_and_retry(2).into_layer().with_sleeper(sleeper.clone());

    let mut service = ServiceBuilder::new().layer(layer).service(Upstream::new(1));

    let response = service.ready().await.unwrap().call("ping").await;

    assert_eq!(response, Ok("ping:1".to_string()));
    assert_eq!(sleeper.calls(), 0);
}
