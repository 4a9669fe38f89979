//! Tower middleware for retry policies.
//!
//! Wraps a [`tower_service::Service`] so every call is driven by a retry
//! policy: the request is cloned per attempt and the final inner error is
//! returned verbatim — callers see the service's own error type, not a
//! wrapper.

use crate::delay::DelaySequence;
use crate::sleeper::{Sleeper, TokioSleeper};
use crate::state::{AttemptState, Execution};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tower_layer::Layer;
use tower_service::Service;

#[derive(Debug, Clone)]
enum LayerBudget {
    Immediate { max_retries: usize },
    Delays(DelaySequence),
}

/// Layer applying a retry policy to a wrapped service.
///
/// Built via [`RetryPolicy::into_layer`](crate::RetryPolicy::into_layer) or
/// [`WaitRetryPolicy::into_layer`](crate::WaitRetryPolicy::into_layer).
#[derive(Clone)]
pub struct RetryLayer {
    budget: LayerBudget,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryLayer {
    pub(crate) fn immediate(max_retries: usize) -> Self {
        Self { budget: LayerBudget::Immediate { max_retries }, sleeper: Arc::new(TokioSleeper) }
    }

    pub(crate) fn delayed(delays: DelaySequence, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { budget: LayerBudget::Delays(delays), sleeper }
    }

    /// Swap the timer implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    fn execution(&self) -> Execution {
        match &self.budget {
            LayerBudget::Immediate { max_retries } => Execution::immediate(*max_retries),
            LayerBudget::Delays(delays) => Execution::sequenced(delays.clone()),
        }
    }
}

impl fmt::Debug for RetryLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryLayer")
            .field("budget", &self.budget)
            .field("sleeper", &self.sleeper)
            .finish()
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService { inner, layer: self.clone() }
    }
}

/// Service produced by [`RetryLayer`].
#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    layer: RetryLayer,
}

impl<S, Request> Service<Request> for RetryService<S>
where
    Request: Clone + Send + 'static,
    S: Service<Request> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let layer = self.layer.clone();
        let mut inner = self.inner.clone();
        Box::pin(async move {
            let mut run = layer.execution();
            loop {
                match inner.call(req.clone()).await {
                    Ok(response) => return Ok(response),
                    Err(error) => match run.report_failure() {
                        AttemptState::Pending => {
                            tracing::trace!(attempt = run.attempt(), "retrying immediately");
                        }
                        AttemptState::Scheduled(delay) => {
                            tracing::debug!(attempt = run.attempt(), ?delay, "retry scheduled");
                            layer.sleeper.sleep(delay).await;
                        }
                        AttemptState::Settled => return Err(error),
                    },
                }
            }
        })
    }
}
