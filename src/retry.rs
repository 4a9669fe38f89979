//! Immediate retry policy.
//!
//! Retries a failing operation right away, with no delay, up to the
//! configured number of times. Errors pass through verbatim: while retries
//! remain a failure is swallowed; once the budget is spent the most recent
//! error is returned unchanged, never wrapped or aggregated.
//!
//! Example
//! ```rust
//! use polly::retry;
//!
//! let mut calls = 0;
//! let result: Result<u32, &str> = retry(1).execute(|| {
//!     calls += 1;
//!     if calls < 2 { Err("flaky") } else { Ok(42) }
//! });
//! assert_eq!(result, Ok(42));
//! assert_eq!(calls, 2);
//! ```

use crate::layer::RetryLayer;
use crate::node::{self, Completion};
use crate::state::{AttemptState, Execution};
use std::future::Future;

/// Policy that retries immediately up to `max_retries` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: usize,
}

impl RetryPolicy {
    /// Allow `max_retries` additional attempts after the first failure.
    ///
    /// Zero means a single attempt with no retry.
    pub fn new(max_retries: usize) -> Self {
        Self { max_retries }
    }

    /// Retries allowed after the first failure.
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Execute a synchronous operation, retrying in-stack on failure.
    ///
    /// Blocks the caller until the operation succeeds or the budget is
    /// spent; the last error is returned unchanged.
    pub fn execute<T, E, Op>(&self, mut operation: Op) -> Result<T, E>
    where
        Op: FnMut() -> Result<T, E>,
    {
        let mut run = Execution::immediate(self.max_retries);
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) => match run.report_failure() {
                    AttemptState::Pending => {
                        tracing::trace!(attempt = run.attempt(), "retrying immediately");
                    }
                    _ => return Err(error),
                },
            }
        }
    }

    /// Execute a future-producing operation, retrying on rejection.
    ///
    /// Attempts are strictly sequential: a re-invocation never starts
    /// before the previous future has settled.
    pub async fn execute_future<T, E, Fut, Op>(&self, mut operation: Op) -> Result<T, E>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        let mut run = Execution::immediate(self.max_retries);
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => match run.report_failure() {
                    AttemptState::Pending => {
                        tracing::trace!(attempt = run.attempt(), "retrying immediately");
                    }
                    _ => return Err(error),
                },
            }
        }
    }

    /// Execute a callback-style operation, retrying on error reports.
    ///
    /// `operation` receives a fresh [`Completion`] per attempt; `on_settled`
    /// is invoked exactly once with the final error-first pair. On
    /// exhaustion the last error and last value are forwarded together,
    /// even when both are present.
    pub async fn execute_node<T, E, Op, Done>(&self, mut operation: Op, on_settled: Done)
    where
        Op: FnMut(Completion<T, E>) + Send,
        Done: FnOnce(Option<E>, Option<T>),
    {
        let mut run = Execution::immediate(self.max_retries);
        loop {
            let (completion, rx) = Completion::channel();
            operation(completion);
            let (error, value) = node::await_report(rx).await;
            if error.is_some() {
                if let AttemptState::Pending = run.report_failure() {
                    tracing::trace!(attempt = run.attempt(), "retrying immediately");
                    continue;
                }
            } else {
                run.report_success();
            }
            on_settled(error, value);
            return;
        }
    }

    /// Expose this policy as a `tower` middleware layer.
    pub fn into_layer(self) -> RetryLayer {
        RetryLayer::immediate(self.max_retries)
    }
}
