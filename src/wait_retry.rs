//! Wait-and-retry policy.
//!
//! Retries with a delay before each attempt. Delays come from the policy's
//! [`DelaySequence`] — supplied verbatim, derived from a count by doubling,
//! or defaulted to a single base delay — or, for the future executor only,
//! from an attached [`DelayGenerator`]. The sequence on the policy is
//! immutable; every execution walks a private cursor, so one policy value
//! can drive any number of concurrent executions.
//!
//! Delays are applied through the policy's [`Sleeper`]: production uses the
//! tokio timer, tests swap in `InstantSleeper`/`TrackingSleeper`.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use polly::{wait_and_retry, InstantSleeper};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = wait_and_retry([Duration::from_millis(1); 2]).with_sleeper(InstantSleeper);
//! let mut calls = 0;
//! let result: Result<u32, &str> = policy
//!     .execute_future(|| {
//!         calls += 1;
//!         let outcome = if calls < 2 { Err("flaky") } else { Ok(42) };
//!         async move { outcome }
//!     })
//!     .await;
//! assert_eq!(result, Ok(42));
//! # });
//! ```

use crate::delay::{base_delay, DelayGenerator, DelaySequence, DelaySpec};
use crate::layer::RetryLayer;
use crate::node::{self, Completion};
use crate::sleeper::{Sleeper, TokioSleeper};
use crate::state::{AttemptState, Execution};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Policy that waits before every retry.
pub struct WaitRetryPolicy {
    delays: DelaySequence,
    generator: Option<Arc<Mutex<dyn DelayGenerator>>>,
    sleeper: Arc<dyn Sleeper>,
}

impl WaitRetryPolicy {
    /// Build from a delay spec, resolving counts and the fallback against
    /// the process-wide [`base_delay`](crate::base_delay).
    pub fn new(spec: impl Into<DelaySpec>) -> Self {
        Self::resolve(spec, base_delay())
    }

    /// Build from a delay spec with an explicit base delay, bypassing the
    /// process-wide default entirely.
    pub fn resolve(spec: impl Into<DelaySpec>, base: Duration) -> Self {
        Self {
            delays: spec.into().resolve(base),
            generator: None,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// The configured delay sequence.
    pub fn delays(&self) -> &DelaySequence {
        &self.delays
    }

    /// Attach a delay generator.
    ///
    /// Overrides the fixed sequence for [`execute_future`] only; the
    /// sequence's length still bounds the number of retries, and the
    /// callback executor keeps consuming the fixed sequence.
    ///
    /// [`execute_future`]: WaitRetryPolicy::execute_future
    pub fn with_generator<G>(mut self, generator: G) -> Self
    where
        G: DelayGenerator + 'static,
    {
        self.generator = Some(Arc::new(Mutex::new(generator)));
        self
    }

    /// Swap the timer implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Execute a future-producing operation, waiting before each retry.
    ///
    /// On rejection the next delay is taken from this execution's cursor
    /// (or the attached generator); once no delay remains the last
    /// rejection is returned unchanged. Attempts are strictly sequential.
    pub async fn execute_future<T, E, Fut, Op>(&self, mut operation: Op) -> Result<T, E>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        if let Some(generator) = &self.generator {
            let mut run = Execution::generated(self.delays.len());
            loop {
                match operation().await {
                    Ok(value) => return Ok(value),
                    Err(error) => {
                        let next = {
                            let mut generator =
                                generator.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                            run.report_failure_with(&mut *generator)
                        };
                        match next {
                            AttemptState::Scheduled(delay) => {
                                tracing::debug!(
                                    attempt = run.attempt(),
                                    ?delay,
                                    "retry scheduled from generator"
                                );
                                self.sleeper.sleep(delay).await;
                            }
                            _ => return Err(error),
                        }
                    }
                }
            }
        }

        let mut run = Execution::sequenced(self.delays.clone());
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => match run.report_failure() {
                    AttemptState::Scheduled(delay) => {
                        tracing::debug!(attempt = run.attempt(), ?delay, "retry scheduled");
                        self.sleeper.sleep(delay).await;
                    }
                    _ => return Err(error),
                },
            }
        }
    }

    /// Execute a callback-style operation, waiting before each retry.
    ///
    /// `on_settled` is invoked exactly once: with the first no-error report,
    /// or with the last error-first pair once the delays are spent.
    pub async fn execute_node<T, E, Op, Done>(&self, mut operation: Op, on_settled: Done)
    where
        Op: FnMut(Completion<T, E>) + Send,
        Done: FnOnce(Option<E>, Option<T>),
    {
        let mut run = Execution::sequenced(self.delays.clone());
        loop {
            let (completion, rx) = Completion::channel();
            operation(completion);
            let (error, value) = node::await_report(rx).await;
            if error.is_some() {
                if let AttemptState::Scheduled(delay) = run.report_failure() {
                    tracing::debug!(attempt = run.attempt(), ?delay, "retry scheduled");
                    self.sleeper.sleep(delay).await;
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
    ///
    /// The layer consumes the fixed sequence; an attached generator does
    /// not carry over.
    pub fn into_layer(&self) -> RetryLayer {
        RetryLayer::delayed(self.delays.clone(), self.sleeper.clone())
    }
}

impl Clone for WaitRetryPolicy {
    fn clone(&self) -> Self {
        Self {
            delays: self.delays.clone(),
            generator: self.generator.clone(),
            sleeper: self.sleeper.clone(),
        }
    }
}

impl std::fmt::Debug for WaitRetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitRetryPolicy")
            .field("delays", &self.delays)
            .field("generator", &self.generator.as_ref().map(|_| "<generator>"))
            .field("sleeper", &self.sleeper)
            .finish()
    }
}
