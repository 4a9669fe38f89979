//! Convenient re-exports for common Polly types.
pub use crate::{
    delay::{DelayGenerator, DelaySequence, DelaySpec, DEFAULT_BASE_DELAY, MAX_DELAY},
    layer::{RetryLayer, RetryService},
    retry,
    retry::RetryPolicy,
    sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper},
    wait_and_retry,
    wait_retry::WaitRetryPolicy,
    Completion,
};
