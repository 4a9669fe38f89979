#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Polly 🦜
//!
//! Plug-and-play retry policies for fallible operations: retry a bounded
//! number of times, immediately or with a delay before each attempt, across
//! three calling conventions.
//!
//! ## Policies
//!
//! - [`retry(count)`](retry()) — retry immediately, up to `count` times.
//! - [`wait_and_retry(spec)`](wait_and_retry()) — retry with a delay per
//!   attempt; delays are an explicit sequence, derived from a count by
//!   doubling, or a single default base delay.
//!
//! ## Executors
//!
//! Each policy bundles executors for the operation's calling convention:
//! synchronous (`Result`-returning), future-producing, and callback-based
//! (error-first [`Completion`] handle). Errors pass through verbatim — the
//! last failure reaches the caller in the operation's own shape, never
//! wrapped.
//!
//! ## Quick Start
//!
//! ```rust
//! use polly::{retry, wait_and_retry, InstantSleeper};
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! // Immediate retry, synchronous operation.
//! let mut calls = 0;
//! let value: Result<u32, &str> = retry(1).execute(|| {
//!     calls += 1;
//!     if calls < 2 { Err("flaky") } else { Ok(42) }
//! });
//! assert_eq!(value, Ok(42));
//!
//! // Wait-and-retry, future-producing operation.
//! let policy = wait_and_retry([Duration::from_millis(1); 3]).with_sleeper(InstantSleeper);
//! let result: Result<u32, &str> = policy
//!     .execute_future(|| async { Err("down") })
//!     .await;
//! assert_eq!(result, Err("down"));
//! # });
//! ```

pub mod delay;
pub mod layer;
mod node;
pub mod prelude;
pub mod retry;
pub mod sleeper;
mod state;
pub mod wait_retry;

// Re-exports
pub use delay::{
    base_delay, set_base_delay, DelayGenerator, DelaySequence, DelaySpec, DEFAULT_BASE_DELAY,
    MAX_DELAY,
};
pub use layer::{RetryLayer, RetryService};
pub use node::Completion;
pub use retry::RetryPolicy;
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
pub use wait_retry::WaitRetryPolicy;

/// Build an immediate-retry policy allowing `count` retries after the first
/// failure.
pub fn retry(count: usize) -> RetryPolicy {
    RetryPolicy::new(count)
}

/// Build a wait-and-retry policy from a delay spec: a count (doubling
/// derivation), an explicit sequence, or `()` for the single-base-delay
/// fallback. Counts and the fallback resolve against the process-wide
/// [`base_delay`].
pub fn wait_and_retry(spec: impl Into<DelaySpec>) -> WaitRetryPolicy {
    WaitRetryPolicy::new(spec)
}
