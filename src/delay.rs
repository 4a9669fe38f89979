//! Delay sequences for wait-and-retry policies.
//!
//! A [`DelaySequence`] is an immutable, ordered list of wait durations,
//! consumed one per retry. Sequences are either supplied verbatim, derived
//! from a count via doubling (first delay = base, each subsequent delay
//! twice the previous), or defaulted to a single base delay.
//!
//! Sequences are shared behind an `Arc` and never mutated after
//! construction; every execution walks its own cursor, so concurrent
//! executions of one policy cannot corrupt each other's remaining delays.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use polly::DelaySequence;
//!
//! let delays = DelaySequence::doubling(3, Duration::from_millis(100));
//! assert_eq!(delays.get(0), Some(Duration::from_millis(100)));
//! assert_eq!(delays.get(1), Some(Duration::from_millis(200)));
//! assert_eq!(delays.get(2), Some(Duration::from_millis(400)));
//! assert_eq!(delays.get(3), None);
//! ```
//!
//! Overflow behavior: doubling saturates at `MAX_DELAY` (1 day) instead of
//! overflowing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Base delay used when none is configured explicitly (100 ms).
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Maximum delay produced by doubling derivation (1 day).
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

// Process-wide base delay, millisecond resolution. Read once at policy
// construction; existing policies keep the sequence they resolved.
static BASE_DELAY_MS: AtomicU64 = AtomicU64::new(100);

/// Current process-wide base delay.
pub fn base_delay() -> Duration {
    Duration::from_millis(BASE_DELAY_MS.load(Ordering::SeqCst))
}

/// Override the process-wide base delay (millisecond resolution).
///
/// Affects only policies constructed afterward. This is process-wide state
/// initialized once at startup; it never needs to be reset. Prefer
/// [`WaitRetryPolicy::resolve`](crate::WaitRetryPolicy::resolve) when a
/// caller-local base is enough.
pub fn set_base_delay(delay: Duration) {
    let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    BASE_DELAY_MS.store(millis, Ordering::SeqCst);
}

/// Immutable ordered sequence of retry delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelaySequence {
    delays: Arc<[Duration]>,
}

impl DelaySequence {
    /// Build a sequence from explicit delays, used verbatim in order.
    pub fn new(delays: impl Into<Vec<Duration>>) -> Self {
        Self { delays: delays.into().into() }
    }

    /// Derive `count` delays by doubling: `[base, 2*base, 4*base, ...]`.
    ///
    /// Saturates at [`MAX_DELAY`].
    pub fn doubling(count: usize, base: Duration) -> Self {
        let mut delays = Vec::with_capacity(count);
        let mut delay = base.min(MAX_DELAY);
        for _ in 0..count {
            delays.push(delay);
            delay = delay.saturating_mul(2).min(MAX_DELAY);
        }
        Self { delays: delays.into() }
    }

    /// Number of retries this sequence allows.
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    /// Delay before the retry at `index` (0-based), if one remains.
    pub fn get(&self, index: usize) -> Option<Duration> {
        self.delays.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Duration] {
        &self.delays
    }
}

impl From<Vec<Duration>> for DelaySequence {
    fn from(delays: Vec<Duration>) -> Self {
        Self::new(delays)
    }
}

impl From<&[Duration]> for DelaySequence {
    fn from(delays: &[Duration]) -> Self {
        Self::new(delays.to_vec())
    }
}

impl<const N: usize> From<[Duration; N]> for DelaySequence {
    fn from(delays: [Duration; N]) -> Self {
        Self::new(delays.to_vec())
    }
}

/// Construction-time input for a wait-and-retry policy.
///
/// Stands in for the original duck-typed argument: a retry count (derives a
/// doubling sequence), an explicit sequence, or the fallback (a single base
/// delay, so exactly one retry). There is no strict validation; anything
/// short of a usable count or sequence degrades to the fallback silently.
#[derive(Debug, Clone, Default)]
pub enum DelaySpec {
    /// Derive a doubling sequence of this length.
    Count(usize),
    /// Use these delays verbatim, one per retry.
    Sequence(Vec<Duration>),
    /// Single base delay: one retry.
    #[default]
    Fallback,
}

impl DelaySpec {
    /// Resolve against a base delay into the concrete sequence.
    pub fn resolve(self, base: Duration) -> DelaySequence {
        match self {
            DelaySpec::Count(count) => DelaySequence::doubling(count, base),
            DelaySpec::Sequence(delays) => DelaySequence::new(delays),
            DelaySpec::Fallback => DelaySequence::new(vec![base]),
        }
    }
}

impl From<usize> for DelaySpec {
    fn from(count: usize) -> Self {
        DelaySpec::Count(count)
    }
}

impl From<Vec<Duration>> for DelaySpec {
    fn from(delays: Vec<Duration>) -> Self {
        DelaySpec::Sequence(delays)
    }
}

impl From<&[Duration]> for DelaySpec {
    fn from(delays: &[Duration]) -> Self {
        DelaySpec::Sequence(delays.to_vec())
    }
}

impl<const N: usize> From<[Duration; N]> for DelaySpec {
    fn from(delays: [Duration; N]) -> Self {
        DelaySpec::Sequence(delays.to_vec())
    }
}

impl From<DelaySequence> for DelaySpec {
    fn from(delays: DelaySequence) -> Self {
        DelaySpec::Sequence(delays.as_slice().to_vec())
    }
}

impl From<()> for DelaySpec {
    fn from(_: ()) -> Self {
        DelaySpec::Fallback
    }
}

/// Stateful alternative delay source for the future executor.
///
/// Asked for the next delay given the 1-based retry index; `None` signals
/// exhaustion and fails the execution with the last error.
pub trait DelayGenerator: Send {
    fn next_delay(&mut self, retry: usize) -> Option<Duration>;
}

impl<F> DelayGenerator for F
where
    F: FnMut(usize) -> Option<Duration> + Send,
{
    fn next_delay(&mut self, retry: usize) -> Option<Duration> {
        (self)(retry)
    }
}
