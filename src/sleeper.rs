//! Host timer facility.
//!
//! Wait-and-retry executors reach the timer only through [`Sleeper`], so
//! tests assert on scheduled delays without waiting for them. Production
//! uses [`TokioSleeper`]; tests inject [`InstantSleeper`] or
//! [`TrackingSleeper`].

use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Abstraction over waiting for a delay to elapse.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Test sleeper that completes immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

/// Test sleeper that records every requested delay and never waits.
#[derive(Debug, Default, Clone)]
pub struct TrackingSleeper {
    recorded: Arc<Mutex<Vec<Duration>>>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sleeps requested so far.
    pub fn calls(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }

    /// Delay requested by the `index`-th sleep, if it happened.
    pub fn call_at(&self, index: usize) -> Option<Duration> {
        self.recorded.lock().unwrap().get(index).copied()
    }

    /// All requested delays, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.recorded.lock().unwrap().clear();
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.recorded.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn instant_sleeper_returns_immediately() {
        let start = std::time::Instant::now();
        InstantSleeper.sleep(Duration::from_secs(10)).await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn tracking_sleeper_records_in_order() {
        let sleeper = TrackingSleeper::new();
        sleeper.sleep(Duration::from_millis(1)).await;
        sleeper.sleep(Duration::from_millis(2)).await;
        sleeper.sleep(Duration::from_millis(4)).await;

        assert_eq!(sleeper.calls(), 3);
        assert_eq!(sleeper.call_at(0), Some(Duration::from_millis(1)));
        assert_eq!(sleeper.call_at(2), Some(Duration::from_millis(4)));
        assert_eq!(sleeper.call_at(3), None);
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(1), Duration::from_millis(2), Duration::from_millis(4)]
        );
    }

    #[tokio::test]
    async fn tracking_sleeper_clears() {
        let sleeper = TrackingSleeper::new();
        sleeper.sleep(Duration::from_millis(3)).await;
        sleeper.clear();
        assert_eq!(sleeper.calls(), 0);
    }

    #[tokio::test]
    async fn tokio_sleeper_waits_for_the_duration() {
        let start = std::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(50)).await;
        // Small tolerance for timer granularity.
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
