//! Per-execution attempt state machine.
//!
//! Every executor call owns one [`Execution`]: an attempt index plus a retry
//! budget, stepped by reporting each attempt's outcome. The machine decides
//! whether the next attempt runs immediately (`Pending`), after a delay
//! (`Scheduled`), or not at all (`Settled`). Keeping the cursor here, not on
//! the policy, is what makes concurrent executions of one policy safe.

use crate::delay::{DelayGenerator, DelaySequence};
use std::time::Duration;

/// What the execution does next after an attempt settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttemptState {
    /// Retry immediately, no timer involved.
    Pending,
    /// Retry after the given delay elapses.
    Scheduled(Duration),
    /// Done: surface the last outcome to the caller.
    Settled,
}

#[derive(Debug)]
enum RetryBudget {
    /// Up to `max_retries` immediate retries after the first failure.
    Immediate { max_retries: usize },
    /// One delay per retry, consumed front to back via a private cursor.
    Sequence { delays: DelaySequence, cursor: usize },
    /// Delays come from an external generator, bounded by `limit` retries.
    Generator { limit: usize },
}

/// Transient state for a single execution of a policy.
#[derive(Debug)]
pub(crate) struct Execution {
    attempt: usize,
    budget: RetryBudget,
    state: AttemptState,
}

impl Execution {
    pub(crate) fn immediate(max_retries: usize) -> Self {
        Self::with_budget(RetryBudget::Immediate { max_retries })
    }

    pub(crate) fn sequenced(delays: DelaySequence) -> Self {
        Self::with_budget(RetryBudget::Sequence { delays, cursor: 0 })
    }

    pub(crate) fn generated(limit: usize) -> Self {
        Self::with_budget(RetryBudget::Generator { limit })
    }

    fn with_budget(budget: RetryBudget) -> Self {
        Self { attempt: 0, budget, state: AttemptState::Pending }
    }

    /// Failed attempts so far.
    pub(crate) fn attempt(&self) -> usize {
        self.attempt
    }

    pub(crate) fn report_success(&mut self) {
        self.state = AttemptState::Settled;
    }

    /// Record a failed attempt and decide what happens next.
    pub(crate) fn report_failure(&mut self) -> AttemptState {
        debug_assert!(self.state != AttemptState::Settled, "execution already settled");
        self.attempt += 1;
        self.state = match &mut self.budget {
            RetryBudget::Immediate { max_retries } => {
                if self.attempt <= *max_retries {
                    AttemptState::Pending
                } else {
                    AttemptState::Settled
                }
            }
            RetryBudget::Sequence { delays, cursor } => match delays.get(*cursor) {
                Some(delay) => {
                    *cursor += 1;
                    AttemptState::Scheduled(delay)
                }
                None => AttemptState::Settled,
            },
            // Generator budgets are driven through `report_failure_with`.
            RetryBudget::Generator { .. } => AttemptState::Settled,
        };
        self.state
    }

    /// Record a failed attempt, asking `generator` for the next delay.
    ///
    /// The retry index handed to the generator is 1-based. The execution
    /// settles once the index exceeds the budget's limit or the generator
    /// signals exhaustion, whichever comes first.
    pub(crate) fn report_failure_with(
        &mut self,
        generator: &mut dyn DelayGenerator,
    ) -> AttemptState {
        match &self.budget {
            RetryBudget::Generator { limit } => {
                debug_assert!(self.state != AttemptState::Settled, "execution already settled");
                self.attempt += 1;
                self.state = if self.attempt > *limit {
                    AttemptState::Settled
                } else {
                    match generator.next_delay(self.attempt) {
                        Some(delay) => AttemptState::Scheduled(delay),
                        None => AttemptState::Settled,
                    }
                };
                self.state
            }
            _ => self.report_failure(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_budget_allows_exactly_max_retries() {
        let mut run = Execution::immediate(2);
        assert_eq!(run.report_failure(), AttemptState::Pending);
        assert_eq!(run.report_failure(), AttemptState::Pending);
        assert_eq!(run.report_failure(), AttemptState::Settled);
        assert_eq!(run.attempt(), 3);
    }

    #[test]
    fn zero_retries_settles_on_first_failure() {
        let mut run = Execution::immediate(0);
        assert_eq!(run.report_failure(), AttemptState::Settled);
    }

    #[test]
    fn sequence_budget_schedules_each_delay_in_order() {
        let delays =
            DelaySequence::from([Duration::from_millis(10), Duration::from_millis(20)]);
        let mut run = Execution::sequenced(delays);
        assert_eq!(run.report_failure(), AttemptState::Scheduled(Duration::from_millis(10)));
        assert_eq!(run.report_failure(), AttemptState::Scheduled(Duration::from_millis(20)));
        assert_eq!(run.report_failure(), AttemptState::Settled);
    }

    #[test]
    fn executions_do_not_share_cursors() {
        // Two executions over one shared sequence each get the full budget.
        let delays = DelaySequence::doubling(3, Duration::from_millis(1));
        let mut first = Execution::sequenced(delays.clone());
        let mut second = Execution::sequenced(delays);

        for _ in 0..3 {
            assert!(matches!(first.report_failure(), AttemptState::Scheduled(_)));
        }
        assert_eq!(first.report_failure(), AttemptState::Settled);

        for _ in 0..3 {
            assert!(matches!(second.report_failure(), AttemptState::Scheduled(_)));
        }
        assert_eq!(second.report_failure(), AttemptState::Settled);
    }

    #[test]
    fn generator_budget_uses_one_based_retry_index() {
        let mut seen = Vec::new();
        let mut generator = |retry: usize| {
            seen.push(retry);
            Some(Duration::from_millis(1))
        };
        let mut run = Execution::generated(3);
        assert!(matches!(run.report_failure_with(&mut generator), AttemptState::Scheduled(_)));
        assert!(matches!(run.report_failure_with(&mut generator), AttemptState::Scheduled(_)));
        assert!(matches!(run.report_failure_with(&mut generator), AttemptState::Scheduled(_)));
        assert_eq!(run.report_failure_with(&mut generator), AttemptState::Settled);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn generator_exhaustion_settles_early() {
        let mut generator = |retry: usize| {
            if retry < 2 {
                Some(Duration::from_millis(1))
            } else {
                None
            }
        };
        let mut run = Execution::generated(5);
        assert!(matches!(run.report_failure_with(&mut generator), AttemptState::Scheduled(_)));
        assert_eq!(run.report_failure_with(&mut generator), AttemptState::Settled);
    }

    #[test]
    fn success_settles_without_touching_budget() {
        let mut run = Execution::sequenced(DelaySequence::doubling(2, Duration::from_millis(1)));
        run.report_success();
        assert_eq!(run.attempt(), 0);
    }
}
