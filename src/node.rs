//! Error-first completion plumbing for callback-style operations.

use tokio::sync::oneshot;

/// One attempt's outcome, error first.
pub(crate) type Report<T, E> = (Option<E>, Option<T>);

/// Handle a callback-style operation uses to report one attempt's outcome.
///
/// Consumed on use, so an attempt reports at most once. An operation that
/// drops the handle without reporting settles the attempt with no error and
/// no value.
#[derive(Debug)]
pub struct Completion<T, E> {
    tx: oneshot::Sender<Report<T, E>>,
}

impl<T, E> Completion<T, E> {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Report<T, E>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Report the outcome node-style: error first, value second.
    ///
    /// Both halves are passed through to the executor untouched; on
    /// exhaustion the final pair reaches the settlement callback verbatim.
    pub fn settle(self, error: Option<E>, value: Option<T>) {
        // The receiver is only gone if the execution was dropped mid-flight;
        // there is nobody left to notify.
        let _ = self.tx.send((error, value));
    }

    /// Report success with a value.
    pub fn ok(self, value: T) {
        self.settle(None, Some(value));
    }

    /// Report failure with an error.
    pub fn err(self, error: E) {
        self.settle(Some(error), None);
    }
}

/// Wait for an attempt's report; a dropped handle reads as `(None, None)`.
pub(crate) async fn await_report<T, E>(rx: oneshot::Receiver<Report<T, E>>) -> Report<T, E> {
    rx.await.unwrap_or((None, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ok_reports_value_without_error() {
        let (completion, rx) = Completion::<u32, &str>::channel();
        completion.ok(7);
        assert_eq!(await_report(rx).await, (None, Some(7)));
    }

    #[tokio::test]
    async fn err_reports_error_without_value() {
        let (completion, rx) = Completion::<u32, &str>::channel();
        completion.err("boom");
        assert_eq!(await_report(rx).await, (Some("boom"), None));
    }

    #[tokio::test]
    async fn settle_passes_both_halves_through() {
        let (completion, rx) = Completion::<u32, &str>::channel();
        completion.settle(Some("boom"), Some(3));
        assert_eq!(await_report(rx).await, (Some("boom"), Some(3)));
    }

    #[tokio::test]
    async fn dropped_handle_reads_as_empty_report() {
        let (completion, rx) = Completion::<u32, &str>::channel();
        drop(completion);
        assert_eq!(await_report(rx).await, (None, None));
    }
}
