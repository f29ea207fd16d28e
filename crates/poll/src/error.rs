//! Rejection taxonomy and the terminal polling error.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ledger::{FailureLedger, RetryRecord};

/// Why an attempt was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionKind {
    /// The predicate returned `false` for a fresh value.
    ConditionNotMet,
    /// The predicate was satisfied but the minimum duration is still open.
    AtLeastNotElapsed,
    /// The maximum duration closed before the predicate was satisfied.
    AtMostElapsed,
    /// The producer returned an error.
    ExceptionOccurred,
}

impl RejectionKind {
    /// Whether a rejection of this kind ends the poll.
    ///
    /// `AtMostElapsed` never reaches this check when the poll returns the
    /// last value on timeout: the evaluator accepts instead.
    #[must_use]
    pub const fn is_fatal(self, ignore_errors: bool) -> bool {
        match self {
            Self::ConditionNotMet | Self::AtLeastNotElapsed => false,
            Self::AtMostElapsed => true,
            Self::ExceptionOccurred => !ignore_errors,
        }
    }

    /// Human-readable description recorded in the ledger.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ConditionNotMet => "condition is not met: predicate returned false",
            Self::AtLeastNotElapsed => {
                "predicate returned true but the minimum duration has not elapsed yet"
            }
            Self::AtMostElapsed => "maximum duration elapsed before the condition was met",
            Self::ExceptionOccurred => "producer returned an error",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConditionNotMet => "ConditionNotMet",
            Self::AtLeastNotElapsed => "AtLeastNotElapsed",
            Self::AtMostElapsed => "AtMostElapsed",
            Self::ExceptionOccurred => "ExceptionOccurred",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by [`Poll::until`](crate::Poll::until).
///
/// Intermediate rejections never reach the caller on their own; they are
/// collected in the [`FailureLedger`] carried by [`PollError::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum PollError<T> {
    /// A fatal rejection ended the poll.
    #[error("polling failed after {attempts} attempt(s) in {elapsed:?}: {history}")]
    Failed {
        /// Producer invocations started.
        attempts: u64,
        /// Time from the start of `until` to the fatal rejection.
        elapsed: Duration,
        /// Every recorded rejection, oldest first. The last entry is the
        /// fatal one.
        history: FailureLedger<T>,
    },

    /// The configuration can never produce an accepted value.
    #[error("invalid poll configuration: {message}")]
    InvalidConfig {
        /// What is wrong.
        message: String,
    },
}

/// Result type for polling operations.
pub type PollResult<T> = Result<T, PollError<T>>;

impl<T> PollError<T> {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Attempts made before failing; zero for configuration errors.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        match self {
            Self::Failed { attempts, .. } => *attempts,
            Self::InvalidConfig { .. } => 0,
        }
    }

    /// Recorded rejections, if the poll ran at all.
    #[must_use]
    pub fn history(&self) -> Option<&FailureLedger<T>> {
        match self {
            Self::Failed { history, .. } => Some(history),
            Self::InvalidConfig { .. } => None,
        }
    }

    /// Take ownership of the recorded rejections.
    #[must_use]
    pub fn into_history(self) -> Option<FailureLedger<T>> {
        match self {
            Self::Failed { history, .. } => Some(history),
            Self::InvalidConfig { .. } => None,
        }
    }

    /// The rejection that ended the poll.
    #[must_use]
    pub fn last_rejection(&self) -> Option<&RetryRecord<T>> {
        self.history().and_then(FailureLedger::last)
    }

    /// Whether the maximum duration ended the poll.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.last_rejection()
            .is_some_and(|record| record.kind == RejectionKind::AtMostElapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RejectionKind::ConditionNotMet, false, false)]
    #[case(RejectionKind::ConditionNotMet, true, false)]
    #[case(RejectionKind::AtLeastNotElapsed, false, false)]
    #[case(RejectionKind::AtMostElapsed, false, true)]
    #[case(RejectionKind::AtMostElapsed, true, true)]
    #[case(RejectionKind::ExceptionOccurred, false, true)]
    #[case(RejectionKind::ExceptionOccurred, true, false)]
    fn fatality_follows_policy(
        #[case] kind: RejectionKind,
        #[case] ignore_errors: bool,
        #[case] fatal: bool,
    ) {
        assert_eq!(kind.is_fatal(ignore_errors), fatal);
    }

    #[test]
    fn invalid_config_display() {
        let err = PollError::<()>::invalid_config("at_least exceeds at_most");
        assert_eq!(
            err.to_string(),
            "invalid poll configuration: at_least exceeds at_most"
        );
        assert_eq!(err.attempts(), 0);
        assert!(err.history().is_none());
        assert!(!err.is_timeout());
    }

    #[test]
    fn failed_reports_attempts_and_last_kind() {
        let mut history = FailureLedger::new();
        history.record(RejectionKind::ConditionNotMet, None, Some(1));
        history.record(RejectionKind::AtMostElapsed, None, Some(2));

        let err = PollError::Failed {
            attempts: 2,
            elapsed: Duration::from_millis(1_000),
            history,
        };

        assert_eq!(err.attempts(), 2);
        assert!(err.is_timeout());
        let message = err.to_string();
        assert!(message.starts_with("polling failed after 2 attempt(s)"));
        assert!(message.contains("AtMostElapsed"));
        assert_eq!(err.into_history().map(|h| h.len()), Some(2));
    }
}
