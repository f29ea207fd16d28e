//! Decides whether a produced value ends the poll.

use crate::error::RejectionKind;

/// Timer flags observed right after a producer call completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerState {
    /// The maximum-duration timer has fired.
    pub at_most_fired: bool,
    /// The minimum-duration timer is armed and has not fired yet.
    pub at_least_pending: bool,
}

/// Outcome of evaluating one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<T> {
    /// Return the value to the caller.
    Accept(T),
    /// Keep polling or fail, depending on the kind.
    Reject(RejectionKind, T),
}

/// Evaluate `value` against the timers and the predicate.
///
/// First match wins:
/// 1. maximum duration elapsed: accept when `return_last_on_timeout`,
///    otherwise [`RejectionKind::AtMostElapsed`];
/// 2. predicate false: [`RejectionKind::ConditionNotMet`];
/// 3. minimum duration still open: [`RejectionKind::AtLeastNotElapsed`];
/// 4. accept.
pub fn evaluate<T, P>(
    value: T,
    timers: TimerState,
    return_last_on_timeout: bool,
    predicate: &P,
) -> Verdict<T>
where
    P: Fn(&T) -> bool + ?Sized,
{
    if timers.at_most_fired {
        return if return_last_on_timeout {
            Verdict::Accept(value)
        } else {
            Verdict::Reject(RejectionKind::AtMostElapsed, value)
        };
    }

    if !predicate(&value) {
        return Verdict::Reject(RejectionKind::ConditionNotMet, value);
    }

    if timers.at_least_pending {
        return Verdict::Reject(RejectionKind::AtLeastNotElapsed, value);
    }

    Verdict::Accept(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rejection<T>(verdict: &Verdict<T>) -> Option<RejectionKind> {
        match verdict {
            Verdict::Accept(_) => None,
            Verdict::Reject(kind, _) => Some(*kind),
        }
    }

    const fn timers(at_most_fired: bool, at_least_pending: bool) -> TimerState {
        TimerState {
            at_most_fired,
            at_least_pending,
        }
    }

    #[rstest]
    // no timers
    #[case(timers(false, false), false, true, None)]
    #[case(timers(false, false), false, false, Some(RejectionKind::ConditionNotMet))]
    // at_most fired wins over everything
    #[case(timers(true, false), false, true, Some(RejectionKind::AtMostElapsed))]
    #[case(timers(true, true), false, false, Some(RejectionKind::AtMostElapsed))]
    #[case(timers(true, true), true, false, None)]
    #[case(timers(true, false), true, true, None)]
    // at_least only matters once the predicate holds
    #[case(timers(false, true), false, false, Some(RejectionKind::ConditionNotMet))]
    #[case(timers(false, true), false, true, Some(RejectionKind::AtLeastNotElapsed))]
    #[case(timers(false, true), true, true, Some(RejectionKind::AtLeastNotElapsed))]
    fn evaluation_order(
        #[case] state: TimerState,
        #[case] return_last_on_timeout: bool,
        #[case] predicate_holds: bool,
        #[case] expected: Option<RejectionKind>,
    ) {
        let verdict = evaluate(42, state, return_last_on_timeout, &|_: &i32| predicate_holds);
        assert_eq!(rejection(&verdict), expected);
        assert_eq!(matches!(verdict, Verdict::Accept(42)), expected.is_none());
    }

    #[test]
    fn verdict_keeps_the_value() {
        let pred = |v: &String| v == "foo";
        assert_eq!(
            evaluate("foo".to_owned(), TimerState::default(), false, &pred),
            Verdict::Accept("foo".to_owned())
        );
        assert_eq!(
            evaluate("bar".to_owned(), TimerState::default(), false, &pred),
            Verdict::Reject(RejectionKind::ConditionNotMet, "bar".to_owned())
        );
    }

    #[test]
    fn predicate_not_called_after_timeout() {
        let called = std::cell::Cell::new(false);
        let pred = |_: &u8| {
            called.set(true);
            true
        };
        let _ = evaluate(1, timers(true, false), false, &pred);
        assert!(!called.get());
    }
}
