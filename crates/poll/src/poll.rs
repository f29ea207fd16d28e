//! The poll builder and retry loop.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::Instrument;

use crate::config::{HistoryMode, PollConfig};
use crate::error::{PollError, RejectionKind};
use crate::evaluator::{TimerState, Verdict, evaluate};
use crate::ledger::{FailureLedger, RetryRecord};
use crate::observability::{PollEvent, PollHook, PollHooks};
use crate::time::{PollDuration, TimeUnit};
use crate::timer::OneShotTimer;

/// Start building a poll around `producer`.
///
/// ```rust
/// use nebula_poll::{TimeUnit, poll};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), nebula_poll::PollError<u32>> {
/// let mut calls: u32 = 0;
/// let value = poll(|| {
///     calls += 1;
///     let n = calls;
///     async move { Ok::<_, std::io::Error>(n) }
/// })
/// .with_interval(10, TimeUnit::Milliseconds)
/// .at_most(5, TimeUnit::Seconds)
/// .until(|n| *n >= 3)
/// .await?;
///
/// assert_eq!(value, 3);
/// # Ok(())
/// # }
/// ```
pub fn poll<F>(producer: F) -> Poll<F> {
    Poll::wait(producer)
}

/// Summary of a successful poll.
#[derive(Debug, Clone)]
pub struct PollStats<T> {
    /// Producer invocations started.
    pub attempts: u64,
    /// Time spent in `until`.
    pub elapsed: Duration,
    /// The value was returned because the maximum duration elapsed.
    pub timed_out: bool,
    /// Rejections recorded before the value was accepted.
    pub history: FailureLedger<T>,
}

/// Builder and state holder for one poll.
///
/// Configuration methods consume and return the builder; [`until`](Self::until)
/// consumes it for good, so a poll runs at most once.
///
/// [`at_most`](Self::at_most) and [`at_least`](Self::at_least) arm their
/// timers when they are called, not when `until` starts.
pub struct Poll<F> {
    producer: F,
    config: PollConfig,
    at_most: Option<OneShotTimer>,
    at_least: Option<OneShotTimer>,
    hooks: PollHooks,
}

impl<F> Poll<F> {
    /// Bind a new poll to `producer` with the default configuration.
    pub fn wait(producer: F) -> Self {
        Self {
            producer,
            config: PollConfig::default(),
            at_most: None,
            at_least: None,
            hooks: PollHooks::from_env(),
        }
    }

    /// Bind a new poll to `producer` with `config`.
    ///
    /// Timers in `config` are armed now.
    pub fn with_config(producer: F, config: PollConfig) -> Self {
        Self {
            producer,
            config,
            at_most: config.at_most.map(|d| OneShotTimer::arm(d.as_duration())),
            at_least: config.at_least.map(|d| OneShotTimer::arm(d.as_duration())),
            hooks: PollHooks::from_env(),
        }
    }

    /// Pause between attempts. Default: 1000 milliseconds.
    pub fn with_interval(mut self, magnitude: u64, unit: TimeUnit) -> Self {
        self.config.interval = PollDuration::new(magnitude, unit);
        self
    }

    /// Fail once this much time has passed since this call.
    ///
    /// Calling it again re-arms the timer.
    pub fn at_most(mut self, magnitude: u64, unit: TimeUnit) -> Self {
        let duration = PollDuration::new(magnitude, unit);
        self.config.at_most = Some(duration);
        self.at_most = Some(OneShotTimer::arm(duration.as_duration()));
        self
    }

    /// Keep polling until this much time has passed since this call, even if
    /// the predicate already holds.
    ///
    /// Calling it again re-arms the timer.
    pub fn at_least(mut self, magnitude: u64, unit: TimeUnit) -> Self {
        let duration = PollDuration::new(magnitude, unit);
        self.config.at_least = Some(duration);
        self.at_least = Some(OneShotTimer::arm(duration.as_duration()));
        self
    }

    /// Retry when the producer returns an error.
    pub fn ignore_errors(mut self) -> Self {
        self.config.ignore_errors = true;
        self
    }

    /// Return the last produced value when the maximum duration elapses
    /// instead of failing.
    pub fn dont_throw_on_timeout(mut self) -> Self {
        self.config.return_last_on_timeout = true;
        self
    }

    /// Choose which rejections the failure ledger keeps.
    pub fn record_history(mut self, mode: HistoryMode) -> Self {
        self.config.history = mode;
        self
    }

    /// Add an observability hook.
    pub fn with_hook(mut self, hook: Arc<dyn PollHook>) -> Self {
        self.hooks = self.hooks.with_hook(hook);
        self
    }

    /// Current configuration.
    pub const fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll until `predicate` accepts a produced value.
    pub async fn until<T, E, Fut, P>(self, predicate: P) -> Result<T, PollError<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: Fn(&T) -> bool,
    {
        self.until_with_stats(predicate)
            .await
            .map(|(value, _stats)| value)
    }

    /// Like [`until`](Self::until), also returning attempt count, elapsed
    /// time and the tolerated rejections.
    pub async fn until_with_stats<T, E, Fut, P>(
        self,
        predicate: P,
    ) -> Result<(T, PollStats<T>), PollError<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: Fn(&T) -> bool,
    {
        let span = tracing::debug_span!(
            "poll",
            interval_ms = self.config.interval.to_millis(),
            at_most_ms = self.config.at_most.map(PollDuration::to_millis),
            at_least_ms = self.config.at_least.map(PollDuration::to_millis),
            ignore_errors = self.config.ignore_errors,
        );
        self.run(predicate).instrument(span).await
    }

    async fn run<T, E, Fut, P>(self, predicate: P) -> Result<(T, PollStats<T>), PollError<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: Fn(&T) -> bool,
    {
        let Self {
            mut producer,
            config,
            mut at_most,
            mut at_least,
            hooks,
        } = self;

        for timer in [at_most.as_mut(), at_least.as_mut()].into_iter().flatten() {
            timer.start();
        }

        hooks.emit(&PollEvent::Started {
            interval: config.interval,
            at_most: config.at_most,
            at_least: config.at_least,
            ignore_errors: config.ignore_errors,
            return_last_on_timeout: config.return_last_on_timeout,
        });

        let timer_state = |at_most: &Option<OneShotTimer>, at_least: &Option<OneShotTimer>| {
            TimerState {
                at_most_fired: at_most.as_ref().is_some_and(OneShotTimer::has_fired),
                at_least_pending: at_least.as_ref().is_some_and(|t| !t.has_fired()),
            }
        };

        let started = Instant::now();
        let interval = config.interval.as_duration();
        let mut attempts: u64 = 0;
        let mut history = FailureLedger::new();

        let outcome = loop {
            attempts += 1;
            hooks.emit(&PollEvent::Attempt { attempt: attempts });

            let (kind, detail, value) = match producer().await {
                Ok(value) => {
                    let timers = timer_state(&at_most, &at_least);
                    match evaluate(value, timers, config.return_last_on_timeout, &predicate) {
                        Verdict::Accept(value) => break Ok((value, timers.at_most_fired)),
                        Verdict::Reject(kind, value) => (kind, None, Some(value)),
                    }
                }
                Err(error) => (
                    RejectionKind::ExceptionOccurred,
                    Some(error.to_string()),
                    None,
                ),
            };

            let fatal = kind.is_fatal(config.ignore_errors);
            let record = RetryRecord::new(kind, detail, value);
            if !record_rejection(&mut history, &hooks, &config, attempts, fatal, record) {
                break Err(kind);
            }

            // A tolerated error cannot reach the evaluator, so the timeout
            // is checked here. With `dont_throw_on_timeout` the next value
            // the producer yields is accepted instead.
            if kind == RejectionKind::ExceptionOccurred
                && !config.return_last_on_timeout
                && timer_state(&at_most, &at_least).at_most_fired
            {
                let record = RetryRecord::new(RejectionKind::AtMostElapsed, None, None);
                record_rejection(&mut history, &hooks, &config, attempts, true, record);
                break Err(RejectionKind::AtMostElapsed);
            }

            sleep(interval).await;
        };

        for timer in [at_most.as_ref(), at_least.as_ref()].into_iter().flatten() {
            timer.cancel();
        }

        let elapsed = started.elapsed();
        match outcome {
            Ok((value, timed_out)) => {
                hooks.emit(&PollEvent::Succeeded {
                    attempts,
                    elapsed,
                    timed_out,
                });
                Ok((
                    value,
                    PollStats {
                        attempts,
                        elapsed,
                        timed_out,
                        history,
                    },
                ))
            }
            Err(kind) => {
                hooks.emit(&PollEvent::Failed {
                    attempts,
                    elapsed,
                    kind,
                });
                Err(PollError::Failed {
                    attempts,
                    elapsed,
                    history,
                })
            }
        }
    }
}

/// Report a rejection and append it to the ledger when the history mode
/// keeps it. Returns `false` when the rejection is fatal.
fn record_rejection<T>(
    history: &mut FailureLedger<T>,
    hooks: &PollHooks,
    config: &PollConfig,
    attempt: u64,
    fatal: bool,
    record: RetryRecord<T>,
) -> bool {
    hooks.emit(&PollEvent::Rejected {
        attempt,
        kind: record.kind,
        message: record.message.clone(),
        fatal,
    });

    if fatal || config.history == HistoryMode::All {
        history.push(record);
    }
    !fatal
}

impl<F> fmt::Debug for Poll<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poll")
            .field("config", &self.config)
            .field("at_most_fired", &self.at_most.as_ref().map(OneShotTimer::has_fired))
            .field("at_least_fired", &self.at_least.as_ref().map(OneShotTimer::has_fired))
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
