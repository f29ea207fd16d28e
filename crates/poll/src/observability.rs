//! Progress events emitted while polling.
//!
//! Hooks receive a [`PollEvent`] at the start of a poll, before every
//! attempt, on every rejection, and when the poll concludes. The
//! [`LoggingHook`] forwards them to `tracing`; it is installed by default
//! when the `DEBUG` environment variable lists `nebula-poll`:
//!
//! ```text
//! DEBUG=nebula-poll cargo run
//! DEBUG=nebula-http,nebula-poll cargo run
//! DEBUG=* cargo run
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::error::RejectionKind;
use crate::time::PollDuration;

/// Environment variable that enables the debug sink.
pub const DEBUG_ENV: &str = "DEBUG";

/// Value of [`DEBUG_ENV`] that enables the debug sink for this crate.
pub const DEBUG_TARGET: &str = "nebula-poll";

/// Whether the debug sink is enabled by the environment.
///
/// The variable is read once per process.
pub fn debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var(DEBUG_ENV)
            .map(|value| debug_value_matches(&value))
            .unwrap_or(false)
    })
}

fn debug_value_matches(value: &str) -> bool {
    value
        .split(',')
        .map(str::trim)
        .any(|target| target == "*" || target == DEBUG_TARGET)
}

/// Events that occur during one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// `until` started.
    Started {
        /// Pause between attempts.
        interval: PollDuration,
        /// Maximum duration, if configured.
        at_most: Option<PollDuration>,
        /// Minimum duration, if configured.
        at_least: Option<PollDuration>,
        /// Whether producer errors are tolerated.
        ignore_errors: bool,
        /// Whether a timeout returns the last value.
        return_last_on_timeout: bool,
    },
    /// The producer is about to be invoked.
    Attempt {
        /// Attempt number (1-based).
        attempt: u64,
    },
    /// An attempt was rejected.
    Rejected {
        /// Attempt number (1-based).
        attempt: u64,
        /// Classification.
        kind: RejectionKind,
        /// Ledger message.
        message: String,
        /// Whether the rejection ends the poll.
        fatal: bool,
    },
    /// A value was accepted.
    Succeeded {
        /// Attempts made.
        attempts: u64,
        /// Time spent in `until`.
        elapsed: Duration,
        /// The value was returned because the maximum duration elapsed.
        timed_out: bool,
    },
    /// The poll failed.
    Failed {
        /// Attempts made.
        attempts: u64,
        /// Time spent in `until`.
        elapsed: Duration,
        /// The fatal classification.
        kind: RejectionKind,
    },
}

impl fmt::Display for PollEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                interval,
                at_most,
                at_least,
                ignore_errors,
                return_last_on_timeout,
            } => {
                write!(f, "polling started (interval {interval}")?;
                if let Some(at_most) = at_most {
                    write!(f, ", at most {at_most}")?;
                }
                if let Some(at_least) = at_least {
                    write!(f, ", at least {at_least}")?;
                }
                write!(
                    f,
                    ", ignore errors: {ignore_errors}, return last on timeout: {return_last_on_timeout})"
                )
            }
            Self::Attempt { attempt } => write!(f, "invoking producer, attempt {attempt}"),
            Self::Rejected {
                attempt,
                kind,
                message,
                fatal,
            } => {
                let verdict = if *fatal { "giving up" } else { "retrying" };
                write!(f, "attempt {attempt} rejected ({kind}): {message}; {verdict}")
            }
            Self::Succeeded {
                attempts,
                elapsed,
                timed_out,
            } => {
                if *timed_out {
                    write!(
                        f,
                        "polling timed out after {attempts} attempt(s) in {elapsed:?}, returning last value"
                    )
                } else {
                    write!(
                        f,
                        "polling succeeded after {attempts} attempt(s) in {elapsed:?}"
                    )
                }
            }
            Self::Failed {
                attempts,
                elapsed,
                kind,
            } => write!(
                f,
                "polling failed after {attempts} attempt(s) in {elapsed:?}: {kind}"
            ),
        }
    }
}

/// Receives poll events.
pub trait PollHook: Send + Sync {
    /// Called for every event, in order.
    fn on_event(&self, event: &PollEvent);
}

/// Collection of hooks.
#[derive(Default, Clone)]
pub struct PollHooks {
    hooks: Arc<Vec<Arc<dyn PollHook>>>,
}

impl PollHooks {
    /// Empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks installed when nothing is configured: a debug-level
    /// [`LoggingHook`] if [`debug_enabled`], otherwise none.
    #[must_use]
    pub fn from_env() -> Self {
        if debug_enabled() {
            Self::new().with_hook(Arc::new(LoggingHook::new(LogLevel::Debug)))
        } else {
            Self::new()
        }
    }

    /// Add a hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn PollHook>) -> Self {
        Arc::make_mut(&mut self.hooks).push(hook);
        self
    }

    /// Emit an event to all hooks.
    pub fn emit(&self, event: &PollEvent) {
        for hook in self.hooks.iter() {
            hook.on_event(event);
        }
    }

    /// Number of installed hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for PollHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollHooks")
            .field("len", &self.hooks.len())
            .finish()
    }
}

/// Log level used by [`LoggingHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

/// Writes every event through `tracing`.
///
/// Rejections that end the poll and failures are always logged at `warn`
/// or above.
#[derive(Debug, Clone, Copy)]
pub struct LoggingHook {
    level: LogLevel,
}

impl LoggingHook {
    /// Create a hook logging at `level`.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }
}

impl Default for LoggingHook {
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

impl PollHook for LoggingHook {
    fn on_event(&self, event: &PollEvent) {
        let level = match event {
            PollEvent::Rejected { fatal: true, .. } | PollEvent::Failed { .. } => {
                match self.level {
                    LogLevel::Error => LogLevel::Error,
                    _ => LogLevel::Warn,
                }
            }
            _ => self.level,
        };

        match level {
            LogLevel::Error => tracing::error!(target: "nebula_poll", "{event}"),
            LogLevel::Warn => tracing::warn!(target: "nebula_poll", "{event}"),
            LogLevel::Info => tracing::info!(target: "nebula_poll", "{event}"),
            LogLevel::Debug => tracing::debug!(target: "nebula_poll", "{event}"),
            LogLevel::Trace => tracing::trace!(target: "nebula_poll", "{event}"),
        }
    }
}
