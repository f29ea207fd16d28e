//! Poll configuration.

use serde::{Deserialize, Serialize};

use crate::error::PollError;
use crate::time::PollDuration;

/// Which rejections the failure ledger keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// Every rejection, tolerated or fatal.
    #[default]
    All,
    /// Only the rejection that ended the poll.
    FatalOnly,
}

/// Settings for one poll.
///
/// Usually built through the [`Poll`](crate::Poll) builder; can also be
/// deserialized and handed to [`Poll::with_config`](crate::Poll::with_config).
///
/// ```rust
/// use nebula_poll::{PollConfig, PollDuration};
///
/// let config: PollConfig = serde_json::from_str(
///     r#"{ "interval": { "magnitude": 250, "unit": "milliseconds" },
///          "at_most": { "magnitude": 30, "unit": "seconds" },
///          "ignore_errors": true }"#,
/// ).unwrap();
///
/// assert_eq!(config.interval, PollDuration::millis(250));
/// assert!(config.validate::<()>().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Pause between the end of one attempt and the start of the next.
    pub interval: PollDuration,
    /// Give up once this much time has passed since the timer was armed.
    pub at_most: Option<PollDuration>,
    /// Keep polling until this much time has passed, even if the predicate
    /// already holds.
    pub at_least: Option<PollDuration>,
    /// Retry when the producer returns an error instead of failing.
    pub ignore_errors: bool,
    /// When the maximum duration elapses, return the last value instead of
    /// failing.
    pub return_last_on_timeout: bool,
    /// Which rejections the failure ledger keeps.
    pub history: HistoryMode,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: PollDuration::default(),
            at_most: None,
            at_least: None,
            ignore_errors: false,
            return_last_on_timeout: false,
            history: HistoryMode::All,
        }
    }
}

impl PollConfig {
    /// Check for configurations that can never accept a value.
    ///
    /// A minimum duration strictly longer than the maximum duration leaves
    /// no window in which the predicate can be accepted, unless the poll
    /// returns the last value on timeout. [`Poll::until`](crate::Poll::until)
    /// does not call this; such a poll runs until the maximum duration
    /// elapses and fails with [`RejectionKind::AtMostElapsed`](crate::RejectionKind::AtMostElapsed).
    pub fn validate<T>(&self) -> Result<(), PollError<T>> {
        if let (Some(at_least), Some(at_most)) = (self.at_least, self.at_most)
            && at_least.to_millis() > at_most.to_millis()
            && !self.return_last_on_timeout
        {
            return Err(PollError::invalid_config(format!(
                "at_least ({at_least}) is longer than at_most ({at_most})"
            )));
        }

        Ok(())
    }
}
