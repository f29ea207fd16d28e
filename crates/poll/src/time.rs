//! Durations expressed as a magnitude plus a unit.
//!
//! Builder methods take `(magnitude, unit)` pairs; everything below the
//! builder works in milliseconds.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unit of a [`PollDuration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// 1 ms
    Milliseconds,
    /// 1 000 ms
    Seconds,
    /// 60 000 ms
    Minutes,
}

impl TimeUnit {
    /// Milliseconds in one unit.
    #[must_use]
    pub const fn multiplier(self) -> u64 {
        match self {
            Self::Milliseconds => 1,
            Self::Seconds => 1_000,
            Self::Minutes => 60 * 1_000,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Milliseconds => "milliseconds",
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a known [`TimeUnit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time unit: {0:?} (expected milliseconds, seconds or minutes)")]
pub struct ParseTimeUnitError(pub String);

impl FromStr for TimeUnit {
    type Err = ParseTimeUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ms" | "millisecond" | "milliseconds" => Ok(Self::Milliseconds),
            "s" | "sec" | "second" | "seconds" => Ok(Self::Seconds),
            "m" | "min" | "minute" | "minutes" => Ok(Self::Minutes),
            _ => Err(ParseTimeUnitError(s.to_owned())),
        }
    }
}

/// A duration as the caller wrote it: `2 seconds`, `500 milliseconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollDuration {
    /// How many `unit`s.
    pub magnitude: u64,
    /// Unit of `magnitude`.
    pub unit: TimeUnit,
}

impl PollDuration {
    /// Create a duration from a magnitude and unit.
    #[must_use]
    pub const fn new(magnitude: u64, unit: TimeUnit) -> Self {
        Self { magnitude, unit }
    }

    /// `magnitude` milliseconds.
    #[must_use]
    pub const fn millis(magnitude: u64) -> Self {
        Self::new(magnitude, TimeUnit::Milliseconds)
    }

    /// `magnitude` seconds.
    #[must_use]
    pub const fn seconds(magnitude: u64) -> Self {
        Self::new(magnitude, TimeUnit::Seconds)
    }

    /// `magnitude` minutes.
    #[must_use]
    pub const fn minutes(magnitude: u64) -> Self {
        Self::new(magnitude, TimeUnit::Minutes)
    }

    /// Total milliseconds. Saturates at `u64::MAX`.
    #[must_use]
    pub const fn to_millis(self) -> u64 {
        self.magnitude.saturating_mul(self.unit.multiplier())
    }

    /// Convert to a [`Duration`] for scheduling.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.to_millis())
    }
}

impl Default for PollDuration {
    fn default() -> Self {
        Self::millis(1_000)
    }
}

impl From<PollDuration> for Duration {
    fn from(value: PollDuration) -> Self {
        value.as_duration()
    }
}

impl fmt::Display for PollDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(PollDuration::new(2, TimeUnit::Seconds), 2_000)]
    #[case(PollDuration::new(1, TimeUnit::Minutes), 60_000)]
    #[case(PollDuration::new(500, TimeUnit::Milliseconds), 500)]
    #[case(PollDuration::new(0, TimeUnit::Minutes), 0)]
    fn converts_to_millis(#[case] duration: PollDuration, #[case] expected: u64) {
        assert_eq!(duration.to_millis(), expected);
        assert_eq!(duration.as_duration(), Duration::from_millis(expected));
    }

    #[test]
    fn default_interval_is_one_second() {
        assert_eq!(PollDuration::default().to_millis(), 1_000);
    }

    #[test]
    fn huge_magnitude_saturates() {
        assert_eq!(PollDuration::minutes(u64::MAX).to_millis(), u64::MAX);
    }

    #[rstest]
    #[case("milliseconds", TimeUnit::Milliseconds)]
    #[case("ms", TimeUnit::Milliseconds)]
    #[case("Seconds", TimeUnit::Seconds)]
    #[case(" s ", TimeUnit::Seconds)]
    #[case("minute", TimeUnit::Minutes)]
    fn parses_unit_names(#[case] input: &str, #[case] expected: TimeUnit) {
        assert_eq!(input.parse::<TimeUnit>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_unit() {
        let err = "hours".parse::<TimeUnit>().unwrap_err();
        assert_eq!(err, ParseTimeUnitError("hours".into()));
        assert!(err.to_string().contains("hours"));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for unit in [TimeUnit::Milliseconds, TimeUnit::Seconds, TimeUnit::Minutes] {
            assert_eq!(unit.to_string().parse::<TimeUnit>().unwrap(), unit);
        }
        assert_eq!(PollDuration::seconds(3).to_string(), "3 seconds");
    }

    #[test]
    fn deserializes_lowercase_unit() {
        let duration: PollDuration =
            serde_json::from_str(r#"{"magnitude": 5, "unit": "seconds"}"#).unwrap();
        assert_eq!(duration, PollDuration::seconds(5));
    }

    proptest! {
        #[test]
        fn same_length_in_any_unit(minutes in 0u64..10_000) {
            let as_minutes = PollDuration::minutes(minutes);
            let as_seconds = PollDuration::seconds(minutes * 60);
            let as_millis = PollDuration::millis(minutes * 60_000);
            prop_assert_eq!(as_minutes.to_millis(), as_seconds.to_millis());
            prop_assert_eq!(as_seconds.as_duration(), as_millis.as_duration());
        }
    }
}
