//! Append-only history of rejected attempts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RejectionKind;

/// One rejected attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryRecord<T> {
    /// Classification of the rejection.
    pub kind: RejectionKind,
    /// Description of the rejection, including the producer's error message
    /// for [`RejectionKind::ExceptionOccurred`].
    pub message: String,
    /// The value produced by the rejected attempt, if there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    /// Wall-clock instant of the rejection.
    pub timestamp: DateTime<Utc>,
}

impl<T> RetryRecord<T> {
    /// Stamp a rejection with the current time. `detail` is appended to the
    /// kind's description.
    pub(crate) fn new(kind: RejectionKind, detail: Option<String>, value: Option<T>) -> Self {
        let message = match detail {
            Some(detail) => format!("{}: {detail}", kind.description()),
            None => kind.description().to_owned(),
        };
        Self {
            kind,
            message,
            value,
            timestamp: Utc::now(),
        }
    }
}

impl<T> fmt::Display for RetryRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.to_rfc3339(),
            self.kind,
            self.message
        )
    }
}

/// Rejections recorded during one poll, oldest first.
///
/// Entries are only ever appended by the retry loop; callers get read-only
/// access through the terminal [`PollError`](crate::PollError) or
/// [`PollStats`](crate::PollStats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureLedger<T> {
    records: Vec<RetryRecord<T>>,
}

impl<T> Default for FailureLedger<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FailureLedger<T> {
    pub(crate) const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: RetryRecord<T>) {
        self.records.push(record);
    }

    #[cfg(test)]
    pub(crate) fn record(
        &mut self,
        kind: RejectionKind,
        detail: Option<String>,
        value: Option<T>,
    ) -> &RetryRecord<T> {
        self.push(RetryRecord::new(kind, detail, value));
        &self.records[self.records.len() - 1]
    }

    /// Number of recorded rejections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent rejection.
    #[must_use]
    pub fn last(&self) -> Option<&RetryRecord<T>> {
        self.records.last()
    }

    /// All rejections, oldest first.
    #[must_use]
    pub fn records(&self) -> &[RetryRecord<T>] {
        &self.records
    }

    /// Iterate over the rejections, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, RetryRecord<T>> {
        self.records.iter()
    }

    /// How many rejections of `kind` were recorded.
    #[must_use]
    pub fn count(&self, kind: RejectionKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }

    /// Kinds in occurrence order.
    #[must_use]
    pub fn kinds(&self) -> Vec<RejectionKind> {
        self.records.iter().map(|r| r.kind).collect()
    }
}

impl<T: Serialize> FailureLedger<T> {
    /// Serialize the full history, values included, as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<'a, T> IntoIterator for &'a FailureLedger<T> {
    type Item = &'a RetryRecord<T>;
    type IntoIter = std::slice::Iter<'a, RetryRecord<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<T> fmt::Display for FailureLedger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{record}")?;
        }
        f.write_str("]")
    }
}
