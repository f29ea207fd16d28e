//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Scheduling slack accepted by timing assertions.
pub const SLACK: Duration = Duration::from_millis(50);

/// Measures elapsed (tokio) time between `start` and `stop`.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Assert that `expected <= elapsed <= expected + tolerance`.
    #[track_caller]
    pub fn assert_elapsed_within(&self, expected: Duration, tolerance: Duration) {
        let elapsed = self.elapsed();
        assert!(
            elapsed >= expected && elapsed <= expected + tolerance,
            "elapsed {elapsed:?}, expected {expected:?} (+{tolerance:?})"
        );
    }
}

/// Counts producer invocations; `next()` returns the 1-based call number.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicU32>);

impl CallCounter {
    pub fn next(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}
