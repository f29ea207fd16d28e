//! One-shot duration timers shared between a background task and the
//! retry loop.
//!
//! A timer is armed when the builder method is called, so its deadline is
//! fixed at that moment. The background task that flips the flag is only
//! spawned once the poll starts (that is when a runtime is guaranteed);
//! it sleeps until the original deadline, so the effective duration still
//! counts from the builder call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A timer that fires once, `duration` after it was armed.
#[derive(Debug)]
pub(crate) struct OneShotTimer {
    deadline: Instant,
    fired: Arc<AtomicBool>,
    cancel: CancellationToken,
    started: bool,
}

impl OneShotTimer {
    /// Arm a timer counting from now.
    pub(crate) fn arm(duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            deadline: now.checked_add(duration).unwrap_or_else(far_future),
            fired: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            started: false,
        }
    }

    /// Spawn the background task that flips the flag at the deadline.
    ///
    /// A deadline that already passed flips the flag right away. Must be
    /// called from within a tokio runtime. Calling it twice is a no-op.
    pub(crate) fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        if Instant::now() >= self.deadline {
            self.fired.store(true, Ordering::Release);
            return;
        }

        let deadline = self.deadline;
        let fired = Arc::clone(&self.fired);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => {
                    fired.store(true, Ordering::Release);
                }
                () = cancel.cancelled() => {}
            }
        });
    }

    /// Whether the deadline has passed.
    ///
    /// Also catches a deadline the background task has not been scheduled
    /// for yet. An unstarted or cancelled timer only reports what was
    /// already observed.
    pub(crate) fn has_fired(&self) -> bool {
        if self.fired.load(Ordering::Acquire) {
            return true;
        }
        if self.started && !self.cancel.is_cancelled() && Instant::now() >= self.deadline {
            self.fired.store(true, Ordering::Release);
            return true;
        }
        false
    }

    /// Stop the background task. The flag keeps its current value.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ~30 years, the same cap tokio uses for "never".
fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}
