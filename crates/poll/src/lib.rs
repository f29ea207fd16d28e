//! # Nebula Poll
//!
//! Chained polling for async code: call a producer again and again until a
//! predicate accepts what it returns.
//!
//! ## Features
//!
//! - **Fixed interval** between attempts (`with_interval`)
//! - **Maximum duration** after which the poll fails or returns the last
//!   value (`at_most`, `dont_throw_on_timeout`)
//! - **Minimum duration** that keeps the poll running past the first
//!   accepted value (`at_least`)
//! - **Error tolerance** for flaky producers (`ignore_errors`)
//! - **Failure history**: every rejected attempt is recorded and handed
//!   back when the poll fails
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_poll::{PollError, TimeUnit, poll};
//!
//! async fn job_status() -> Result<&'static str, std::io::Error> {
//!     Ok("done")
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), PollError<&'static str>> {
//!     let status = poll(job_status)
//!         .with_interval(500, TimeUnit::Milliseconds)
//!         .at_most(2, TimeUnit::Minutes)
//!         .ignore_errors()
//!         .until(|status| *status == "done")
//!         .await?;
//!
//!     assert_eq!(status, "done");
//!     Ok(())
//! }
//! ```
//!
//! ## Timing
//!
//! `at_most` and `at_least` start counting when they are called, not when
//! `until` starts. Timers are checked after each producer call completes;
//! an in-flight call is never cancelled.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod config;
mod error;
pub mod evaluator;
mod ledger;
pub mod observability;
mod poll;
mod time;
mod timer;

pub use config::{HistoryMode, PollConfig};
pub use error::{PollError, PollResult, RejectionKind};
pub use ledger::{FailureLedger, RetryRecord};
pub use observability::{LogLevel, LoggingHook, PollEvent, PollHook, PollHooks};
pub use poll::{Poll, PollStats, poll};
pub use time::{ParseTimeUnitError, PollDuration, TimeUnit};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{PollDuration, PollError, PollResult, RejectionKind, TimeUnit, poll};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
