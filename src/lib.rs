#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Encore
//!
//! Retry composition for async Rust: describe a sequence of fallible steps and let a repeat
//! loop drive it under a policy of retries, delays, backoff and cancellation.
//!
//! Steps exchange an [`Outcome`] instead of a boolean: `Temporary` asks for another pass,
//! `Stop` ends the loop, a plain `Failure` is fatal unless a step reclassifies it, and
//! `Unrecoverable` marks an escalated failure that must propagate.
//!
//! ## Features
//!
//! - **Composable operations**: guards, adapters and classifiers chained with [`compose`]
//! - **Repeat loop** with construct/destruct brackets and per-operation wrappers ([`Repeater`])
//! - **Backoff generators**: fixed, full jitter, multiplicative jitter, decorrelated jitter
//! - **Delay step** racing backoff, an error deadline and a cancellation token
//! - **Tower integration**: any `tower::Service` can be a step
//!
//! ## Quick Start
//!
//! ```rust
//! use encore::{backoff, ops, ops::*, repeat, with_delay, DelayOptions, Outcome};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = repeat(ops![
//!         with_counter(|attempt| {
//!             if attempt < 3 {
//!                 Outcome::temporary("can't connect to a server")
//!             } else {
//!                 Outcome::Success
//!             }
//!         }),
//!         stop_on_success(),
//!         limit_max_tries(10),
//!         with_delay(DelayOptions::new().backoff(backoff::full_jitter(Duration::from_millis(5)))),
//!     ])
//!     .await;
//!     assert!(result.is_ok());
//! }
//! ```

pub mod backoff;
pub mod compose;
pub mod delay;
pub mod error;
pub mod operation;
pub mod ops;
pub mod outcome;
pub mod prelude;
pub mod presets;
pub mod repeat;
pub mod service;
pub mod sleeper;
pub mod wrappers;

// Re-exports
pub use backoff::{Backoff, BackoffError, IntoBackoff};
pub use compose::{compose, Composed};
pub use delay::{with_delay, Delay, DelayOptions};
pub use error::{Cancelled, Panicked, RepeatError};
pub use operation::{from_async_fn, from_fn, BoxOperation, Operation, OperationExt};
pub use outcome::{BoxError, Cause, Outcome};
pub use repeat::{drive, fn_repeat, once, repeat, FnRepeat, Repeater};
pub use sleeper::{InstantSleeper, RecordingSleeper, Sleeper, TokioSleeper};
pub use wrappers::{bracket, stop_on_cancel, Bracket, DestructPolicy, OpWrapper};

pub use tokio_util::sync::CancellationToken;
