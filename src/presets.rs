//! Ready-made guard chains for common repeat patterns.
//!
//! Each preset returns an operation meant to follow the business step in a chain:
//!
//! ```rust
//! use std::time::Duration;
//! use encore::{ops, ops::*, presets, repeat, Outcome};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let result = repeat(ops![
//!     with_counter(|attempt| if attempt < 2 { Outcome::temporary("busy") } else { Outcome::Success }),
//!     presets::backoff_retry(Duration::from_millis(1), 10),
//! ])
//! .await;
//! assert!(result.is_ok());
//! # });
//! ```
//!
//! ## Available Presets
//!
//! - [`backoff_retry`]: stop on success, bounded retries, full-jitter backoff
//! - [`backoff_retry_until_cancelled`]: the same, interrupted by a cancellation token
//! - [`heartbeat`]: fixed period, runs until cancelled
//! - [`heartbeat_with_error_timeout`]: fixed period, ends once failures outlast a timeout

use crate::backoff;
use crate::compose::{compose, Composed};
use crate::delay::{with_delay, Delay, DelayOptions};
use crate::ops;
use crate::ops::{limit_max_tries, stop_on_success};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default base delay of [`backoff_retry`] chains built from configuration.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(500);
/// Default number of tries of [`backoff_retry`] chains built from configuration.
pub const DEFAULT_RETRY_TRIES: usize = 10;
/// Default heartbeat period.
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(1);

/// Retry until the preceding step succeeds, allowing at most `max_tries` retries after the
/// first attempt and waiting a full-jitter backoff starting at `base` between attempts.
pub fn backoff_retry(base: Duration, max_tries: usize) -> Composed {
    retry_chain(base, max_tries, CancellationToken::new())
}

/// [`backoff_retry`] whose waits end early with `Cancelled` once `token` fires.
pub fn backoff_retry_until_cancelled(
    base: Duration,
    max_tries: usize,
    token: CancellationToken,
) -> Composed {
    retry_chain(base, max_tries, token)
}

fn retry_chain(base: Duration, max_tries: usize, token: CancellationToken) -> Composed {
    compose(ops![
        stop_on_success(),
        limit_max_tries(max_tries),
        with_delay(DelayOptions::new().backoff(backoff::full_jitter(base)).cancellation(token)),
    ])
}

/// Wait `period` between passes until `token` is cancelled.
pub fn heartbeat(period: Duration, token: CancellationToken) -> Delay {
    with_delay(DelayOptions::new().backoff(backoff::fixed(period)).cancellation(token))
}

/// Wait `period` between passes; once failures have persisted for `errors_timeout`, end with
/// the last failure's cause.
pub fn heartbeat_with_error_timeout(period: Duration, errors_timeout: Duration) -> Delay {
    with_delay(DelayOptions::new().backoff(backoff::fixed(period)).errors_timeout(errors_timeout))
}
