//! The waiting step: backoff delay, error deadline and cancellation in one operation.
//!
//! Each invocation draws the next delay from the backoff generator and races three signals:
//!
//! 1. the cancellation token: returns [`Cancelled`] as a plain failure;
//! 2. the ordinary delay: returns the incoming outcome unchanged;
//! 3. the error deadline: returns the plain cause of the incoming outcome.
//!
//! The deadline is armed at construction and pushed to `now + errors_timeout` every time the
//! step sees `Success`, so the budget only accumulates across consecutive failures. On an exact
//! tie the ordinary delay wins; a deadline that has already passed when the step starts wins
//! without waiting.
//!
//! ```rust
//! use std::time::Duration;
//! use encore::{backoff, ops, ops::*, repeat, with_delay, DelayOptions};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let result = repeat(ops![
//!     limit_max_tries(3),
//!     with_delay(DelayOptions::new().backoff(backoff::fixed(Duration::from_millis(1)))),
//! ])
//! .await;
//! assert!(result.is_ok());
//! # });
//! ```

use crate::backoff::{self, Backoff, IntoBackoff};
use crate::error::Cancelled;
use crate::operation::Operation;
use crate::outcome::Outcome;
use crate::sleeper::{Sleeper, TokioSleeper};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Configuration for [`Delay`].
pub struct DelayOptions {
    errors_timeout: Duration,
    backoff: Box<dyn Backoff>,
    token: CancellationToken,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for DelayOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayOptions")
            .field("errors_timeout", &self.errors_timeout)
            .field("cancelled", &self.token.is_cancelled())
            .field("sleeper", &self.sleeper)
            .finish_non_exhaustive()
    }
}

impl Default for DelayOptions {
    fn default() -> Self {
        Self {
            errors_timeout: Duration::MAX,
            backoff: Box::new(backoff::fixed(Duration::from_secs(1)).build()),
            token: CancellationToken::new(),
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

impl DelayOptions {
    /// Unlimited error timeout, fixed 1s backoff, a token nobody cancels, tokio timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum time failures may persist before the step gives up. Reset on every success.
    pub fn errors_timeout(mut self, timeout: Duration) -> Self {
        self.errors_timeout = timeout;
        self
    }

    /// Accepts a generator or any backoff builder.
    pub fn backoff<B: IntoBackoff>(mut self, backoff: B) -> Self {
        self.backoff = Box::new(backoff.into_backoff());
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }
}

/// Operation waiting between iterations. Created by [`with_delay`].
pub struct Delay {
    errors_timeout: Duration,
    backoff: Box<dyn Backoff>,
    token: CancellationToken,
    sleeper: Arc<dyn Sleeper>,
    deadline: Option<Instant>,
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delay")
            .field("errors_timeout", &self.errors_timeout)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Build the waiting step. The error deadline starts counting now.
pub fn with_delay(options: DelayOptions) -> Delay {
    let DelayOptions { errors_timeout, backoff, token, sleeper } = options;
    Delay {
        errors_timeout,
        backoff,
        token,
        sleeper,
        deadline: Instant::now().checked_add(errors_timeout),
    }
}

impl Delay {
    /// Current error deadline; `None` when the timeout is too large to represent.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

enum Signal {
    Cancelled,
    Elapsed,
    Deadline,
}

#[async_trait]
impl Operation for Delay {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        let now = Instant::now();
        if outcome.is_success() {
            self.deadline = now.checked_add(self.errors_timeout);
        }

        let delay = self.backoff.next_delay();
        let deadline = self.deadline;

        let signal = if self.token.is_cancelled() {
            Signal::Cancelled
        } else if deadline.is_some_and(|at| at <= now) {
            Signal::Deadline
        } else {
            let sleep = self.sleeper.sleep(delay);
            let expiry = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                biased;
                _ = self.token.cancelled() => Signal::Cancelled,
                _ = sleep => Signal::Elapsed,
                _ = expiry => Signal::Deadline,
            }
        };

        match signal {
            Signal::Cancelled => {
                tracing::debug!(?delay, "delay interrupted by cancellation");
                Outcome::fail(Cancelled)
            }
            Signal::Elapsed => {
                tracing::trace!(?delay, "delay elapsed");
                outcome
            }
            Signal::Deadline => {
                tracing::debug!(
                    errors_timeout = ?self.errors_timeout,
                    cause = %outcome,
                    "errors timeout exceeded"
                );
                outcome.unwrapped()
            }
        }
    }
}
