//! Three-way classification of step results.
//!
//! Every operation in a chain consumes the previous [`Outcome`] and produces a new one. The
//! variant decides what the composer and the repeat loop do next:
//!
//! - `Success`: nothing went wrong; keep going.
//! - `Temporary(cause)`: a failure the sequence may retry; later steps see it.
//! - `Stop(cause)`: terminate now. A missing cause means a clean finish.
//! - `Failure(err)`: an ordinary, unclassified failure. Treated as fatal unless a step opts in
//!   to retryability (see [`crate::ops::hint_temporary`]).
//! - `Unrecoverable(err)`: an escalated failure the host is expected to let propagate.
//!
//! Wrappers never stack: [`Outcome::hint_temporary`] and [`Outcome::hint_stop`] unwrap the
//! current cause first, so `cause()` always yields the plain error in one step.
//!
//! ```rust
//! use encore::Outcome;
//!
//! let stop = Outcome::temporary("connection refused").hint_stop();
//! assert!(stop.is_stop());
//! assert_eq!(stop.to_string(), "stop: connection refused");
//! assert_eq!(stop.cause().unwrap().to_string(), "connection refused");
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Owned error accepted by the constructors (`&str`, `String` and any error convert into it).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shared error carried inside an [`Outcome`]. Shared so outcomes can be cloned cheaply when a
/// hook needs to observe a value without consuming it.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// The error value threaded through a chain of operations.
#[derive(Debug, Clone, Default)]
pub enum Outcome {
    /// No error.
    #[default]
    Success,
    /// Ordinary failure, opaque to the engine.
    Failure(Cause),
    /// Retry hint with an optional cause.
    Temporary(Option<Cause>),
    /// Termination hint with an optional cause; `None` means stop cleanly.
    Stop(Option<Cause>),
    /// Escalated failure that must never be classified or retried.
    Unrecoverable(Cause),
}

fn share<E: Into<BoxError>>(err: E) -> Cause {
    let boxed: BoxError = err.into();
    Arc::from(boxed)
}

impl Outcome {
    /// Plain failure.
    pub fn fail<E: Into<BoxError>>(err: E) -> Self {
        Outcome::Failure(share(err))
    }

    /// Temporary failure carrying `err`.
    pub fn temporary<E: Into<BoxError>>(err: E) -> Self {
        Outcome::Temporary(Some(share(err)))
    }

    /// Stop carrying `err` as the terminal cause.
    pub fn stop<E: Into<BoxError>>(err: E) -> Self {
        Outcome::Stop(Some(share(err)))
    }

    /// Escalated failure.
    pub fn unrecoverable<E: Into<BoxError>>(err: E) -> Self {
        Outcome::Unrecoverable(share(err))
    }

    /// Temporary hint with no specific reason.
    pub fn retry() -> Self {
        Outcome::Temporary(None)
    }

    /// Clean stop.
    pub fn finish() -> Self {
        Outcome::Stop(None)
    }

    /// Reclassify as `Temporary`, keeping only the immediate cause.
    ///
    /// `Unrecoverable` values are returned unchanged.
    pub fn hint_temporary(self) -> Self {
        match self {
            Outcome::Unrecoverable(_) => self,
            other => Outcome::Temporary(other.cause()),
        }
    }

    /// Reclassify as `Stop`, keeping only the immediate cause.
    ///
    /// `Unrecoverable` values are returned unchanged.
    pub fn hint_stop(self) -> Self {
        match self {
            Outcome::Unrecoverable(_) => self,
            other => Outcome::Stop(other.cause()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Outcome::Temporary(_))
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Outcome::Stop(_))
    }

    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Outcome::Unrecoverable(_))
    }

    /// Unwrap one level: the wrapped cause for `Temporary`/`Stop`, the error itself for
    /// `Failure`/`Unrecoverable`, and `None` for `Success`.
    pub fn cause(self) -> Option<Cause> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(err) | Outcome::Unrecoverable(err) => Some(err),
            Outcome::Temporary(cause) | Outcome::Stop(cause) => cause,
        }
    }

    /// Borrowing form of [`Outcome::cause`].
    pub fn cause_ref(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(err) | Outcome::Unrecoverable(err) => Some(&**err),
            Outcome::Temporary(cause) | Outcome::Stop(cause) => cause.as_deref(),
        }
    }

    /// Strip a `Temporary`/`Stop` wrapper, leaving the plain cause as an outcome.
    ///
    /// A wrapper without a cause becomes `Success`; every other variant is returned as is.
    pub fn unwrapped(self) -> Self {
        match self {
            Outcome::Temporary(cause) | Outcome::Stop(cause) => {
                cause.map_or(Outcome::Success, Outcome::Failure)
            }
            other => other,
        }
    }

    /// Attempt to downcast the cause to a concrete error type.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.cause_ref().and_then(|err| err.downcast_ref::<T>())
    }
}

fn tagged(f: &mut fmt::Formatter<'_>, tag: &str, cause: Option<&Cause>) -> fmt::Result {
    match cause {
        Some(err) => write!(f, "{}: {}", tag, err),
        None => f.write_str(tag),
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Failure(err) => write!(f, "{}", err),
            Outcome::Temporary(cause) => tagged(f, "temporary", cause.as_ref()),
            Outcome::Stop(cause) => tagged(f, "stop", cause.as_ref()),
            Outcome::Unrecoverable(err) => write!(f, "unrecoverable: {}", err),
        }
    }
}

impl<E: Into<BoxError>> From<Result<(), E>> for Outcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(err) => Outcome::fail(err),
        }
    }
}
