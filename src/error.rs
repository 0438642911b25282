//! Error types surfaced to host code.
use crate::outcome::{Cause, Outcome};

/// Terminal error returned by [`crate::repeat()`] and friends.
///
/// The host never sees a raw `Temporary` or `Stop`: both are unwrapped to their cause before
/// they get here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepeatError {
    /// The sequence ended on a failure (a plain error, or the cause of a `Stop`).
    #[error("{0}")]
    Failed(#[source] Cause),
    /// A step escalated its failure; the host is expected to let this propagate.
    #[error("unrecoverable: {0}")]
    Unrecoverable(#[source] Cause),
}

impl RepeatError {
    /// Check if the sequence ended because its cancellation token fired.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Failed(cause) => cause.is::<Cancelled>(),
            Self::Unrecoverable(_) => false,
        }
    }

    /// Check if a step escalated its failure.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Unrecoverable(_))
    }

    /// Borrow the underlying cause.
    pub fn cause(&self) -> &Cause {
        match self {
            Self::Failed(cause) | Self::Unrecoverable(cause) => cause,
        }
    }

    /// Take the underlying cause.
    pub fn into_cause(self) -> Cause {
        match self {
            Self::Failed(cause) | Self::Unrecoverable(cause) => cause,
        }
    }

    /// Attempt to downcast the cause to a concrete error type.
    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        self.cause().downcast_ref::<T>()
    }

    /// Convert a terminal outcome into the host-facing result.
    ///
    /// `Temporary` and `Stop` are unwrapped to their cause; a missing cause is success.
    pub fn settle(outcome: Outcome) -> Result<(), RepeatError> {
        match outcome {
            Outcome::Success => Ok(()),
            Outcome::Temporary(cause) | Outcome::Stop(cause) => match cause {
                Some(cause) => Err(RepeatError::Failed(cause)),
                None => Ok(()),
            },
            Outcome::Failure(cause) => Err(RepeatError::Failed(cause)),
            Outcome::Unrecoverable(cause) => Err(RepeatError::Unrecoverable(cause)),
        }
    }
}

/// Error value produced when a cancellation token fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Cause attached to the `Unrecoverable` outcome handed to a destruct hook when the bracketed
/// operation panicked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("operation panicked: {0}")]
pub struct Panicked(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("{0}")]
    struct DummyError(&'static str);

    #[test]
    fn settle_unwraps_stop_and_temporary() {
        assert!(RepeatError::settle(Outcome::finish()).is_ok());
        assert!(RepeatError::settle(Outcome::retry()).is_ok());
        assert!(RepeatError::settle(Outcome::Success).is_ok());

        let err = RepeatError::settle(Outcome::stop(DummyError("real"))).unwrap_err();
        assert_eq!(err.to_string(), "real");
        assert_eq!(err.downcast_ref::<DummyError>(), Some(&DummyError("real")));

        let err = RepeatError::settle(Outcome::temporary(DummyError("zed"))).unwrap_err();
        assert_eq!(err.to_string(), "zed");
    }

    #[test]
    fn settle_keeps_plain_and_unrecoverable_apart() {
        let plain = RepeatError::settle(Outcome::fail(DummyError("aim"))).unwrap_err();
        assert!(!plain.is_unrecoverable());
        assert_eq!(plain.to_string(), "aim");

        let escalated = RepeatError::settle(Outcome::unrecoverable(DummyError("boom"))).unwrap_err();
        assert!(escalated.is_unrecoverable());
        assert_eq!(escalated.to_string(), "unrecoverable: boom");
    }

    #[test]
    fn cancelled_is_detected() {
        let err = RepeatError::Failed(Arc::new(Cancelled));
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "operation cancelled");
        assert!(!RepeatError::Unrecoverable(Arc::new(Cancelled)).is_cancelled());
    }

    #[test]
    fn source_points_at_cause() {
        let err = RepeatError::Failed(Arc::new(DummyError("inner")));
        assert_eq!(err.source().unwrap().to_string(), "inner");
        assert_eq!(err.into_cause().to_string(), "inner");
    }
}
