//! Decorators applied around operations.
//!
//! An [`OpWrapper`] turns one operation into another; a [`crate::Repeater`] applies its wrapper
//! to every operation of a chain. [`Bracket`] runs a construct hook before an operation and a
//! destruct hook after it, including when the operation panics.

use crate::error::{Cancelled, Panicked};
use crate::operation::{BoxOperation, Operation, OperationExt};
use crate::outcome::Outcome;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-operation decorator.
pub type OpWrapper = Arc<dyn Fn(BoxOperation) -> BoxOperation + Send + Sync>;

/// Wrapper returning its operation untouched.
pub fn forward() -> OpWrapper {
    Arc::new(|op| op)
}

/// Build a wrapper from a closure.
pub fn wrapper<F>(f: F) -> OpWrapper
where
    F: Fn(BoxOperation) -> BoxOperation + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrapper forcing a stop once `token` is cancelled.
///
/// While the token is live the wrapped operation runs normally. After cancellation the
/// operation is skipped: `Success` becomes `Stop(Cancelled)`, `Temporary` becomes `Stop` with
/// the same cause, and `Stop` or failures pass through unchanged.
pub fn stop_on_cancel(token: CancellationToken) -> OpWrapper {
    Arc::new(move |op| StopOnCancel { inner: op, token: token.clone() }.boxed())
}

/// Operation skipped after cancellation. See [`stop_on_cancel`].
pub struct StopOnCancel<O> {
    inner: O,
    token: CancellationToken,
}

impl<O> StopOnCancel<O> {
    pub fn new(inner: O, token: CancellationToken) -> Self {
        Self { inner, token }
    }
}

impl<O> fmt::Debug for StopOnCancel<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopOnCancel")
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<O: Operation> Operation for StopOnCancel<O> {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        if !self.token.is_cancelled() {
            return self.inner.call(outcome).await;
        }
        tracing::debug!(outcome = %outcome, "cancelled, skipping operation");
        match outcome {
            Outcome::Success => Outcome::stop(Cancelled),
            temporary @ Outcome::Temporary(_) => temporary.hint_stop(),
            other => other,
        }
    }
}

/// What a bracket does with the destruct hook's result.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DestructPolicy {
    /// A destruct hook that fails turns the result into `Unrecoverable`; any other destruct
    /// result leaves the operation's result in place.
    #[default]
    Escalate,
    /// The destruct hook's result replaces the operation's result.
    Override,
}

/// Construct / operation / destruct sequence. Created by [`bracket`].
///
/// - The construct hook sees the incoming value. `Success` or `Temporary` lets the operation
///   run with the original incoming value; anything else is returned as is, and neither the
///   operation nor the destruct hook runs.
/// - The destruct hook receives the operation's result and always runs once construct has
///   passed, even if the operation panics. A panic is resumed after destruct.
/// - `Unrecoverable` results are never replaced by the destruct result.
pub struct Bracket<C, D, O> {
    construct: C,
    destruct: D,
    inner: O,
    policy: DestructPolicy,
}

impl<C, D, O> fmt::Debug for Bracket<C, D, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bracket").field("policy", &self.policy).finish_non_exhaustive()
    }
}

pub fn bracket<C, D, O>(construct: C, destruct: D, inner: O) -> Bracket<C, D, O>
where
    C: Operation,
    D: Operation,
    O: Operation,
{
    Bracket { construct, destruct, inner, policy: DestructPolicy::default() }
}

impl<C, D, O> Bracket<C, D, O> {
    pub fn policy(mut self, policy: DestructPolicy) -> Self {
        self.policy = policy;
        self
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[async_trait]
impl<C, D, O> Operation for Bracket<C, D, O>
where
    C: Operation,
    D: Operation,
    O: Operation,
{
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        match self.construct.call(outcome.clone()).await {
            Outcome::Success | Outcome::Temporary(_) => {}
            refused => return refused,
        }

        let result = match AssertUnwindSafe(self.inner.call(outcome)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(&*payload);
                tracing::error!(panic = %message, "bracketed operation panicked");
                self.destruct.call(Outcome::unrecoverable(Panicked(message))).await;
                std::panic::resume_unwind(payload);
            }
        };

        let teardown = self.destruct.call(result.clone()).await;
        if result.is_unrecoverable() {
            return result;
        }
        match self.policy {
            DestructPolicy::Override => teardown,
            DestructPolicy::Escalate => match teardown {
                Outcome::Failure(cause) | Outcome::Unrecoverable(cause) => {
                    tracing::warn!(error = %cause, "destruct hook failed");
                    Outcome::Unrecoverable(cause)
                }
                _ => result,
            },
        }
    }
}
