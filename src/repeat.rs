//! The repeat loop and its configuration.
//!
//! [`repeat`] composes a chain and calls it until a pass ends on something other than
//! `Success` or `Temporary`. Each pass receives the previous pass's result, starting from
//! `Success`, so the first operation always runs at least once.
//!
//! The host never sees a raw classification: `Stop(None)` is `Ok(())`, the cause of a `Stop`
//! or the plain failure becomes [`RepeatError::Failed`], and escalated failures become
//! [`RepeatError::Unrecoverable`].
//!
//! ```rust
//! use encore::{ops, ops::*, repeat, Outcome};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let err = repeat(ops![
//!     limit_max_tries(3),
//!     func(|| Outcome::temporary("still busy")),
//! ])
//! .await
//! .unwrap_err();
//! assert_eq!(err.to_string(), "still busy");
//! # });
//! ```
//!
//! A [`Repeater`] adds cross-cutting configuration: a wrapper applied to every operation,
//! construct/destruct hooks around each pass, and cancellation.

use crate::compose::compose;
use crate::error::RepeatError;
use crate::operation::{BoxOperation, Operation, OperationExt};
use crate::outcome::Outcome;
use crate::wrappers::{bracket, stop_on_cancel, wrapper, DestructPolicy, OpWrapper};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Call `op` with its own output until it returns a terminal outcome.
///
/// Returns the raw terminal value (`Stop`, `Failure` or `Unrecoverable`).
pub async fn drive<O>(op: &mut O, mut outcome: Outcome) -> Outcome
where
    O: Operation + ?Sized,
{
    let mut pass = 0usize;
    loop {
        outcome = op.call(outcome).await;
        pass += 1;
        match outcome {
            Outcome::Success | Outcome::Temporary(_) => {
                tracing::trace!(pass, outcome = %outcome, "repeating");
            }
            _ => {
                tracing::debug!(passes = pass, outcome = %outcome, "repeat finished");
                return outcome;
            }
        }
    }
}

/// Configuration shared by the execution entry points.
///
/// Several [`Repeater::wrap`] calls compose; the wrapper added last is the outermost.
#[derive(Clone, Default)]
pub struct Repeater {
    wrapper: Option<OpWrapper>,
    hooks: Option<Hooks>,
    policy: DestructPolicy,
}

type HookFactory = Arc<dyn Fn() -> BoxOperation + Send + Sync>;

#[derive(Clone)]
struct Hooks {
    construct: HookFactory,
    destruct: HookFactory,
}

impl fmt::Debug for Repeater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repeater")
            .field("wrapped", &self.wrapper.is_some())
            .field("bracketed", &self.hooks.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Repeater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `wrapper` to every operation passed to the execution methods.
    pub fn wrap(mut self, outer: OpWrapper) -> Self {
        self.wrapper = Some(match self.wrapper.take() {
            None => outer,
            Some(inner) => wrapper(move |op| outer(inner(op))),
        });
        self
    }

    /// Stop the sequence at the next step once `token` is cancelled.
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        self.wrap(stop_on_cancel(token))
    }

    /// Run `construct` before and `destruct` after every composed pass.
    ///
    /// Hooks are factories so that each composed chain owns fresh hook state.
    pub fn bracket<C, D, CO, DO>(mut self, construct: C, destruct: D) -> Self
    where
        C: Fn() -> CO + Send + Sync + 'static,
        D: Fn() -> DO + Send + Sync + 'static,
        CO: Operation + 'static,
        DO: Operation + 'static,
    {
        self.hooks = Some(Hooks {
            construct: Arc::new(move || construct().boxed()),
            destruct: Arc::new(move || destruct().boxed()),
        });
        self
    }

    /// How the destruct hook's result is treated. Default: [`DestructPolicy::Escalate`].
    pub fn destruct_policy(mut self, policy: DestructPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bind `ops` into one operation, applying the wrapper and hooks.
    pub fn compose(&self, ops: Vec<BoxOperation>) -> BoxOperation {
        let ops = match &self.wrapper {
            Some(wrapper) => ops.into_iter().map(wrapper.as_ref()).collect(),
            None => ops,
        };
        let chain = compose(ops);
        match &self.hooks {
            Some(hooks) => {
                bracket((hooks.construct)(), (hooks.destruct)(), chain).policy(self.policy).boxed()
            }
            None => chain.boxed(),
        }
    }

    /// Loop until a pass terminates the sequence.
    pub async fn repeat(&self, ops: Vec<BoxOperation>) -> Result<(), RepeatError> {
        let mut op = self.compose(ops);
        RepeatError::settle(drive(&mut op, Outcome::Success).await)
    }

    /// Run a single pass and settle its result.
    ///
    /// `Temporary` is unwrapped like `Stop`, so a retry hint surfaces as its cause.
    pub async fn once(&self, ops: Vec<BoxOperation>) -> Result<(), RepeatError> {
        let mut op = self.compose(ops);
        RepeatError::settle(op.call(Outcome::Success).await)
    }

    /// Build the loop as an operation for use inside an outer chain.
    pub fn fn_repeat(&self, ops: Vec<BoxOperation>) -> FnRepeat {
        FnRepeat { op: self.compose(ops) }
    }
}

/// Repeat loop as an operation. Created by [`fn_repeat`].
///
/// Starts from the incoming value and returns the raw terminal outcome, so an outer chain
/// still sees `Stop` and can classify it.
pub struct FnRepeat {
    op: BoxOperation,
}

impl fmt::Debug for FnRepeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRepeat").finish_non_exhaustive()
    }
}

#[async_trait]
impl Operation for FnRepeat {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        drive(&mut self.op, outcome).await
    }
}

/// Repeat `ops` with the default configuration.
pub async fn repeat(ops: Vec<BoxOperation>) -> Result<(), RepeatError> {
    Repeater::new().repeat(ops).await
}

/// Run one pass of `ops` with the default configuration.
pub async fn once(ops: Vec<BoxOperation>) -> Result<(), RepeatError> {
    Repeater::new().once(ops).await
}

/// The repeat loop as a composable operation.
pub fn fn_repeat(ops: Vec<BoxOperation>) -> FnRepeat {
    Repeater::new().fn_repeat(ops)
}
