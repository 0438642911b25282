//! Ready-made operations and combinators.
//!
//! Adapters turn simpler callables into operations; guards such as [`limit_max_tries`] and
//! [`stop_on_success`] decide when a repeat loop ends. Each value owns whatever state it needs
//! (counters, one-shot latches), so build a fresh one per retry sequence.
//!
//! ```rust
//! use encore::{ops, ops::*, repeat, Outcome};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let result = repeat(ops![
//!     with_counter(|attempt| if attempt < 2 { Outcome::temporary("busy") } else { Outcome::Success }),
//!     stop_on_success(),
//!     limit_max_tries(5),
//! ])
//! .await;
//! assert!(result.is_ok());
//! # });
//! ```

use crate::operation::Operation;
use crate::outcome::Outcome;
use async_trait::async_trait;
use std::fmt;

pub use crate::operation::{from_async_fn, from_fn};
pub use crate::service::service_call;

/// Operation ignoring its input and returning the closure's result. Created by [`func`].
pub struct Func<F> {
    f: F,
}

/// Adapt `FnMut() -> Outcome`; the incoming value is replaced by the closure's result.
pub fn func<F>(f: F) -> Func<F>
where
    F: FnMut() -> Outcome + Send,
{
    Func { f }
}

#[async_trait]
impl<F> Operation for Func<F>
where
    F: FnMut() -> Outcome + Send,
{
    async fn call(&mut self, _outcome: Outcome) -> Outcome {
        (self.f)()
    }
}

/// Operation running a side effect and forwarding its input. Created by [`side_effect`].
pub struct SideEffect<F> {
    f: F,
}

/// Adapt `FnMut()`; the incoming value passes through untouched.
pub fn side_effect<F>(f: F) -> SideEffect<F>
where
    F: FnMut() + Send,
{
    SideEffect { f }
}

#[async_trait]
impl<F> Operation for SideEffect<F>
where
    F: FnMut() + Send,
{
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        (self.f)();
        outcome
    }
}

/// Operation observing the incoming value. Created by [`inspect`].
pub struct Inspect<F> {
    f: F,
}

/// Adapt `FnMut(&Outcome)`; the incoming value passes through untouched.
pub fn inspect<F>(f: F) -> Inspect<F>
where
    F: FnMut(&Outcome) + Send,
{
    Inspect { f }
}

#[async_trait]
impl<F> Operation for Inspect<F>
where
    F: FnMut(&Outcome) + Send,
{
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        (self.f)(&outcome);
        outcome
    }
}

/// Operation handing its closure a zero-based invocation index.
///
/// Created by [`with_error_and_counter`] and [`with_counter`].
pub struct Counted<F> {
    f: F,
    count: usize,
}

impl<F> Counted<F> {
    /// Number of completed invocations.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl<F> fmt::Debug for Counted<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counted").field("count", &self.count).finish_non_exhaustive()
    }
}

/// Adapt `FnMut(Outcome, usize) -> Outcome`. The counter advances on every call, including
/// the one that ends the sequence.
pub fn with_error_and_counter<F>(f: F) -> Counted<F>
where
    F: FnMut(Outcome, usize) -> Outcome + Send,
{
    Counted { f, count: 0 }
}

#[async_trait]
impl<F> Operation for Counted<F>
where
    F: FnMut(Outcome, usize) -> Outcome + Send,
{
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        let index = self.count;
        self.count += 1;
        (self.f)(outcome, index)
    }
}

/// Adapt `FnMut(usize) -> Outcome`, ignoring the incoming value.
pub fn with_counter<F>(mut f: F) -> Counted<impl FnMut(Outcome, usize) -> Outcome + Send>
where
    F: FnMut(usize) -> Outcome + Send,
{
    with_error_and_counter(move |_, index| f(index))
}

/// Runs the inner operation only when the incoming value is `Success`.
#[derive(Debug)]
pub struct OnSuccess<O> {
    inner: O,
}

pub fn on_success<O: Operation>(inner: O) -> OnSuccess<O> {
    OnSuccess { inner }
}

#[async_trait]
impl<O: Operation> Operation for OnSuccess<O> {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        if outcome.is_success() {
            self.inner.call(outcome).await
        } else {
            outcome
        }
    }
}

/// Runs the inner operation only when the incoming value is not `Success`.
#[derive(Debug)]
pub struct OnError<O> {
    inner: O,
}

pub fn on_error<O: Operation>(inner: O) -> OnError<O> {
    OnError { inner }
}

#[async_trait]
impl<O: Operation> Operation for OnError<O> {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        if outcome.is_success() {
            outcome
        } else {
            self.inner.call(outcome).await
        }
    }
}

/// Classifies plain failures of the inner operation as `Temporary`.
#[derive(Debug)]
pub struct HintTemporary<O> {
    inner: O,
}

/// Opt the inner operation into retryability: a plain failure becomes `Temporary`, while
/// `Success` and already classified values are kept as they are.
pub fn hint_temporary<O: Operation>(inner: O) -> HintTemporary<O> {
    HintTemporary { inner }
}

#[async_trait]
impl<O: Operation> Operation for HintTemporary<O> {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        match self.inner.call(outcome).await {
            Outcome::Failure(err) => Outcome::Temporary(Some(err)),
            other => other,
        }
    }
}

/// Classifies unclassified results of the inner operation as `Stop`.
#[derive(Debug)]
pub struct HintStop<O> {
    inner: O,
}

/// The inner operation's result becomes `Stop`: a plain failure carries its error, `Success`
/// becomes a clean stop. Already classified values are kept as they are.
pub fn hint_stop<O: Operation>(inner: O) -> HintStop<O> {
    HintStop { inner }
}

#[async_trait]
impl<O: Operation> Operation for HintStop<O> {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        match self.inner.call(outcome).await {
            Outcome::Failure(err) => Outcome::Stop(Some(err)),
            Outcome::Success => Outcome::finish(),
            other => other,
        }
    }
}

/// Escalates unclassified failures of the inner operation. Created by [`escalate`].
#[derive(Debug)]
pub struct Escalate<O> {
    inner: O,
}

/// Turn any plain failure of the inner operation into `Unrecoverable`.
///
/// Use this for errors that must never be classified; `repeat` reports them as
/// [`crate::RepeatError::Unrecoverable`] and the host is expected to let them propagate.
pub fn escalate<O: Operation>(inner: O) -> Escalate<O> {
    Escalate { inner }
}

#[async_trait]
impl<O: Operation> Operation for Escalate<O> {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        match self.inner.call(outcome).await {
            Outcome::Failure(err) => {
                tracing::error!(error = %err, "unclassified failure escalated");
                Outcome::Unrecoverable(err)
            }
            other => other,
        }
    }
}

/// Runs the inner operation on the first invocation only.
#[derive(Debug)]
pub struct OnlyOnce<O> {
    inner: O,
    fired: bool,
}

/// Later invocations return their input unchanged.
pub fn only_once<O: Operation>(inner: O) -> OnlyOnce<O> {
    OnlyOnce { inner, fired: false }
}

#[async_trait]
impl<O: Operation> Operation for OnlyOnce<O> {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        if self.fired {
            return outcome;
        }
        self.fired = true;
        self.inner.call(outcome).await
    }
}

/// Identity operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Nope;

pub fn nope() -> Nope {
    Nope
}

#[async_trait]
impl Operation for Nope {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        outcome
    }
}

/// Operation that always reports `Success`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Done;

pub fn done() -> Done {
    Done
}

#[async_trait]
impl Operation for Done {
    async fn call(&mut self, _outcome: Outcome) -> Outcome {
        Outcome::Success
    }
}

/// Runs the inner operation and discards its result.
#[derive(Debug)]
pub struct FnDone<O> {
    inner: O,
}

/// Run `inner` for its effect and report `Success`. An `Unrecoverable` result still propagates.
pub fn fn_done<O: Operation>(inner: O) -> FnDone<O> {
    FnDone { inner }
}

#[async_trait]
impl<O: Operation> Operation for FnDone<O> {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        match self.inner.call(outcome).await {
            escalated @ Outcome::Unrecoverable(_) => escalated,
            _ => Outcome::Success,
        }
    }
}

/// Guard stopping the sequence after a fixed number of passes.
#[derive(Debug, Clone)]
pub struct LimitMaxTries {
    max: usize,
    count: usize,
}

/// Forward the incoming value on the first `max` invocations, then convert it to `Stop`.
///
/// The counter persists across repeat-loop iterations, so place this before the business step
/// to bound how many times that step runs.
pub fn limit_max_tries(max: usize) -> LimitMaxTries {
    LimitMaxTries { max, count: 0 }
}

#[async_trait]
impl Operation for LimitMaxTries {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        let index = self.count;
        self.count += 1;
        if index < self.max {
            outcome
        } else {
            tracing::debug!(max = self.max, "max tries reached");
            outcome.hint_stop()
        }
    }
}

/// Guard ending the sequence once the preceding step succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct StopOnSuccess;

/// `Success` becomes a clean `Stop`; anything else passes through.
pub fn stop_on_success() -> StopOnSuccess {
    StopOnSuccess
}

#[async_trait]
impl Operation for StopOnSuccess {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        match outcome {
            Outcome::Success => Outcome::finish(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn func_replaces_and_side_effects_forward() {
        assert!(func(|| Outcome::finish()).call(Outcome::fail("x")).await.is_stop());

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        let mut op = side_effect(move || {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(op.call(Outcome::fail("oil")).await.to_string(), "oil");
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let mut seen = Vec::new();
        let mut op = inspect(|outcome: &Outcome| seen.push(outcome.to_string()));
        assert!(op.call(Outcome::retry()).await.is_temporary());
        drop(op);
        assert_eq!(seen, vec!["temporary".to_string()]);
    }

    #[tokio::test]
    async fn counter_is_zero_based_and_always_advances() {
        let mut indices = Vec::new();
        let mut op = with_error_and_counter(|outcome, index| {
            indices.push(index);
            if index == 2 {
                Outcome::finish()
            } else {
                outcome
            }
        });
        for _ in 0..3 {
            op.call(Outcome::Success).await;
        }
        assert_eq!(op.count(), 3);
        drop(op);
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn on_success_and_on_error_short_circuit() {
        let mut ok_only = on_success(func(|| Outcome::stop("ran")));
        assert_eq!(ok_only.call(Outcome::fail("skip")).await.to_string(), "skip");
        assert_eq!(ok_only.call(Outcome::Success).await.to_string(), "stop: ran");

        let mut err_only = on_error(func(|| Outcome::stop("ran")));
        assert!(err_only.call(Outcome::Success).await.is_success());
        assert_eq!(err_only.call(Outcome::retry()).await.to_string(), "stop: ran");
    }

    #[tokio::test]
    async fn hint_temporary_only_touches_plain_failures() {
        let mut op = hint_temporary(nope());
        assert!(op.call(Outcome::Success).await.is_success());
        assert_eq!(op.call(Outcome::fail("net")).await.to_string(), "temporary: net");
        assert_eq!(op.call(Outcome::stop("done")).await.to_string(), "stop: done");
        assert!(op.call(Outcome::unrecoverable("boom")).await.is_unrecoverable());
    }

    #[tokio::test]
    async fn hint_stop_classifies_unclassified_results() {
        let mut op = hint_stop(nope());
        assert_eq!(op.call(Outcome::Success).await.to_string(), "stop");
        assert_eq!(op.call(Outcome::fail("net")).await.to_string(), "stop: net");
        assert_eq!(op.call(Outcome::temporary("later")).await.to_string(), "temporary: later");
        assert!(op.call(Outcome::unrecoverable("boom")).await.is_unrecoverable());
    }

    #[tokio::test]
    async fn escalate_promotes_unclassified_failures() {
        let mut op = escalate(nope());
        assert!(op.call(Outcome::fail("bad")).await.is_unrecoverable());
        assert!(op.call(Outcome::Success).await.is_success());
        assert!(op.call(Outcome::retry()).await.is_temporary());
        assert!(op.call(Outcome::finish()).await.is_stop());
    }

    #[tokio::test]
    async fn only_once_latches() {
        let mut op = only_once(func(|| Outcome::stop("first")));
        assert_eq!(op.call(Outcome::Success).await.to_string(), "stop: first");
        assert!(op.call(Outcome::Success).await.is_success());
        assert_eq!(op.call(Outcome::fail("keep")).await.to_string(), "keep");
    }

    #[tokio::test]
    async fn done_discards_everything_but_escalations() {
        assert!(done().call(Outcome::fail("ann")).await.is_success());
        assert!(fn_done(nope()).call(Outcome::fail("ann")).await.is_success());
        assert!(fn_done(nope()).call(Outcome::unrecoverable("boom")).await.is_unrecoverable());
    }

    #[tokio::test]
    async fn limit_max_tries_stops_from_index_max_onwards() {
        let mut op = limit_max_tries(5);
        for _ in 0..5 {
            assert_eq!(op.call(Outcome::temporary("t")).await.to_string(), "temporary: t");
        }
        for _ in 0..3 {
            assert_eq!(op.call(Outcome::temporary("t")).await.to_string(), "stop: t");
        }
        assert!(op.call(Outcome::Success).await.is_stop());
    }

    #[tokio::test]
    async fn stop_on_success_only_stops_success() {
        let stopped = stop_on_success().call(Outcome::Success).await;
        assert!(stopped.is_stop());
        assert!(stopped.cause().is_none());
        assert_eq!(stop_on_success().call(Outcome::fail("e")).await.to_string(), "e");
    }
}
