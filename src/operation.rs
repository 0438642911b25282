//! The operation contract: a step that consumes the previous outcome and produces a new one.
//!
//! Operations are async so a step may suspend (the delay step does); every other built-in step
//! completes on its first poll. State such as counters or latches lives inside the operation
//! value, which is why [`Operation::call`] takes `&mut self`: one instance belongs to exactly
//! one retry sequence.
//!
//! ```rust
//! use encore::{from_fn, Operation, Outcome};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut op = from_fn(|outcome: Outcome| outcome.hint_temporary());
//! let out = op.call(Outcome::fail("flaky")).await;
//! assert_eq!(out.to_string(), "temporary: flaky");
//! # });
//! ```

use crate::outcome::Outcome;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;

/// A single step of a retry sequence.
#[async_trait]
pub trait Operation: Send {
    async fn call(&mut self, outcome: Outcome) -> Outcome;
}

/// Type-erased operation, the element type of a composed chain.
pub type BoxOperation = Box<dyn Operation>;

#[async_trait]
impl<O: Operation + ?Sized> Operation for Box<O> {
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        (**self).call(outcome).await
    }
}

/// Extension methods available on every sized operation.
pub trait OperationExt: Operation + Sized + 'static {
    /// Erase the concrete type.
    fn boxed(self) -> BoxOperation {
        Box::new(self)
    }
}

impl<O: Operation + Sized + 'static> OperationExt for O {}

/// Build a `Vec<BoxOperation>` from a list of operations of different types.
///
/// ```rust
/// use encore::{ops, ops::{limit_max_tries, stop_on_success}};
///
/// let chain = ops![stop_on_success(), limit_max_tries(3)];
/// assert_eq!(chain.len(), 2);
/// ```
#[macro_export]
macro_rules! ops {
    () => {
        ::std::vec::Vec::<$crate::BoxOperation>::new()
    };
    ($($op:expr),+ $(,)?) => {
        ::std::vec![$($crate::OperationExt::boxed($op)),+]
    };
}

/// Operation backed by a synchronous closure. Created by [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromFn").finish_non_exhaustive()
    }
}

/// Adapt `FnMut(Outcome) -> Outcome` into an [`Operation`].
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(Outcome) -> Outcome + Send,
{
    FromFn { f }
}

#[async_trait]
impl<F> Operation for FromFn<F>
where
    F: FnMut(Outcome) -> Outcome + Send,
{
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        (self.f)(outcome)
    }
}

/// Operation backed by an async closure. Created by [`from_async_fn`].
pub struct FromAsyncFn<F> {
    f: F,
}

impl<F> fmt::Debug for FromAsyncFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromAsyncFn").finish_non_exhaustive()
    }
}

/// Adapt `FnMut(Outcome) -> impl Future<Output = Outcome>` into an [`Operation`].
///
/// This is the entry point for business steps that do their own I/O.
pub fn from_async_fn<F, Fut>(f: F) -> FromAsyncFn<F>
where
    F: FnMut(Outcome) -> Fut + Send,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    FromAsyncFn { f }
}

#[async_trait]
impl<F, Fut> Operation for FromAsyncFn<F>
where
    F: FnMut(Outcome) -> Fut + Send,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    async fn call(&mut self, outcome: Outcome) -> Outcome {
        (self.f)(outcome).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_fn_forwards_its_closure_result() {
        let mut op = from_fn(|_| Outcome::stop("bob"));
        assert_eq!(op.call(Outcome::Success).await.to_string(), "stop: bob");
    }

    #[tokio::test]
    async fn from_async_fn_awaits_the_future() {
        let mut op = from_async_fn(|outcome: Outcome| async move {
            tokio::task::yield_now().await;
            outcome.hint_temporary()
        });
        assert_eq!(op.call(Outcome::fail("cat")).await.to_string(), "temporary: cat");
    }

    #[tokio::test]
    async fn boxed_operations_keep_their_state() {
        let mut calls = 0;
        let mut op = from_fn(move |outcome| {
            calls += 1;
            if calls > 1 {
                Outcome::finish()
            } else {
                outcome
            }
        })
        .boxed();
        assert!(op.call(Outcome::Success).await.is_success());
        assert!(op.call(Outcome::Success).await.is_stop());
    }

    #[test]
    fn ops_macro_erases_types() {
        let empty = ops![];
        assert!(empty.is_empty());
        let chain = ops![from_fn(|o| o), from_fn(|_| Outcome::finish()),];
        assert_eq!(chain.len(), 2);
    }
}
