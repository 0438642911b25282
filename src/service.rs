//! Run a `tower::Service` as a step of a retry sequence.
//!
//! Every invocation waits for the service to become ready, then calls it with a clone of the
//! request. A response is handed to the optional sink and reported as `Success`; an error is
//! passed to the caller's classifier, which decides whether it is `Temporary`, `Stop`, or a
//! plain failure.
//!
//! ```rust
//! use encore::{ops, ops::*, repeat, Outcome};
//! use tower::service_fn;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let svc = service_fn(|req: &'static str| async move { Ok::<_, std::io::Error>(req.len()) });
//! let result = repeat(ops![
//!     service_call(svc, "ping", |err: std::io::Error| Outcome::temporary(err))
//!         .on_response(|len| assert_eq!(len, 4)),
//!     stop_on_success(),
//!     limit_max_tries(3),
//! ])
//! .await;
//! assert!(result.is_ok());
//! # });
//! ```

use crate::operation::Operation;
use crate::outcome::Outcome;
use async_trait::async_trait;
use std::fmt;
use tower::ServiceExt;
use tower_service::Service;

/// Operation calling a tower service. Created by [`service_call`].
pub struct ServiceCall<S, Req, C, K> {
    service: S,
    request: Req,
    classify: C,
    sink: K,
}

impl<S, Req, C, K> fmt::Debug for ServiceCall<S, Req, C, K>
where
    Req: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCall").field("request", &self.request).finish_non_exhaustive()
    }
}

fn discard<T>(_: T) {}

/// Adapt `service` into an operation that sends `request` on every invocation.
pub fn service_call<S, Req, C>(
    service: S,
    request: Req,
    classify: C,
) -> ServiceCall<S, Req, C, fn(S::Response)>
where
    S: Service<Req>,
    C: FnMut(S::Error) -> Outcome,
{
    ServiceCall { service, request, classify, sink: discard::<S::Response> as fn(S::Response) }
}

impl<S, Req, C, K> ServiceCall<S, Req, C, K>
where
    S: Service<Req>,
{
    /// Receive every successful response.
    pub fn on_response<K2>(self, sink: K2) -> ServiceCall<S, Req, C, K2>
    where
        K2: FnMut(S::Response),
    {
        ServiceCall { service: self.service, request: self.request, classify: self.classify, sink }
    }
}

#[async_trait]
impl<S, Req, C, K> Operation for ServiceCall<S, Req, C, K>
where
    S: Service<Req> + Send,
    S::Future: Send,
    S::Error: Send,
    S::Response: Send,
    Req: Clone + Send,
    C: FnMut(S::Error) -> Outcome + Send,
    K: FnMut(S::Response) + Send,
{
    async fn call(&mut self, _outcome: Outcome) -> Outcome {
        let request = self.request.clone();
        let response = match self.service.ready().await {
            Ok(service) => service.call(request).await,
            Err(err) => Err(err),
        };
        match response {
            Ok(response) => {
                (self.sink)(response);
                Outcome::Success
            }
            Err(err) => (self.classify)(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::service_fn;

    #[derive(Debug, thiserror::Error)]
    #[error("unavailable")]
    struct Unavailable;

    #[tokio::test]
    async fn success_reaches_the_sink() {
        let svc = service_fn(|req: u32| async move { Ok::<_, Unavailable>(req * 2) });
        let mut seen = Vec::new();
        let mut op = service_call(svc, 21u32, |e: Unavailable| Outcome::fail(e))
            .on_response(|value| seen.push(value));
        assert!(op.call(Outcome::Success).await.is_success());
        drop(op);
        assert_eq!(seen, vec![42]);
    }

    #[tokio::test]
    async fn errors_go_through_the_classifier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let svc = service_fn(move |_req: ()| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Unavailable) }
        });
        let mut op = service_call(svc, (), |e: Unavailable| Outcome::temporary(e));
        let out = op.call(Outcome::Success).await;
        assert_eq!(out.to_string(), "temporary: unavailable");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
