//! Convenient re-exports for common Encore types.
pub use crate::{
    backoff::{
        Backoff, BackoffError, DecorrelatedJitterBackoffBuilder, ExponentialBackoffBuilder,
        FixedBackoffBuilder, FullJitterBackoffBuilder, IntoBackoff,
    },
    compose, fn_repeat, from_async_fn, from_fn, once, ops,
    ops::{
        done, escalate, fn_done, func, hint_stop, hint_temporary, inspect, limit_max_tries, nope,
        on_error, on_success, only_once, service_call, side_effect, stop_on_success, with_counter,
        with_error_and_counter,
    },
    repeat, with_delay,
    wrappers::{forward, stop_on_cancel, wrapper},
    BoxOperation, CancellationToken, Cancelled, DelayOptions, DestructPolicy, OpWrapper,
    Operation, OperationExt, Outcome, RepeatError, Repeater,
};
