//! Abstraction over waiting, used by the delay step.
//!
//! The delay step races the sleeper's future against cancellation and the error deadline, so
//! swapping the sleeper changes how long the ordinary wait takes without touching the rest of
//! the race.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Source of the ordinary inter-iteration wait.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Production sleeper on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}

/// Sleeper that completes immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> BoxFuture<'static, ()> {
        futures::future::ready(()).boxed()
    }
}

/// Sleeper that records every requested wait.
///
/// By default the wait completes immediately; [`RecordingSleeper::realtime`] records and then
/// sleeps on the tokio timer, which keeps deadline races meaningful under paused time.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
    realtime: bool,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn realtime() -> Self {
        Self { realtime: true, ..Self::default() }
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(duration);
        if self.realtime {
            tokio::time::sleep(duration).boxed()
        } else {
            futures::future::ready(()).boxed()
        }
    }
}
