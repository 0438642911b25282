//! Backoff generators for the delay step.
//!
//! A generator is stateful: every call to [`Backoff::next_delay`] returns the next wait and
//! advances the internal state. Builders are plain configuration; each `build()` produces a
//! fresh generator, so two retry sequences never share state.
//!
//! - [`FixedBackoff`]: the same delay every time.
//! - [`FullJitterBackoff`]: uniform in `[0, ceiling)`, ceiling doubling up to a cap.
//! - [`ExponentialBackoff`]: `nominal * multiplier^k` with multiplicative jitter, capped.
//! - [`DecorrelatedJitterBackoff`]: AWS-style decorrelated jitter, `random[base, prev * 3]`.
//!
//! Randomized generators seed from OS entropy unless a seed is configured.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use encore::backoff::{self, Backoff};
//!
//! let mut backoff = backoff::exponential(Duration::from_millis(100))
//!     .with_max_delay(Duration::from_millis(500))
//!     .build();
//! assert_eq!(backoff.next_delay(), Duration::from_millis(100));
//! assert_eq!(backoff.next_delay(), Duration::from_millis(200));
//! assert_eq!(backoff.next_delay(), Duration::from_millis(400));
//! assert_eq!(backoff.next_delay(), Duration::from_millis(500)); // capped
//! ```
//!
//! Overflow behavior: integer math saturates and float results above the cap return the cap.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;

/// Default cap: the largest representable duration.
pub const MAX_DELAY: Duration = Duration::MAX;

/// Errors returned by backoff configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackoffError {
    #[error("jitter must be within [0, 1] (got {0})")]
    InvalidJitter(f64),
    #[error("multiplier must be finite and positive (got {0})")]
    InvalidMultiplier(f64),
    #[error("max ({max:?}) must be >= base ({base:?})")]
    MaxLessThanBase { base: Duration, max: Duration },
}

/// A stateful generator of successive delays.
pub trait Backoff: Send {
    fn next_delay(&mut self) -> Duration;
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    fn next_delay(&mut self) -> Duration {
        (**self).next_delay()
    }
}

/// Conversion into a backoff generator.
///
/// Implemented for every generator and for every builder, so configuration surfaces accept
/// either form.
pub trait IntoBackoff {
    type Backoff: Backoff + 'static;

    fn into_backoff(self) -> Self::Backoff;
}

impl<B: Backoff + 'static> IntoBackoff for B {
    type Backoff = B;

    fn into_backoff(self) -> B {
        self
    }
}

/// Generator backed by a closure. Created by [`from_fn`].
pub struct BackoffFn<F> {
    f: F,
}

impl<F> fmt::Debug for BackoffFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffFn").finish_non_exhaustive()
    }
}

/// Adapt `FnMut() -> Duration` into a [`Backoff`].
pub fn from_fn<F>(f: F) -> BackoffFn<F>
where
    F: FnMut() -> Duration + Send,
{
    BackoffFn { f }
}

impl<F> Backoff for BackoffFn<F>
where
    F: FnMut() -> Duration + Send,
{
    fn next_delay(&mut self) -> Duration {
        (self.f)()
    }
}

fn nanos_saturated(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

fn duration_from_nanos_f64(nanos: f64) -> Duration {
    if nanos.is_nan() || nanos <= 0.0 {
        return Duration::ZERO;
    }
    if nanos < u64::MAX as f64 {
        return Duration::from_nanos(nanos as u64);
    }
    Duration::try_from_secs_f64(nanos / 1e9).unwrap_or(Duration::MAX)
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Always the same delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Backoff for FixedBackoff {
    fn next_delay(&mut self) -> Duration {
        self.delay
    }
}

/// Capped exponential backoff with full jitter.
///
/// Example (base=1, max=30):
///
/// | call | delay           |
/// |------|-----------------|
/// | 1    | random `[0, 1)`  |
/// | 2    | random `[0, 2)`  |
/// | 3    | random `[0, 4)`  |
/// | 4    | random `[0, 8)`  |
/// | 5    | random `[0, 16)` |
/// | 6+   | random `[0, 30)` |
pub struct FullJitterBackoff {
    ceiling: Duration,
    max: Duration,
    rng: StdRng,
}

impl fmt::Debug for FullJitterBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FullJitterBackoff")
            .field("ceiling", &self.ceiling)
            .field("max", &self.max)
            .finish_non_exhaustive()
    }
}

impl FullJitterBackoff {
    /// A `base` above `max` is clamped to `max`.
    pub fn new(base: Duration, max: Duration, rng: StdRng) -> Self {
        Self { ceiling: base.min(max), max, rng }
    }
}

impl Backoff for FullJitterBackoff {
    fn next_delay(&mut self) -> Duration {
        let upper = nanos_saturated(self.ceiling);
        let delay = if upper == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.rng.random_range(0..upper))
        };
        self.ceiling = self.ceiling.checked_mul(2).unwrap_or(self.max).min(self.max);
        delay
    }
}

/// Capped exponential backoff with multiplicative jitter.
///
/// The `k`-th call returns `nominal * (1 - jitter) + nominal * jitter * 2 * U` with
/// `nominal = initial * multiplier^k` and `U` uniform in `[0, 1)`, clamped to `max`. Only the
/// returned value is clamped; the nominal delay keeps growing.
///
/// Example (initial=1, max=30, multiplier=2, jitter=0.5):
///
/// | attempt | delay                         |
/// |---------|-------------------------------|
/// | 0       | 1 + random `[-0.5, 0.5)`       |
/// | 1       | 2 + random `[-1, 1)`           |
/// | 2       | 4 + random `[-2, 2)`           |
/// | 5       | 32 + random `[-16, 16)`, max 30 |
pub struct ExponentialBackoff {
    nominal: f64,
    multiplier: f64,
    jitter: f64,
    max: Duration,
    rng: StdRng,
}

impl fmt::Debug for ExponentialBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExponentialBackoff")
            .field("nominal_nanos", &self.nominal)
            .field("multiplier", &self.multiplier)
            .field("jitter", &self.jitter)
            .field("max", &self.max)
            .finish_non_exhaustive()
    }
}

impl ExponentialBackoff {
    pub fn new(
        initial: Duration,
        max: Duration,
        multiplier: f64,
        jitter: f64,
        rng: StdRng,
    ) -> Self {
        Self { nominal: initial.as_nanos() as f64, multiplier, jitter, max, rng }
    }
}

impl Backoff for ExponentialBackoff {
    fn next_delay(&mut self) -> Duration {
        let nominal = self.nominal;
        self.nominal = nominal * self.multiplier;

        let delta = nominal * self.jitter;
        let delay = nominal - delta + 2.0 * delta * self.rng.random::<f64>();
        if delay.is_nan() {
            // inf - inf once the nominal delay has overflowed
            return self.max;
        }
        duration_from_nanos_f64(delay).min(self.max)
    }
}

/// Decorrelated jitter: `next = min(max, random[base, previous * 3])`.
pub struct DecorrelatedJitterBackoff {
    base: Duration,
    max: Duration,
    previous: Duration,
    rng: StdRng,
}

impl fmt::Debug for DecorrelatedJitterBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecorrelatedJitterBackoff")
            .field("base", &self.base)
            .field("max", &self.max)
            .field("previous", &self.previous)
            .finish_non_exhaustive()
    }
}

impl DecorrelatedJitterBackoff {
    pub fn new(base: Duration, max: Duration, rng: StdRng) -> Self {
        Self { base, max, previous: base, rng }
    }
}

impl Backoff for DecorrelatedJitterBackoff {
    fn next_delay(&mut self) -> Duration {
        let max = nanos_saturated(self.max);
        // upper bound grows from previous sleep, capped by max
        let upper = nanos_saturated(self.previous).saturating_mul(3).min(max);
        // lower bound keeps the floor at base but never exceeds upper
        let lower = nanos_saturated(self.base).min(upper);
        self.previous = Duration::from_nanos(self.rng.random_range(lower..=upper));
        self.previous
    }
}

/// Configuration for [`FixedBackoff`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedBackoffBuilder {
    pub delay: Duration,
}

impl Default for FixedBackoffBuilder {
    fn default() -> Self {
        Self { delay: Duration::from_secs(1) }
    }
}

impl FixedBackoffBuilder {
    pub fn build(&self) -> FixedBackoff {
        FixedBackoff::new(self.delay)
    }
}

/// Configuration for [`FullJitterBackoff`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FullJitterBackoffBuilder {
    /// Base of the exponent; the first delay is drawn from `[0, base_delay)`.
    pub base_delay: Duration,
    /// Upper bound on the ceiling. Default: [`MAX_DELAY`].
    pub max_delay: Duration,
    /// Fixed RNG seed for reproducible sequences.
    pub seed: Option<u64>,
}

impl Default for FullJitterBackoffBuilder {
    fn default() -> Self {
        Self { base_delay: Duration::from_secs(1), max_delay: MAX_DELAY, seed: None }
    }
}

impl FullJitterBackoffBuilder {
    pub fn with_base_delay(mut self, base: Duration) -> Self {
        self.base_delay = base;
        self
    }

    /// Set the cap. Returns an error if `max` is below the base delay.
    pub fn with_max_delay(mut self, max: Duration) -> Result<Self, BackoffError> {
        if max < self.base_delay {
            return Err(BackoffError::MaxLessThanBase { base: self.base_delay, max });
        }
        self.max_delay = max;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(&self) -> FullJitterBackoff {
        FullJitterBackoff::new(self.base_delay, self.max_delay, seeded(self.seed))
    }
}

/// Configuration for [`ExponentialBackoff`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExponentialBackoffBuilder {
    /// First nominal delay. Default: 1 second.
    pub initial_delay: Duration,
    /// Cap applied to every returned delay. Default: [`MAX_DELAY`].
    pub max_delay: Duration,
    /// Growth factor of the nominal delay. Default: 2.
    pub multiplier: f64,
    /// Randomization factor in `[0, 1]`. Default: 0.
    pub jitter: f64,
    /// Fixed RNG seed for reproducible sequences.
    pub seed: Option<u64>,
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: MAX_DELAY,
            multiplier: 2.0,
            jitter: 0.0,
            seed: None,
        }
    }
}

impl ExponentialBackoffBuilder {
    pub fn with_initial_delay(mut self, initial: Duration) -> Self {
        self.initial_delay = initial;
        self
    }

    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.max_delay = max;
        self
    }

    /// Set the growth factor. Must be finite and positive.
    pub fn with_multiplier(mut self, multiplier: f64) -> Result<Self, BackoffError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(BackoffError::InvalidMultiplier(multiplier));
        }
        self.multiplier = multiplier;
        Ok(self)
    }

    /// Set the randomization factor. Must be within `[0, 1]`.
    pub fn with_jitter(mut self, jitter: f64) -> Result<Self, BackoffError> {
        if !(0.0..=1.0).contains(&jitter) {
            return Err(BackoffError::InvalidJitter(jitter));
        }
        self.jitter = jitter;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check values that bypassed the setters (e.g. deserialized configuration).
    pub fn validate(&self) -> Result<(), BackoffError> {
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(BackoffError::InvalidMultiplier(self.multiplier));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(BackoffError::InvalidJitter(self.jitter));
        }
        Ok(())
    }

    /// Build a fresh generator. Out-of-range jitter is clamped into `[0, 1]`.
    pub fn build(&self) -> ExponentialBackoff {
        let jitter = if self.jitter.is_nan() { 0.0 } else { self.jitter.clamp(0.0, 1.0) };
        ExponentialBackoff::new(
            self.initial_delay,
            self.max_delay,
            self.multiplier,
            jitter,
            seeded(self.seed),
        )
    }
}

/// Configuration for [`DecorrelatedJitterBackoff`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecorrelatedJitterBackoffBuilder {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub seed: Option<u64>,
}

impl DecorrelatedJitterBackoffBuilder {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(&self) -> DecorrelatedJitterBackoff {
        DecorrelatedJitterBackoff::new(self.base_delay, self.max_delay, seeded(self.seed))
    }
}

impl IntoBackoff for FixedBackoffBuilder {
    type Backoff = FixedBackoff;

    fn into_backoff(self) -> FixedBackoff {
        self.build()
    }
}

impl IntoBackoff for FullJitterBackoffBuilder {
    type Backoff = FullJitterBackoff;

    fn into_backoff(self) -> FullJitterBackoff {
        self.build()
    }
}

impl IntoBackoff for ExponentialBackoffBuilder {
    type Backoff = ExponentialBackoff;

    fn into_backoff(self) -> ExponentialBackoff {
        self.build()
    }
}

impl IntoBackoff for DecorrelatedJitterBackoffBuilder {
    type Backoff = DecorrelatedJitterBackoff;

    fn into_backoff(self) -> DecorrelatedJitterBackoff {
        self.build()
    }
}

/// Builder for a fixed delay.
pub fn fixed(delay: Duration) -> FixedBackoffBuilder {
    FixedBackoffBuilder { delay }
}

/// Builder for full-jitter backoff with no cap.
pub fn full_jitter(base: Duration) -> FullJitterBackoffBuilder {
    FullJitterBackoffBuilder::default().with_base_delay(base)
}

/// Builder for multiplicative-jitter backoff: multiplier 2, jitter 0, no cap.
pub fn exponential(initial: Duration) -> ExponentialBackoffBuilder {
    ExponentialBackoffBuilder::default().with_initial_delay(initial)
}

/// Builder for decorrelated jitter. Returns an error if `base` exceeds `max`.
pub fn decorrelated(
    base: Duration,
    max: Duration,
) -> Result<DecorrelatedJitterBackoffBuilder, BackoffError> {
    if base > max {
        return Err(BackoffError::MaxLessThanBase { base, max });
    }
    Ok(DecorrelatedJitterBackoffBuilder { base_delay: base, max_delay: max, seed: None })
}
