//! Timestamps, validity windows, and clocks.

use crate::CapabilityError;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// Largest representable timestamp, `2^53 - 1`, so values survive a trip
/// through any JSON implementation.
pub const MAX_TIMESTAMP: u64 = (1 << 53) - 1;

/// Whole seconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch itself.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Timestamp at `seconds` since the epoch.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::InvalidInput`] above [`MAX_TIMESTAMP`].
    pub fn from_unix(seconds: u64) -> Result<Self, CapabilityError> {
        if seconds > MAX_TIMESTAMP {
            return Err(CapabilityError::InvalidInput(format!(
                "timestamp {seconds} exceeds 2^53 - 1"
            )));
        }
        Ok(Timestamp(seconds))
    }

    /// The current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Timestamp(quill_common::time::unix_now().min(MAX_TIMESTAMP))
    }

    /// Seconds since the epoch.
    #[must_use]
    pub const fn to_unix(self) -> u64 {
        self.0
    }

    /// `self + duration`, clamped to [`MAX_TIMESTAMP`].
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_add(duration.as_secs()).min(MAX_TIMESTAMP))
    }

    /// `self - duration`, clamped to the epoch.
    #[must_use]
    pub fn saturating_sub(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_sub(duration.as_secs()))
    }
}

impl TryFrom<u64> for Timestamp {
    type Error = CapabilityError;

    fn try_from(seconds: u64) -> Result<Self, Self::Error> {
        Timestamp::from_unix(seconds)
    }
}

impl From<Timestamp> for u64 {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inclusive validity window `[not_before, expiration]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    not_before: Timestamp,
    expiration: Timestamp,
}

impl TimeWindow {
    /// Window from `not_before` through `expiration`.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::InvalidWindow`] unless `expiration` is
    /// strictly after `not_before`.
    pub fn new(not_before: Timestamp, expiration: Timestamp) -> Result<Self, CapabilityError> {
        if expiration <= not_before {
            return Err(CapabilityError::InvalidWindow(format!(
                "expiration {expiration} is not after not-before {not_before}"
            )));
        }
        Ok(Self {
            not_before,
            expiration,
        })
    }

    /// Window opening at `start` and lasting `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::InvalidWindow`] if `ttl` is shorter than a
    /// second.
    pub fn starting_at(start: Timestamp, ttl: Duration) -> Result<Self, CapabilityError> {
        Self::new(start, start.saturating_add(ttl))
    }

    /// First valid second.
    #[must_use]
    pub const fn not_before(&self) -> Timestamp {
        self.not_before
    }

    /// Last valid second.
    #[must_use]
    pub const fn expiration(&self) -> Timestamp {
        self.expiration
    }

    /// `not_before <= now <= expiration`.
    #[must_use]
    pub fn contains(&self, now: Timestamp) -> bool {
        self.not_before <= now && now <= self.expiration
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.not_before, self.expiration)
    }
}

/// A source of the current time.
///
/// Verification takes `now` explicitly; a clock is only consulted by
/// components that verify on their own behalf, such as a store.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicU64);

impl FixedClock {
    /// Clock reading `at`.
    #[must_use]
    pub fn new(at: Timestamp) -> Self {
        Self(AtomicU64::new(at.to_unix()))
    }

    /// Move the clock to `at`.
    pub fn set(&self, at: Timestamp) {
        self.0.store(at.to_unix(), Ordering::Release);
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.set(self.now().saturating_add(by));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.load(Ordering::Acquire))
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
