//! Cache configuration

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{CacheError, Result};

/// Default time a client may stay idle before it is evicted
pub const DEFAULT_CLIENT_IDLE_TIME: Duration = Duration::from_secs(2 * 60);

/// Default period between two reaper sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for [`BroadcasterCache`](super::BroadcasterCache)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum time a client may go without being marked active
    pub client_idle_time: Duration,

    /// Period of the idle sweep
    pub sweep_interval: Duration,

    /// Delay before the first sweep after the reaper starts
    pub initial_delay: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            client_idle_time: DEFAULT_CLIENT_IDLE_TIME,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            initial_delay: Duration::ZERO,
        }
    }
}

impl CacheConfig {
    /// Set the idle threshold
    pub fn client_idle_time(mut self, idle: Duration) -> Self {
        self.client_idle_time = idle;
        self
    }

    /// Set the sweep interval
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the delay before the first sweep
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        validate_idle_time(self.client_idle_time)?;
        validate_sweep_interval(self.sweep_interval)?;
        first_sweep_at(self.initial_delay).map(|_| ())
    }
}

pub(super) fn validate_idle_time(idle: Duration) -> Result<()> {
    if idle.is_zero() {
        return Err(CacheError::InvalidConfig {
            field: "client_idle_time",
            reason: "must be greater than zero",
        });
    }
    Ok(())
}

pub(super) fn validate_sweep_interval(interval: Duration) -> Result<()> {
    // tokio::time::interval panics on a zero period
    if interval.is_zero() {
        return Err(CacheError::InvalidConfig {
            field: "sweep_interval",
            reason: "must be greater than zero",
        });
    }
    Ok(())
}

/// Instant of the first sweep for a reaper started now
pub(super) fn first_sweep_at(delay: Duration) -> Result<Instant> {
    Instant::now()
        .checked_add(delay)
        .ok_or(CacheError::InvalidConfig {
            field: "initial_delay",
            reason: "too far in the future",
        })
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.client_idle_time, Duration::from_secs(120));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.initial_delay, Duration::ZERO);
        assert_ok!(config.validate());
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::default()
            .client_idle_time(Duration::from_secs(5))
            .sweep_interval(Duration::from_millis(500))
            .initial_delay(Duration::from_secs(1));

        assert_eq!(config.client_idle_time, Duration::from_secs(5));
        assert_eq!(config.sweep_interval, Duration::from_millis(500));
        assert_eq!(config.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_zero_durations_rejected() {
        let err = assert_err!(CacheConfig::default()
            .sweep_interval(Duration::ZERO)
            .validate());
        assert!(matches!(
            err,
            CacheError::InvalidConfig {
                field: "sweep_interval",
                ..
            }
        ));

        let err = assert_err!(CacheConfig::default()
            .client_idle_time(Duration::ZERO)
            .validate());
        assert!(matches!(
            err,
            CacheError::InvalidConfig {
                field: "client_idle_time",
                ..
            }
        ));
    }

    #[test]
    fn test_unreachable_initial_delay_rejected() {
        let err = assert_err!(CacheConfig::default()
            .initial_delay(Duration::MAX)
            .validate());
        assert!(matches!(
            err,
            CacheError::InvalidConfig {
                field: "initial_delay",
                ..
            }
        ));
    }
}
