//! Error types
//!
//! Lookups that find nothing are not errors in this crate: an unknown client
//! or an already drained queue yields an empty result. The variants here only
//! cover misconfiguration and missing runtime support.

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error type for cache configuration and lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A configuration value was rejected
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },
    /// The reaper was started outside a tokio runtime and no executor was set
    NoRuntime,
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::InvalidConfig { field, reason } => {
                write!(f, "Invalid cache config `{}`: {}", field, reason)
            }
            CacheError::NoRuntime => {
                write!(f, "No tokio runtime available to schedule the reaper")
            }
        }
    }
}

impl std::error::Error for CacheError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CacheError::InvalidConfig {
            field: "sweep_interval",
            reason: "must be greater than zero",
        };
        assert_eq!(
            err.to_string(),
            "Invalid cache config `sweep_interval`: must be greater than zero"
        );
        assert!(CacheError::NoRuntime.to_string().contains("tokio runtime"));
    }
}
