//! Pool construction configuration.

use serde::{Deserialize, Serialize};

use crate::core::error::PoolError;

/// Configuration for constructing a [`crate::core::pool::Pool`].
///
/// Mirrors the coordination engine's construction parameters:
/// `initial_size` workers are created eagerly, and the initial
/// `lower`/`upper` bounds are installed before the manager loops start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Workers created eagerly at construction time.
    pub initial_size: usize,
    /// Lower bound on the active worker count while the pool is running.
    pub lower_limit: usize,
    /// Upper bound on the active worker count. `None` means unbounded.
    pub upper_limit: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: 0,
            lower_limit: 0,
            upper_limit: None,
        }
    }
}

impl PoolConfig {
    /// Start from the defaults (`initial_size: 0, lower_limit: 0,
    /// upper_limit: None`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers created eagerly at construction.
    #[must_use]
    pub fn with_initial_size(mut self, initial_size: usize) -> Self {
        self.initial_size = initial_size;
        self
    }

    /// Set the lower bound.
    #[must_use]
    pub fn with_lower_limit(mut self, lower_limit: usize) -> Self {
        self.lower_limit = lower_limit;
        self
    }

    /// Set the upper bound.
    #[must_use]
    pub fn with_upper_limit(mut self, upper_limit: usize) -> Self {
        self.upper_limit = Some(upper_limit);
        self
    }

    /// Check `lower <= upper` (when `upper` is set).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::BoundViolation`] if the bounds are inverted.
    pub fn validate(&self) -> Result<(), PoolError> {
        if let Some(upper) = self.upper_limit {
            if self.lower_limit > upper {
                return Err(PoolError::BoundViolation {
                    lower: self.lower_limit,
                    upper,
                });
            }
        }
        Ok(())
    }

    /// Parse a [`PoolConfig`] from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string on malformed JSON or invalid
    /// bounds.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate().map_err(|e| e.to_string())?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded_and_eager_free() {
        let cfg = PoolConfig::default();
        assert_eq!(cfg.initial_size, 0);
        assert_eq!(cfg.lower_limit, 0);
        assert_eq!(cfg.upper_limit, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn inverted_bounds_fail_validation() {
        let cfg = PoolConfig::new().with_lower_limit(5).with_upper_limit(2);
        assert_eq!(
            cfg.validate(),
            Err(PoolError::BoundViolation { lower: 5, upper: 2 })
        );
    }

    #[test]
    fn from_json_str_round_trips() {
        let cfg = PoolConfig::new().with_initial_size(2).with_upper_limit(8);
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed = PoolConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.initial_size, 2);
        assert_eq!(parsed.upper_limit, Some(8));
    }

    #[test]
    fn from_json_str_rejects_inverted_bounds() {
        let json = r#"{"initial_size":0,"lower_limit":5,"upper_limit":2}"#;
        assert!(PoolConfig::from_json_str(json).is_err());
    }
}
