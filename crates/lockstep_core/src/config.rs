//! # Barrier Configuration
//!
//! Loaded once at startup from TOML. Nothing here is touched on the hot path.
//!
//! ```toml
//! participants = 4
//! spin_limit = 1_000_000
//!
//! [backoff]
//! policy = "exponential"
//! max_shift = 6
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::sync::MAX_SHIFT_LIMIT;

/// How a spinning thread pauses between polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BackoffPolicy {
    /// One spin hint per poll.
    Spin,
    /// Doubling pause, capped at `2^max_shift` spin hints.
    Exponential {
        /// Largest exponent reached.
        max_shift: u32,
    },
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::Exponential { max_shift: 6 }
    }
}

/// Construction parameters for a [`SpinBarrier`](crate::SpinBarrier).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierConfig {
    /// Number of threads that must arrive each round.
    pub participants: usize,
    /// Pause between polls.
    #[serde(default)]
    pub backoff: BackoffPolicy,
    /// Poll budget per call for `try_wait`. `None` means unbounded.
    #[serde(default)]
    pub spin_limit: Option<u64>,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            participants: 1,
            backoff: BackoffPolicy::default(),
            spin_limit: None,
        }
    }
}

impl BarrierConfig {
    /// Config for `participants` threads with default backoff and no limit.
    #[must_use]
    pub fn with_participants(participants: usize) -> Self {
        Self {
            participants,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the document does not parse, and whatever
    /// [`BarrierConfig::validate`] reports otherwise.
    pub fn from_toml_str(source: &str) -> SyncResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| SyncError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`BarrierConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| SyncError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(
            path = %path.display(),
            participants = config.participants,
            "loaded barrier config"
        );
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// - `InvalidParticipantCount` if `participants` is zero.
    /// - `InvalidConfig` if `max_shift` exceeds the backoff limit or
    ///   `spin_limit` is zero.
    pub fn validate(&self) -> SyncResult<()> {
        if self.participants == 0 {
            return Err(SyncError::InvalidParticipantCount(self.participants));
        }
        if let BackoffPolicy::Exponential { max_shift } = self.backoff {
            if max_shift > MAX_SHIFT_LIMIT {
                return Err(SyncError::InvalidConfig(format!(
                    "backoff.max_shift {max_shift} exceeds {MAX_SHIFT_LIMIT}"
                )));
            }
        }
        if self.spin_limit == Some(0) {
            return Err(SyncError::InvalidConfig(
                "spin_limit must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let config = BarrierConfig::from_toml_str(
            r#"
            participants = 8
            spin_limit = 500000

            [backoff]
            policy = "exponential"
            max_shift = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.participants, 8);
        assert_eq!(config.spin_limit, Some(500_000));
        assert_eq!(config.backoff, BackoffPolicy::Exponential { max_shift: 4 });
    }

    #[test]
    fn test_defaults_applied() {
        let config = BarrierConfig::from_toml_str("participants = 3").unwrap();
        assert_eq!(config.participants, 3);
        assert_eq!(config.backoff, BackoffPolicy::default());
        assert_eq!(config.spin_limit, None);
    }

    #[test]
    fn test_spin_policy() {
        let config = BarrierConfig::from_toml_str(
            r#"
            participants = 2
            [backoff]
            policy = "spin"
            "#,
        )
        .unwrap();
        assert_eq!(config.backoff, BackoffPolicy::Spin);
    }

    #[test]
    fn test_zero_participants_rejected() {
        let err = BarrierConfig::from_toml_str("participants = 0").unwrap_err();
        assert_eq!(err, SyncError::InvalidParticipantCount(0));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = BarrierConfig::from_toml_str(
            r#"
            participants = 2
            [backoff]
            policy = "sleep"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig(_)));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let mut config = BarrierConfig::with_participants(2);
        config.backoff = BackoffPolicy::Exponential { max_shift: MAX_SHIFT_LIMIT + 1 };
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));

        let mut config = BarrierConfig::with_participants(2);
        config.spin_limit = Some(0);
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("lockstep_missing_config_for_test.toml");
        let err = BarrierConfig::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
