//! Selection tree parameters.

use crate::error::ConfigError;

/// Parameters of the threshold filter and of winner determination.
///
/// # Defaults
///
/// ```
/// use u_evolver::selection::SelectionConfig;
///
/// let config = SelectionConfig::default();
/// assert_eq!(config.min_kept, 3);
/// assert_eq!(config.stddev_multiplier, 0.0);
/// assert_eq!(config.winner_closeness, 0.1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionConfig {
    /// Items always kept at every level, regardless of the threshold.
    pub min_kept: usize,

    /// Shifts the keep threshold away from the mean by this many
    /// standard deviations, toward the better side.
    ///
    /// 0.0 keeps everything at least as good as the mean.
    pub stddev_multiplier: f64,

    /// Tolerance for the generation winner, as a fraction of each
    /// objective's range inside the deepest node.
    ///
    /// 0.0 demands the best value on every higher-priority objective;
    /// 1.0 accepts anything in range.
    pub winner_closeness: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_kept: 3,
            stddev_multiplier: 0.0,
            winner_closeness: 0.1,
        }
    }
}

impl SelectionConfig {
    pub fn with_min_kept(mut self, n: usize) -> Self {
        self.min_kept = n;
        self
    }

    pub fn with_stddev_multiplier(mut self, m: f64) -> Self {
        self.stddev_multiplier = m;
        self
    }

    pub fn with_winner_closeness(mut self, closeness: f64) -> Self {
        self.winner_closeness = closeness.clamp(0.0, 1.0);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_kept == 0 {
            return Err(ConfigError::NothingKept);
        }
        if !(0.0..=1.0).contains(&self.winner_closeness) {
            return Err(ConfigError::OutOfUnitRange {
                name: "selection.winner_closeness",
                value: self.winner_closeness,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_clamp() {
        let config = SelectionConfig::default()
            .with_min_kept(5)
            .with_stddev_multiplier(0.5)
            .with_winner_closeness(1.5);
        assert_eq!(config.min_kept, 5);
        assert!((config.stddev_multiplier - 0.5).abs() < 1e-12);
        assert!((config.winner_closeness - 1.0).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_kept() {
        let config = SelectionConfig::default().with_min_kept(0);
        assert_eq!(config.validate(), Err(ConfigError::NothingKept));
    }

    #[test]
    fn test_validate_rejects_raw_closeness() {
        let config = SelectionConfig {
            winner_closeness: -0.2,
            ..SelectionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
