use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning knobs for one comparison run, supplied by the caller.
///
/// All knobs are size-independent: the same configuration is valid for a
/// ten-node tree and a hundred-thousand-node tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Gram left-context size `p`: how many preceding labels anchor a
    /// node's fingerprint. Must be positive.
    pub left_context: usize,
    /// Gram right-context size `q`. Must be positive.
    pub right_context: usize,
    /// Feature-vector dimension (hash bucket count). Must be positive;
    /// every vector compared in one run uses the same dimension.
    pub dimension: usize,
    /// Similarity acceptance threshold in `[0, 1]`: a candidate pairing is
    /// only accepted when its normalized feature-vector distance is at or
    /// below this value (or its content is exactly equal).
    pub threshold: f64,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            left_context: 2,
            right_context: 3,
            dimension: 64,
            threshold: 0.4,
        }
    }
}

impl DiffConfig {
    /// Check the caller contract up front so a comparison either runs to
    /// completion or refuses before producing anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.left_context == 0 || self.right_context == 0 {
            return Err(ConfigError::NonPositiveContext {
                p: self.left_context,
                q: self.right_context,
            });
        }
        if self.dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("gram context sizes must be positive (p = {p}, q = {q})")]
    NonPositiveContext { p: usize, q: usize },

    #[error("feature vector dimension must be positive")]
    ZeroDimension,

    #[error("similarity threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(DiffConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_context() {
        let config = DiffConfig {
            left_context: 0,
            ..DiffConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveContext { p: 0, q: 3 })
        ));
    }

    #[test]
    fn rejects_zero_dimension() {
        let config = DiffConfig {
            dimension: 0,
            ..DiffConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDimension)));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let config = DiffConfig {
            threshold: 1.5,
            ..DiffConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange(_))
        ));
    }
}
