//! Matcher configuration.
//!
//! Every tunable of a formation run lives here: group size, sampling limits,
//! scoring weights, fairness policy, allocation strategy, RNG seed and the
//! optional scoring deadline. Configurations are plain serde values so they
//! can be loaded from JSON; missing fields take their defaults.
//!
//! ```
//! use tablemates_logic::config::MatcherConfig;
//!
//! let config = MatcherConfig::from_json(r#"{ "target_group_size": 4, "seed": 7 }"#).unwrap();
//! assert_eq!(config.target_group_size, 4);
//! assert_eq!(config.sampling.threshold, 20);
//! assert!(config.validate().is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::allocator::AllocatorKind;
use crate::candidates::SamplingPolicy;
use crate::error::ConfigError;
use crate::fairness::FairnessPolicy;
use crate::scoring::ScoringWeights;

/// Default number of diners per table.
pub const DEFAULT_GROUP_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Members per formed group. Also the minimum viable bucket size.
    pub target_group_size: usize,
    pub sampling: SamplingPolicy,
    pub weights: ScoringWeights,
    pub fairness: FairnessPolicy,
    pub allocator: AllocatorKind,
    /// After allocation, run further rounds over each bucket's unplaced
    /// members while at least one more group fits.
    pub refill_leftovers: bool,
    /// Seed for candidate sampling. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Stop generating and scoring candidates after this many milliseconds.
    pub scoring_deadline_ms: Option<u64>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            target_group_size: DEFAULT_GROUP_SIZE,
            sampling: SamplingPolicy::default(),
            weights: ScoringWeights::default(),
            fairness: FairnessPolicy::default(),
            allocator: AllocatorKind::default(),
            refill_leftovers: true,
            seed: None,
            scoring_deadline_ms: None,
        }
    }
}

impl MatcherConfig {
    /// Decode from JSON and validate, failing on the first problem.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MatcherConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        match config.validate().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(config),
        }
    }

    /// Minimum bucket size worth generating candidates for.
    pub fn min_bucket_size(&self) -> usize {
        self.target_group_size
    }

    pub fn scoring_deadline(&self) -> Option<Duration> {
        self.scoring_deadline_ms.map(Duration::from_millis)
    }

    /// Validate the configuration, returning all errors found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.target_group_size < 2 {
            errors.push(ConfigError::InvalidGroupSize(self.target_group_size));
        }
        if self.sampling.threshold < self.target_group_size {
            errors.push(ConfigError::InvalidSamplingThreshold {
                threshold: self.sampling.threshold,
                target: self.target_group_size,
            });
        }
        if self.sampling.max_samples == 0 || self.sampling.samples_per_member == 0 {
            errors.push(ConfigError::InvalidSampleCap);
        }

        errors.extend(self.weights.validate());
        errors.extend(self.fairness.validate());
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MatcherConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.target_group_size, 6);
        assert_eq!(config.min_bucket_size(), 6);
        assert_eq!(config.sampling.max_samples, 1000);
        assert!(config.refill_leftovers);
        assert!(config.scoring_deadline().is_none());
    }

    #[test]
    fn group_size_below_two_is_rejected() {
        let config = MatcherConfig {
            target_group_size: 0,
            ..MatcherConfig::default()
        };
        assert_eq!(config.validate(), vec![ConfigError::InvalidGroupSize(0)]);
    }

    #[test]
    fn threshold_below_group_size_is_rejected() {
        let config = MatcherConfig {
            target_group_size: 8,
            sampling: SamplingPolicy {
                threshold: 5,
                ..SamplingPolicy::default()
            },
            ..MatcherConfig::default()
        };
        assert_eq!(
            config.validate(),
            vec![ConfigError::InvalidSamplingThreshold {
                threshold: 5,
                target: 8
            }]
        );
    }

    #[test]
    fn collects_every_error() {
        let mut config = MatcherConfig::default();
        config.sampling.max_samples = 0;
        config.weights.social = 0.9;
        config.fairness.member_damping = 2.0;
        assert_eq!(config.validate().len(), 3);
    }

    #[test]
    fn json_partial_override() {
        let config = MatcherConfig::from_json(
            r#"{ "sampling": { "threshold": 30 }, "scoring_deadline_ms": 250 }"#,
        )
        .unwrap();
        assert_eq!(config.sampling.threshold, 30);
        assert_eq!(config.sampling.max_samples, 1000);
        assert_eq!(config.scoring_deadline(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn json_errors() {
        assert!(matches!(
            MatcherConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(
            MatcherConfig::from_json(r#"{ "target_group_size": 1 }"#),
            Err(ConfigError::InvalidGroupSize(1))
        );
    }

    #[test]
    fn json_round_trip_keeps_allocator_tag() {
        let json = serde_json::to_string(&MatcherConfig::default()).unwrap();
        assert!(json.contains("\"greedy_by_score\""));
    }
}
