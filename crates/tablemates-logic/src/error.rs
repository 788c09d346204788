//! Error kinds for configuration, participant ingestion and formation runs.
//!
//! Scoring itself never fails: degenerate groups resolve to defined default
//! sub-scores. Errors only surface at the two boundaries where bad data can
//! enter, matcher construction and participant ingestion.

use thiserror::Error;

use crate::profile::ParticipantId;

/// Invalid matcher configuration, reported at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Target group size must be at least 2.
    #[error("target group size must be at least 2, got {0}")]
    InvalidGroupSize(usize),
    /// The sampling threshold is smaller than a single group.
    #[error("sampling threshold {threshold} is below target group size {target}")]
    InvalidSamplingThreshold { threshold: usize, target: usize },
    /// Sample cap or per-member multiplier is zero.
    #[error("sample cap and per-member multiplier must be positive")]
    InvalidSampleCap,
    /// A weight family does not sum to 1.0.
    #[error("{name} weights sum to {sum:.4}, expected 1.0")]
    WeightSumMismatch { name: &'static str, sum: f64 },
    /// A single scoring parameter is outside its usable range.
    #[error("{name} = {value} is out of range")]
    InvalidWeight { name: &'static str, value: f64 },
    /// Fairness placement range is inverted.
    #[error("fairness placement range {min}..={max} is empty")]
    InvalidFairnessRange { min: usize, max: usize },
    /// Configuration JSON could not be decoded.
    #[error("could not parse configuration: {0}")]
    Parse(String),
}

/// A participant record rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("participant id is empty")]
    EmptyId,
    #[error("participant {0} has no city")]
    EmptyCity(ParticipantId),
    #[error("participant {0} speaks no languages")]
    NoLanguages(ParticipantId),
    #[error("participant {0} has no academic affiliation")]
    EmptyAffiliation(ParticipantId),
    #[error("participant {id} has implausible age {age}")]
    InvalidAge { id: ParticipantId, age: u32 },
    #[error("participant {0} lists a blank interest tag")]
    BlankInterest(ParticipantId),
}

/// Failure of a formation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
