use crate::types::{Stratum, Transition};

/// Errors raised while assembling inputs or deriving transition rates
#[derive(Debug, thiserror::Error)]
pub enum WastingError {
    #[error("Daily probability {value} is outside [0, 1); the annual rate is undefined")]
    ProbabilityOutOfDomain { value: f64 },
    #[error("Daily probability is not finite ({value})")]
    NonFiniteProbability { value: f64 },
    #[error("Stratum {stratum} is missing from '{entity}'")]
    MissingStratum { entity: String, stratum: Stratum },
    #[error("Stratum {stratum} appears more than once in '{entity}'")]
    DuplicateStratum { entity: String, stratum: Stratum },
    #[error("No inputs provided for cause '{0}'")]
    MissingCause(String),
    #[error("'{entity}' has a missing value for {stratum}, draw column {draw}")]
    MissingValue {
        entity: String,
        stratum: Stratum,
        draw: usize,
    },
    #[error("'{entity}' is not indexed by the same strata as '{reference}'")]
    IndexMismatch { entity: String, reference: String },
    #[error("'{entity}' has {actual} draws, expected {expected}")]
    DrawCountMismatch {
        entity: String,
        expected: usize,
        actual: usize,
    },
    #[error("'{entity}' has {actual} rows, expected {expected}")]
    ShapeMismatch {
        entity: String,
        expected: usize,
        actual: usize,
    },
    #[error("Wasting exposure for {stratum}, draw column {draw} sums to {sum}, expected 1")]
    ExposureNotNormalized {
        stratum: Stratum,
        draw: usize,
        sum: f64,
    },
    #[error("Invalid distribution for '{name}': {reason}")]
    InvalidDistribution { name: String, reason: String },
    #[error("Negative {transition} rate {value} for {stratum}, draw column {draw}")]
    NegativeRate {
        transition: Transition,
        stratum: Stratum,
        draw: usize,
        value: f64,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the workspace
pub type Result<T> = std::result::Result<T, WastingError>;
