//! Error types.

use thiserror::Error;

/// Internal invariant violations surfaced by the scheduler.
///
/// Expected outcomes (drops, congestion, empty queues) are reported through
/// [`Verdict`](crate::Verdict) and `Option`, never through this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("capacity exceeded but no occupied band found (queued {queued}, limit {limit})")]
    Inconsistent { queued: usize, limit: u32 },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("band count must be between 1 and {max}, got {got}")]
    BandCount { got: usize, max: usize },
    #[error("fallback band {band} outside 0..{bands}")]
    FallbackBand { band: u32, bands: usize },
    #[error("\"{0}\" requires a value")]
    MissingValue(String),
    #[error("illegal \"{option}\": {value}")]
    IllegalValue { option: String, value: String },
    #[error("what is \"{0}\"?")]
    UnknownOption(String),
}
