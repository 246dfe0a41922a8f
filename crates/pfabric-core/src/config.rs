use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default buffer limit in packets.
pub const DEFAULT_LIMIT: u32 = 150;
/// Default number of priority bands.
pub const DEFAULT_BANDS: usize = 32;
/// Upper bound on the configurable band count.
pub const MAX_BANDS: usize = 1024;

// ─── Input (TOML) ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchedulerConfigInput {
    pub limit: Option<u32>,
    pub dequeue_enabled: Option<bool>,
    pub bands: Option<usize>,
    pub fallback_band: Option<u32>,
    pub peek_honors_gate: Option<bool>,
}

// ─── Resolved ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum packets queued across all bands.
    pub limit: u32,
    /// When false, dequeue reports empty and packets stay queued.
    pub dequeue_enabled: bool,
    /// Number of priority bands. Fixed for the lifetime of a scheduler.
    pub bands: usize,
    /// Band used for packets that arrive without a priority.
    pub fallback_band: u32,
    /// When true, peek also reports empty while dequeue is disabled.
    pub peek_honors_gate: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            dequeue_enabled: true,
            bands: DEFAULT_BANDS,
            fallback_band: 0,
            peek_honors_gate: false,
        }
    }
}

impl SchedulerConfigInput {
    pub fn resolve(self) -> Result<SchedulerConfig, ConfigError> {
        let defaults = SchedulerConfig::default();
        let config = SchedulerConfig {
            limit: self.limit.unwrap_or(defaults.limit),
            dequeue_enabled: self.dequeue_enabled.unwrap_or(defaults.dequeue_enabled),
            bands: self.bands.unwrap_or(defaults.bands),
            fallback_band: self.fallback_band.unwrap_or(defaults.fallback_band),
            peek_honors_gate: self.peek_honors_gate.unwrap_or(defaults.peek_honors_gate),
        };
        config.validate()?;
        Ok(config)
    }
}

impl SchedulerConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(SchedulerConfig::default());
        }
        let parsed: SchedulerConfigInput = toml::from_str(input)?;
        parsed.resolve()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bands == 0 || self.bands > MAX_BANDS {
            return Err(ConfigError::BandCount {
                got: self.bands,
                max: MAX_BANDS,
            });
        }
        if self.fallback_band as usize >= self.bands {
            return Err(ConfigError::FallbackBand {
                band: self.fallback_band,
                bands: self.bands,
            });
        }
        Ok(())
    }

    /// Apply the fields present in `update`.
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if let Some(limit) = update.limit {
            self.limit = limit;
        }
        if let Some(enabled) = update.dequeue_enabled {
            self.dequeue_enabled = enabled;
        }
    }
}

/// Renders in the tc option grammar, so the output parses back with
/// [`ConfigUpdate::parse_args`].
impl fmt::Display for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gate = if self.dequeue_enabled {
            "enable_dequeue"
        } else {
            "disable_dequeue"
        };
        write!(f, "limit {} {}", self.limit, gate)
    }
}

// ─── Runtime Updates ─────────────────────────────────────────────────────────

/// Partial reconfiguration. Absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub limit: Option<u32>,
    pub dequeue_enabled: Option<bool>,
}

impl ConfigUpdate {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn dequeue_enabled(enabled: bool) -> Self {
        Self {
            dequeue_enabled: Some(enabled),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.dequeue_enabled.is_none()
    }

    /// Parse tc-style options:
    ///
    /// ```text
    /// [ limit PACKETS ] [ disable_dequeue ] [ enable_dequeue ]
    /// ```
    ///
    /// Keywords may be abbreviated to any prefix. Later words override
    /// earlier ones.
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        let mut update = ConfigUpdate::default();
        let mut iter = args.iter().map(AsRef::as_ref);
        while let Some(word) = iter.next() {
            if matches(word, "limit") {
                let value = iter
                    .next()
                    .ok_or_else(|| ConfigError::MissingValue("limit".into()))?;
                let limit = value.parse().map_err(|_| ConfigError::IllegalValue {
                    option: "limit".into(),
                    value: value.to_string(),
                })?;
                update.limit = Some(limit);
            } else if matches(word, "disable_dequeue") {
                update.dequeue_enabled = Some(false);
            } else if matches(word, "enable_dequeue") {
                update.dequeue_enabled = Some(true);
            } else {
                return Err(ConfigError::UnknownOption(word.to_string()));
            }
        }
        Ok(update)
    }
}

/// tc keyword matching: `word` is a non-empty prefix of `keyword`.
fn matches(word: &str, keyword: &str) -> bool {
    !word.is_empty() && keyword.starts_with(word)
}
