//! # Runtime Configuration
//!
//! Signature tunables plus runtime parameters, with environment overrides.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LS_PROOF_TIMEOUT_MS` | `10000` | Proof generator call bound |
//! | `LS_STORAGE_TIMEOUT_MS` | `15000` | Artifact upload bound |
//! | `LS_ARTIFACT_PREFIX` | `signatures` | Root of artifact paths |
//! | `LS_BIND_ATTEMPTS` | `3` | Binding retries before refusing |
//! | `LS_EVENT_CAPACITY` | `1024` | Event bus channel and journal size |

use lease_signature::SignatureConfig;
use std::time::Duration;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Signature service tunables.
    pub signature: SignatureConfig,
    /// Event bus channel and journal capacity.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            signature: SignatureConfig::default(),
            event_capacity: 1024,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `LS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse::<u64>(&lookup, "LS_PROOF_TIMEOUT_MS")? {
            config.signature.proof_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64>(&lookup, "LS_STORAGE_TIMEOUT_MS")? {
            config.signature.storage_timeout = Duration::from_millis(ms);
        }
        if let Some(prefix) = lookup("LS_ARTIFACT_PREFIX") {
            config.signature.artifact_prefix = prefix;
        }
        if let Some(attempts) = parse::<u32>(&lookup, "LS_BIND_ATTEMPTS")? {
            config.signature.bind_attempts = attempts;
        }
        if let Some(capacity) = parse::<usize>(&lookup, "LS_EVENT_CAPACITY")? {
            config.event_capacity = capacity;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signature.proof_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("proof"));
        }
        if self.signature.storage_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("storage"));
        }
        if self.signature.artifact_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::EmptyArtifactPrefix);
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

/// Configuration errors.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable does not parse.
    InvalidValue { key: &'static str, value: String },
    /// A timeout of zero would fail every call.
    ZeroTimeout(&'static str),
    /// Artifacts would land at the bucket root.
    EmptyArtifactPrefix,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an invalid value: {value:?}")
            }
            ConfigError::ZeroTimeout(which) => write!(f, "{which} timeout must be non-zero"),
            ConfigError::EmptyArtifactPrefix => write!(f, "artifact prefix must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}
