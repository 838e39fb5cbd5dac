//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Tunable knobs for the engine services. Every field has a default, so an
/// empty TOML document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// CAS retry budget for a single status mutation.
    pub max_transition_attempts: u32,
    /// Seconds between dispatcher sweeps.
    pub dispatch_interval_secs: u64,
    /// Maximum prescriptions handled per dispatcher sweep.
    pub dispatch_batch_size: usize,
    /// Buffer size for the workflow event broadcast channel.
    pub event_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_transition_attempts: 3,
            dispatch_interval_secs: 60,
            dispatch_batch_size: 50,
            event_buffer_size: 1024,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from a TOML document, validating the values.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_transition_attempts == 0 {
            return Err(ConfigError::Validation(
                "max-transition-attempts must be at least 1".to_string(),
            ));
        }
        if self.dispatch_batch_size == 0 {
            return Err(ConfigError::Validation(
                "dispatch-batch-size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The dispatcher poll interval as a `Duration`.
    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_secs(self.dispatch_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_transition_attempts, 3);
        assert_eq!(config.dispatch_interval_secs, 60);
        assert_eq!(config.dispatch_batch_size, 50);
        assert_eq!(config.event_buffer_size, 1024);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            max-transition-attempts = 5
            dispatch-interval-secs = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.max_transition_attempts, 5);
        assert_eq!(config.dispatch_interval_secs, 10);
        assert_eq!(config.dispatch_batch_size, 50);
    }

    #[test]
    fn test_invalid_toml() {
        let result = EngineConfig::from_toml_str("max-transition-attempts = \"three\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = EngineConfig::from_toml_str("max-transition-attempts = 0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_batch_rejected() {
        let result = EngineConfig::from_toml_str("dispatch-batch-size = 0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_dispatch_interval() {
        let config = EngineConfig {
            dispatch_interval_secs: 15,
            ..Default::default()
        };
        assert_eq!(config.dispatch_interval(), Duration::from_secs(15));
    }
}
