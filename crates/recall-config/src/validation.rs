// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive budgets, and well-formed endpoint URLs.

use crate::diagnostic::ConfigError;
use crate::model::RecallConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &RecallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.to_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level `{}` must be one of {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    // A disabled store never touches the database path.
    if config.storage.enabled && config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.storage_name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.storage_name must not be empty".to_string(),
        });
    }

    if config.storage.max_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.max_bytes must be greater than 0".to_string(),
        });
    }

    for (key, url) in [
        ("embedding.remote_url", &config.embedding.remote_url),
        ("embedding.ollama_url", &config.embedding.ollama_url),
        ("embedding.lmstudio_url", &config.embedding.lmstudio_url),
    ] {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{url}` must start with http:// or https://"),
            });
        }
    }

    if config.embedding.model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "embedding.model must not be empty".to_string(),
        });
    }

    if config.embedding.probe_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "embedding.probe_timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.embedding.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "embedding.request_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.embedding.fallback_dimensions == 0 {
        errors.push(ConfigError::Validation {
            message: "embedding.fallback_dimensions must be greater than 0".to_string(),
        });
    }

    if config.retrieval.top_k == 0 {
        errors.push(ConfigError::Validation {
            message: "retrieval.top_k must be greater than 0".to_string(),
        });
    }

    let floor = config.retrieval.min_similarity;
    if !floor.is_finite() || !(-1.0..=1.0).contains(&floor) {
        errors.push(ConfigError::Validation {
            message: format!("retrieval.min_similarity must be within [-1.0, 1.0], got {floor}"),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = RecallConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = RecallConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn empty_database_path_allowed_when_storage_disabled() {
        let mut config = RecallConfig::default();
        config.storage.enabled = false;
        config.storage.database_path = "".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_budget_fails_validation() {
        let mut config = RecallConfig::default();
        config.storage.max_bytes = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "max_bytes"));
    }

    #[test]
    fn similarity_floor_out_of_range_fails_validation() {
        let mut config = RecallConfig::default();
        config.retrieval.min_similarity = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "min_similarity"));
    }

    #[test]
    fn malformed_url_fails_validation() {
        let mut config = RecallConfig::default();
        config.embedding.ollama_url = "localhost:11434".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "embedding.ollama_url"));
    }

    #[test]
    fn zero_timeouts_fail_validation() {
        let mut config = RecallConfig::default();
        config.embedding.request_timeout_secs = 0;
        config.embedding.probe_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "embedding.request_timeout_secs"));
        assert!(has_error(&errors, "embedding.probe_timeout_ms"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = RecallConfig::default();
        config.retrieval.top_k = 0;
        config.embedding.fallback_dimensions = 0;
        config.agent.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
