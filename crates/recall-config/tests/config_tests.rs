// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Recall configuration system.

use recall_config::diagnostic::ConfigError;
use recall_config::model::RecallConfig;
use recall_config::{load_and_validate_path, load_and_validate_str, load_config_from_str, render_toml};
use recall_core::ProviderPreference;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_recall_config() {
    let toml = r#"
[agent]
log_level = "debug"

[storage]
enabled = true
database_path = "/tmp/recall-test.db"
storage_name = "board"
max_bytes = 1024
wal_mode = false

[embedding]
provider = "ollama"
model = "mxbai-embed-large"
remote_url = "https://embeddings.example.com"
ollama_url = "http://10.0.0.2:11434"
lmstudio_url = "http://10.0.0.3:1234"
api_key = "sk-test"
probe_timeout_ms = 250
request_timeout_secs = 5
fallback_dimensions = 64

[retrieval]
top_k = 4
min_similarity = 0.3
use_vectors = false
limit = 2
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/recall-test.db");
    assert_eq!(config.storage.storage_name, "board");
    assert_eq!(config.storage.max_bytes, 1024);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.embedding.provider, ProviderPreference::Ollama);
    assert_eq!(config.embedding.model, "mxbai-embed-large");
    assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.embedding.probe_timeout_ms, 250);
    assert_eq!(config.embedding.fallback_dimensions, 64);
    assert_eq!(config.retrieval.top_k, 4);
    assert!((config.retrieval.min_similarity - 0.3).abs() < f32::EPSILON);
    assert!(!config.retrieval.use_vectors);
    assert_eq!(config.retrieval.limit, 2);
}

/// Provider aliases from the board tooling are accepted.
#[test]
fn provider_aliases_deserialize() {
    let config = load_config_from_str("[embedding]\nprovider = \"local-b\"\n").unwrap();
    assert_eq!(config.embedding.provider, ProviderPreference::LmStudio);

    let config = load_config_from_str("[embedding]\nprovider = \"local-a\"\n").unwrap();
    assert_eq!(config.embedding.provider, ProviderPreference::Ollama);
}

/// Unknown provider names are rejected.
#[test]
fn unknown_provider_rejected() {
    let err = load_config_from_str("[embedding]\nprovider = \"cloud\"\n")
        .expect_err("unknown provider should be rejected");
    assert!(format!("{err}").contains("cloud"), "got: {err}");
}

/// Unknown field in [storage] section produces an UnknownField error.
#[test]
fn unknown_field_in_storage_produces_error() {
    let toml = r#"
[storage]
max_bytse = 10
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("max_bytse"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.agent.log_level, "info");
    assert!(config.storage.enabled);
    assert_eq!(config.storage.storage_name, "vector-cache");
    assert_eq!(config.storage.max_bytes, 50 * 1024 * 1024);
    assert_eq!(config.embedding.provider, ProviderPreference::Auto);
    assert_eq!(config.embedding.ollama_url, "http://127.0.0.1:11434");
    assert_eq!(config.embedding.lmstudio_url, "http://127.0.0.1:1234");
    assert!(config.embedding.api_key.is_none());
    assert_eq!(config.retrieval.top_k, 12);
    assert!((config.retrieval.min_similarity - 0.18).abs() < f32::EPSILON);
    assert!(config.retrieval.use_vectors);
}

/// Dotted overrides (how env vars are merged) reach nested keys.
#[test]
fn dotted_override_reaches_nested_key() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: RecallConfig = Figment::new()
        .merge(Serialized::defaults(RecallConfig::default()))
        .merge(Toml::string("[storage]\nmax_bytes = 2048\n"))
        .merge(("storage.max_bytes", 4096))
        .extract()
        .expect("should merge override");

    assert_eq!(config.storage.max_bytes, 4096);
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telemetry]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("telemetry"),
        "got: {err_str}"
    );
}

/// Typos surface as UnknownKey diagnostics with a suggestion.
#[test]
fn load_and_validate_str_suggests_typo_fix() {
    let errors = load_and_validate_str("[retrieval]\nmin_similarty = 0.2\n")
        .expect_err("typo should be rejected");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { suggestion: Some(s), .. } if s == "min_similarity"
    )));
}

/// Semantic validation runs after a successful parse.
#[test]
fn load_and_validate_str_runs_validation() {
    let errors = load_and_validate_str("[storage]\nmax_bytes = 0\n")
        .expect_err("zero budget should fail validation");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_bytes"))));
}

/// Explicit config files are read from disk.
#[test]
fn load_and_validate_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recall.toml");
    std::fs::write(&path, "[retrieval]\ntop_k = 3\n").unwrap();

    let config = load_and_validate_path(&path).expect("file config should load");
    assert_eq!(config.retrieval.top_k, 3);
}

/// The rendered effective config parses back into the same values.
#[test]
fn rendered_config_is_loadable() {
    let mut config = RecallConfig::default();
    config.storage.max_bytes = 777;
    config.embedding.provider = ProviderPreference::LmStudio;

    let rendered = render_toml(&config).expect("config should render");
    let parsed = load_config_from_str(&rendered).expect("rendered TOML should parse");
    assert_eq!(parsed.storage.max_bytes, 777);
    assert_eq!(parsed.embedding.provider, ProviderPreference::LmStudio);
}

/// The API key is accepted on input but never rendered back out.
#[test]
fn rendered_config_omits_api_key() {
    let config = load_config_from_str("[embedding]\napi_key = \"sk-SECRET-123\"\n")
        .expect("api key should deserialize");
    assert_eq!(config.embedding.api_key.as_deref(), Some("sk-SECRET-123"));

    let rendered = render_toml(&config).expect("config should render");
    assert!(!rendered.contains("sk-SECRET-123"));
    assert!(!rendered.contains("api_key"));
}
