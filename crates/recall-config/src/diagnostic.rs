// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config error diagnostics.
//!
//! Figment errors are mapped onto Recall's four config sections: unknown
//! sections and keys get a "did you mean?" suggestion drawn from the section's
//! real key list, keys written under the wrong section point at their home
//! section, and every error that came from a TOML file carries a source span.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Keys accepted in each section of `recall.toml`, as declared in `model.rs`.
pub const SECTIONS: &[(&str, &[&str])] = &[
    ("agent", &["log_level"]),
    (
        "storage",
        &["enabled", "database_path", "storage_name", "max_bytes", "wal_mode"],
    ),
    (
        "embedding",
        &[
            "provider",
            "model",
            "remote_url",
            "ollama_url",
            "lmstudio_url",
            "api_key",
            "probe_timeout_ms",
            "request_timeout_secs",
            "fallback_dimensions",
        ],
    ),
    ("retrieval", &["top_k", "min_similarity", "use_vectors", "limit"]),
];

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A top-level table that Recall does not have.
    #[error("unknown configuration section `[{section}]`")]
    #[diagnostic(
        code(recall::config::unknown_section),
        help("{}", suggestion_help(suggestion.as_deref(), &section_names()))
    )]
    UnknownSection {
        section: String,
        suggestion: Option<String>,
        #[label("no such section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A key that no section accepts.
    #[error("unknown key `{key}` in `[{section}]`")]
    #[diagnostic(
        code(recall::config::unknown_key),
        help("{}", suggestion_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        section: String,
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A valid key written under the wrong section.
    #[error("key `{key}` does not belong in `[{section}]`")]
    #[diagnostic(
        code(recall::config::misplaced_key),
        help("move `{key}` under `[{home}]`")
    )]
    MisplacedKey {
        section: String,
        key: String,
        home: String,
        #[label("belongs in another section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong type.
    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(recall::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that parsed but breaks a semantic constraint.
    #[error("validation error: {message}")]
    #[diagnostic(code(recall::config::validation))]
    Validation { message: String },

    /// Any other figment or rendering failure.
    #[error("configuration error: {0}")]
    #[diagnostic(code(recall::config::other))]
    Other(String),
}

fn section_names() -> String {
    SECTIONS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn section_keys(section: &str) -> Option<&'static [&'static str]> {
    SECTIONS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, keys)| *keys)
}

/// The section that declares `key`, if any.
fn home_section(key: &str) -> Option<&'static str> {
    SECTIONS
        .iter()
        .find(|(_, keys)| keys.contains(&key))
        .map(|(name, _)| *name)
}

fn suggestion_help(suggestion: Option<&str>, valid: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid: {valid}"),
        None => format!("valid: {valid}"),
    }
}

/// Convert a `figment::Error` into one diagnostic per underlying error.
///
/// `toml_sources` pairs each file path with its content so spans can be
/// attached; a single source is used for errors that carry no file path.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let source = source_for(&error, toml_sources);
            let mut path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, _) => {
                    if path.last() == Some(field) {
                        path.pop();
                    }
                    unknown_field(path.first().map(String::as_str), field, source)
                }
                Kind::InvalidType(actual, expected) => {
                    let key = path.join(".");
                    let located = path.split_last().and_then(|(field, section)| {
                        locate(source, section.first().map(String::as_str), field)
                    });
                    let (span, src) = split(located);
                    ConfigError::InvalidType {
                        key,
                        detail: format!("found {actual}, expected {expected}"),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn unknown_field(section: Option<&str>, field: &str, source: Option<(&str, &str)>) -> ConfigError {
    let Some(section) = section else {
        let names: Vec<&str> = SECTIONS.iter().map(|(name, _)| *name).collect();
        let (span, src) = split(locate(source, None, field));
        return ConfigError::UnknownSection {
            section: field.to_string(),
            suggestion: suggest_key(field, &names),
            span,
            src,
        };
    };

    let (span, src) = split(locate(source, Some(section), field));
    match home_section(field) {
        Some(home) if home != section => ConfigError::MisplacedKey {
            section: section.to_string(),
            key: field.to_string(),
            home: home.to_string(),
            span,
            src,
        },
        _ => {
            let keys = section_keys(section).unwrap_or(&[]);
            ConfigError::UnknownKey {
                section: section.to_string(),
                key: field.to_string(),
                suggestion: suggest_key(field, keys),
                valid_keys: keys.join(", "),
                span,
                src,
            }
        }
    }
}

/// Pick the TOML source an error came from.
fn source_for<'a>(
    error: &figment::Error,
    toml_sources: &'a [(String, String)],
) -> Option<(&'a str, &'a str)> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });
    let found = match file {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };
    found.map(|(p, content)| (p.as_str(), content.as_str()))
}

type Located = Option<(SourceSpan, NamedSource<String>)>;

fn locate(source: Option<(&str, &str)>, section: Option<&str>, key: &str) -> Located {
    let (path, content) = source?;
    let span = find_key_span(content, section, key)?;
    Some((span, NamedSource::new(path, content.to_string())))
}

fn split(located: Located) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    match located {
        Some((span, src)) => (Some(span), Some(src)),
        None => (None, None),
    }
}

/// Locate `key` in TOML `content`.
///
/// With `section = Some(name)`, only keys inside the `[name]` table match.
/// With `section = None`, `key` is a table name and its `[key]` header
/// matches.
pub fn find_key_span(content: &str, section: Option<&str>, key: &str) -> Option<SourceSpan> {
    let mut offset = 0;
    let mut current: Option<&str> = None;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        let indent = line.len() - line.trim_start().len();

        if let Some(name) = trimmed.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            let name = name.trim();
            if section.is_none() && name == key {
                let column = line.find(key).unwrap_or(indent);
                return Some(SourceSpan::new((offset + column).into(), key.len()));
            }
            current = Some(name);
        } else if section.is_some() && current == section {
            let rest = trimmed.strip_prefix(key);
            if rest.is_some_and(|r| r.starts_with([' ', '\t', '='])) {
                return Some(SourceSpan::new((offset + indent).into(), key.len()));
            }
        }
        offset += line.len();
    }
    None
}

/// Best Jaro-Winkler match for `unknown` among `candidates`.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(unknown, c), *c))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        eprint!("{}", render_with(&handler, error));
    }
}

fn render_with(handler: &miette::GraphicalReportHandler, error: &ConfigError) -> String {
    let mut buf = String::new();
    match handler.render_report(&mut buf, error as &dyn Diagnostic) {
        Ok(()) => buf,
        Err(_) => format!("Error: {error}\n"),
    }
}
