//! Error types for sqlport

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for sqlport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sqlport
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Error in search pattern: {message}: {pattern}")]
    #[diagnostic(
        code(sqlport::pattern_definition),
        help("this usually means the replacement rule resource contains a bad row")
    )]
    PatternDefinition { pattern: String, message: String },

    #[error(
        "Don't know how to translate from {source_dialect} to {target}. Valid target dialects are {}",
        .valid.join(", ")
    )]
    #[diagnostic(code(sqlport::unknown_dialect))]
    UnknownDialect {
        source_dialect: String,
        target: String,
        valid: Vec<String>,
    },

    #[error("Invalid session ID '{session_id}': {reason}")]
    #[diagnostic(
        code(sqlport::invalid_session_id),
        help("session IDs are 8 characters, start with a letter and are otherwise alphanumeric")
    )]
    InvalidSessionId { session_id: String, reason: String },

    #[error("Error parsing boolean condition: \"{condition}\"")]
    #[diagnostic(code(sqlport::condition_parse))]
    ConditionParse { condition: String },

    #[error("Failed to load replacement rules from {origin}: {message}")]
    #[diagnostic(code(sqlport::resource_load))]
    ResourceLoad { origin: String, message: String },

    #[error("Parameter names and values differ in length ({names} names, {values} values)")]
    #[diagnostic(code(sqlport::parameter_mismatch))]
    ParameterMismatch { names: usize, values: usize },

    #[error("Config error: {message}")]
    #[diagnostic(code(sqlport::config_error))]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(sqlport::io_error))]
    IoError(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn pattern(pattern: &str, message: impl Into<String>) -> Self {
        Error::PatternDefinition {
            pattern: pattern.to_string(),
            message: message.into(),
        }
    }
}
