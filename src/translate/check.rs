//! Warnings about SQL that is likely to fail after translation

use super::session::SESSION_ID_LENGTH;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static TEMP_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#[0-9a-zA-Z_]+").unwrap());

static TABLE_DDL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:create|drop|truncate)\s+table +([0-9a-zA-Z_]+)").unwrap()
});

/// Options for [`check_translate`]
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Longest identifier the target dialects accept
    pub max_identifier_length: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            max_identifier_length: 63,
        }
    }
}

/// Warn about table names that will be too long in the target dialect.
///
/// Temp table names (`#name`) get a smaller budget since emulating them
/// appends the session id.
pub fn check_translate(sql: &str, target: &str, options: &CheckOptions) -> Vec<String> {
    let limit = options.max_identifier_length;
    let temp_limit = limit.saturating_sub(SESSION_ID_LENGTH + 1);

    let long_temp_names: BTreeSet<&str> = TEMP_TABLE_RE
        .find_iter(sql)
        .map(|m| m.as_str())
        .filter(|name| name.chars().count() > temp_limit)
        .collect();

    let long_names: BTreeSet<&str> = TABLE_DDL_RE
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| name.chars().count() > limit)
        .collect();

    let mut warnings: Vec<String> = long_temp_names
        .iter()
        .map(|name| {
            format!(
                "Temp table name '{}' is too long. Temp table names should be shorter than {} characters to prevent {} from crashing.",
                name,
                limit.saturating_sub(SESSION_ID_LENGTH),
                target
            )
        })
        .collect();
    warnings.extend(long_names.iter().map(|name| {
        format!(
            "Table name '{}' is too long. Table names should be shorter than {} characters to prevent {} from crashing.",
            name, limit, target
        )
    }));
    warnings
}
