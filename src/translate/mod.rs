//! Dialect translation
//!
//! Translation applies the ordered replacement rules of the target dialect to
//! the SQL, each rule rewriting until it no longer matches. Rules come from a
//! [`RuleCache`], which loads its resource once and keeps the compiled table
//! for the rest of its life.

pub mod bigquery;
pub mod check;
pub mod rules;
pub mod session;

use crate::error::{Error, Result};
use crate::parser::tokenize;
use crate::rewrite::search_and_replace;
use rules::RuleTable;
use session::{global_session_id, validate_session_id};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::{LazyLock, Mutex, OnceLock, PoisonError};
use tracing::{debug, instrument};

pub use check::{check_translate, CheckOptions};
pub use session::{generate_session_id, SESSION_ID_LENGTH};

/// The dialect all input SQL is written in
pub const SOURCE_DIALECT: &str = "sql server";

const EMBEDDED_RULES: &str = include_str!("../../rules/replacement_patterns.csv");

/// Per-call translation settings
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Id appended to emulated temp table names; the process-wide id when `None`
    pub session_id: Option<String>,
    /// Schema that emulated temp tables are created in
    pub temp_schema: Option<String>,
    /// Rule resource to use instead of the embedded one
    pub rule_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
enum RuleSource {
    Embedded,
    File(PathBuf),
}

/// Lazily loaded replacement rules
#[derive(Debug)]
pub struct RuleCache {
    source: RuleSource,
    table: OnceLock<RuleTable>,
    loading: Mutex<()>,
}

impl RuleCache {
    /// A cache over the rules compiled into the crate
    pub fn embedded() -> Self {
        Self::new(RuleSource::Embedded)
    }

    /// A cache over a rule file on disk
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(RuleSource::File(path.into()))
    }

    fn new(source: RuleSource) -> Self {
        Self {
            source,
            table: OnceLock::new(),
            loading: Mutex::new(()),
        }
    }

    /// The rule table, loading it on first use.
    ///
    /// A failed load is reported and leaves the cache empty, so the next
    /// call tries again.
    pub fn table(&self) -> Result<&RuleTable> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }

        let _guard = self.loading.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have finished loading while we waited
        if let Some(table) = self.table.get() {
            return Ok(table);
        }

        let table = self.load()?;
        Ok(self.table.get_or_init(|| table))
    }

    fn load(&self) -> Result<RuleTable> {
        match &self.source {
            RuleSource::Embedded => RuleTable::parse(EMBEDDED_RULES, "embedded rules"),
            RuleSource::File(path) => {
                let origin = path.display().to_string();
                let text = std::fs::read_to_string(path).map_err(|e| Error::ResourceLoad {
                    origin: origin.clone(),
                    message: e.to_string(),
                })?;
                RuleTable::parse(&text, &origin)
            }
        }
    }

    /// Every dialect SQL can be translated to, including the source dialect
    pub fn dialects(&self) -> Result<Vec<String>> {
        let table = self.table()?;
        let mut dialects: Vec<String> = table.dialects().into_iter().map(str::to_string).collect();
        if !dialects.iter().any(|d| d == SOURCE_DIALECT) {
            dialects.push(SOURCE_DIALECT.to_string());
        }
        dialects.sort();
        Ok(dialects)
    }

    /// Translate SQL Server SQL into the `target` dialect
    #[instrument(skip(self, sql, options))]
    pub fn translate(&self, sql: &str, target: &str, options: &TranslateOptions) -> Result<String> {
        let table = self.table()?;

        let session_id = match &options.session_id {
            Some(id) => {
                validate_session_id(id)?;
                id.as_str()
            }
            None => global_session_id(),
        };
        let temp_prefix = options
            .temp_schema
            .as_deref()
            .map(|schema| format!("{}.", schema))
            .unwrap_or_default();

        let target = target.trim().to_lowercase();
        let Some(rules) = table.rules(&target) else {
            if target == SOURCE_DIALECT {
                return Ok(sql.to_string());
            }
            return Err(Error::UnknownDialect {
                source_dialect: SOURCE_DIALECT.to_string(),
                target,
                valid: self.dialects()?,
            });
        };

        let mut sql = if target == "bigquery" {
            bigquery::rewrite(sql)?
        } else {
            sql.to_string()
        };

        for rule in rules {
            let replacement = rule
                .replacement
                .replace("%session_id%", session_id)
                .replace("%temp_prefix%", &temp_prefix);
            sql = search_and_replace(&sql, &rule.pattern, &replacement);
        }
        debug!(rules = rules.len(), "applied replacement rules");

        Ok(strip_blank_lines(&sql))
    }
}

static DEFAULT_RULES: LazyLock<RuleCache> = LazyLock::new(RuleCache::embedded);

/// Translate SQL Server SQL into the `target` dialect.
///
/// Uses the embedded rules unless `options.rule_path` is set, in which case
/// that file is loaded for this call only. Callers translating many times
/// with one rule file should keep their own [`RuleCache`].
pub fn translate(sql: &str, target: &str, options: &TranslateOptions) -> Result<String> {
    match &options.rule_path {
        Some(path) => RuleCache::from_path(path).translate(sql, target, options),
        None => DEFAULT_RULES.translate(sql, target, options),
    }
}

/// Remove lines holding only whitespace, unless they are part of a string literal
fn strip_blank_lines(sql: &str) -> String {
    let quoted = quoted_ranges(sql);
    let mut result = String::with_capacity(sql.len());
    let mut offset = 0;
    for line in sql.split_inclusive('\n') {
        let in_string = quoted.iter().any(|r| r.start < offset && offset < r.end);
        if in_string || !line.trim().is_empty() {
            result.push_str(line);
        }
        offset += line.len();
    }
    result
}

/// Byte ranges of string literals, quotes included
fn quoted_ranges(sql: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut open: Option<(usize, String)> = None;
    for token in tokenize(sql).into_iter().filter(|t| t.is_quote()) {
        match &open {
            None if !token.in_quotes => open = Some((token.start, token.text)),
            Some((start, quote)) if *quote == token.text => {
                ranges.push(*start..token.end);
                open = None;
            }
            _ => {}
        }
    }
    if let Some((start, _)) = open {
        ranges.push(start..sql.len());
    }
    ranges
}
