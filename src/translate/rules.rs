//! Replacement rule resource loading
//!
//! The resource is comma-separated text with a header row. Each row holds a
//! target dialect, a search pattern and a replacement template. Fields may be
//! wrapped in double quotes, inside which `\"` is a quote and `\n` a newline.

use crate::error::{Error, Result};
use crate::parser::Pattern;
use std::collections::HashMap;
use tracing::debug;

/// A compiled search pattern with its replacement template
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Pattern,
    pub replacement: String,
}

/// Ordered rules per target dialect, keyed by lower-case dialect name
#[derive(Debug, Default)]
pub struct RuleTable {
    dialects: HashMap<String, Vec<Rule>>,
}

impl RuleTable {
    /// Parse a rule resource. `origin` names the resource in error messages.
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let mut dialects: HashMap<String, Vec<Rule>> = HashMap::new();

        for (number, line) in text.lines().enumerate().skip(1) {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let fields = split_fields(line);
            let [dialect, pattern, replacement, ..] = fields.as_slice() else {
                return Err(Error::ResourceLoad {
                    origin: origin.to_string(),
                    message: format!("line {}: expected 3 fields, found {}", number + 1, fields.len()),
                });
            };

            // The compiler reserves a single `@`, so the resource's own `@` are escaped by doubling
            let rule = Rule {
                pattern: Pattern::compile(&pattern.replace('@', "@@"))?,
                replacement: replacement.replace('@', "@@"),
            };
            dialects
                .entry(dialect.trim().to_lowercase())
                .or_default()
                .push(rule);
        }

        debug!(
            origin,
            dialects = dialects.len(),
            rules = dialects.values().map(Vec::len).sum::<usize>(),
            "loaded replacement rules"
        );
        Ok(Self { dialects })
    }

    /// Rules for a target dialect in application order
    pub fn rules(&self, dialect: &str) -> Option<&[Rule]> {
        self.dialects.get(&dialect.to_lowercase()).map(Vec::as_slice)
    }

    /// Target dialect names, sorted
    pub fn dialects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dialects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Split a line on commas outside double quotes, honoring backslash escapes
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut literal = false;
    let mut escape = false;
    let mut start = 0;

    for (i, ch) in line.char_indices() {
        if ch == '"' && !escape {
            literal = !literal;
        }
        if ch == ',' && !literal && !escape {
            fields.push(unquote(&line[start..i]));
            start = i + 1;
        }
        escape = ch == '\\' && !escape;
    }
    fields.push(unquote(&line[start..]));
    fields
}

fn unquote(field: &str) -> String {
    let field = match field.strip_prefix('"').and_then(|f| f.strip_suffix('"')) {
        Some(inner) => inner,
        None => field,
    };
    field.replace("\\\"", "\"").replace("\\n", "\n")
}
