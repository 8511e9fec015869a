//! Search and replace with compiled patterns
//!
//! [`search`] finds the leftmost match of a [`Pattern`] at or after a given
//! token. [`search_and_replace`] splices a replacement template over every
//! match until no match remains.

pub mod list;
mod matcher;

use crate::parser::{fold_case, tokenize, Pattern};
use std::collections::HashMap;
use tracing::trace;

/// A match of a pattern in some SQL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPattern {
    /// Byte offset of the first matched character
    pub start: usize,
    /// Byte offset just past the last matched character
    pub end: usize,
    /// Index of the token where the match was anchored
    pub start_token: usize,
    /// Captured text per variable name (`@@a` style keys)
    pub variables: HashMap<String, String>,
}

/// Find the first match of `pattern` in `sql` anchored at or after `start_token`
pub fn search(sql: &str, pattern: &Pattern, start_token: usize) -> Option<MatchedPattern> {
    let folded = fold_case(sql);
    let tokens = tokenize(&folded);
    matcher::search_tokens(sql, &tokens, pattern, start_token)
}

/// Replace every match of `pattern` with `template`, after substituting the
/// captured variables into the template.
pub fn search_and_replace(sql: &str, pattern: &Pattern, template: &str) -> String {
    let mut sql = sql.to_string();
    let head = pattern.first_literal();
    let mut replacements = 0usize;
    let mut found = search(&sql, pattern, 0);

    while let Some(matched) = found {
        let replacement = substitute(template, &matched.variables);
        sql.replace_range(matched.start..matched.end, &replacement);
        replacements += 1;

        let leading = tokenize(&replacement).into_iter().next();
        let rescan = match leading {
            None => true,
            Some(token) => Some(fold_case(&token.text).as_str()) == head,
        };

        if !rescan {
            found = search(&sql, pattern, matched.start_token + 1);
            continue;
        }

        found = search(&sql, pattern, matched.start_token);
        // Rematching the same spot with no effect would never terminate
        if let Some(again) = &found {
            let unchanged = again.start == matched.start
                && substitute(template, &again.variables) == sql[again.start..again.end];
            if unchanged {
                found = search(&sql, pattern, matched.start_token + 1);
            }
        }
    }

    if replacements > 0 {
        trace!(pattern = pattern.source(), replacements, "rewrote");
    }
    sql
}

/// Replace each occurrence of a binding's key in `text` with its value.
///
/// One left-to-right pass; at each position the longest matching key wins,
/// and substituted values are never rescanned.
pub fn substitute(text: &str, bindings: &HashMap<String, String>) -> String {
    let mut names: Vec<&str> = bindings
        .keys()
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    'scan: while let Some(ch) = rest.chars().next() {
        for name in &names {
            if rest.starts_with(name) {
                result.push_str(&bindings[*name]);
                rest = &rest[name.len()..];
                continue 'scan;
            }
        }
        result.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    result
}
