//! Parameter defaults and substitution
//!
//! Templates may declare defaults with `{DEFAULT @name = value}`. Declarations
//! are removed from the output; a declared value is used for every parameter
//! the caller does not supply.

use crate::rewrite::substitute;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

const DEFAULT_OPEN: &str = "{DEFAULT ";

/// A default declaration plus trailing blanks and one line break
static DEFAULT_DECLARATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{DEFAULT[^}]*\}[ \t]*\r?\n?").unwrap());

/// Collect the defaults declared in a template, keyed by name without `@`
pub fn extract_defaults(template: &str) -> HashMap<String, String> {
    let mut defaults = HashMap::new();
    let mut from = 0;

    while let Some(offset) = template[from..].find(DEFAULT_OPEN) {
        let body_start = from + offset + DEFAULT_OPEN.len();
        let Some(length) = template[body_start..].find('}') else {
            break;
        };
        let body = &template[body_start..body_start + length];
        from = body_start + length;

        if let Some((name, value)) = body.split_once('=') {
            let name = name.trim();
            let name = name.strip_prefix('@').unwrap_or(name);
            defaults.insert(name.to_string(), strip_quotes(value.trim()).to_string());
        }
    }

    defaults
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() > 1 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Remove every default declaration from a template
pub fn remove_defaults(template: &str) -> String {
    DEFAULT_DECLARATION_RE.replace_all(template, "").into_owned()
}

/// Apply defaults, then replace each `@name` with its value.
///
/// Longer names are tried first, so `@ab` is never read as `@a` followed by `b`.
pub fn substitute_parameters(template: &str, parameters: &HashMap<String, String>) -> String {
    let mut bindings: HashMap<String, String> = extract_defaults(template)
        .into_iter()
        .map(|(name, value)| (format!("@{}", name), value))
        .collect();
    for (name, value) in parameters {
        bindings.insert(format!("@{}", name), value.clone());
    }
    bindings.retain(|name, _| name.len() > 1);

    substitute(&remove_defaults(template), &bindings)
}
