//! Template rendering
//!
//! Rendering runs in two passes:
//! 1. Parameters: apply `{DEFAULT ...}` declarations and replace `@name` references
//! 2. Conditions: replace `{condition}?{then}:{else}` blocks with the selected branch

pub mod conditions;
pub mod params;

use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::trace;

/// Render a template with parallel arrays of parameter names (without `@`) and values
pub fn render(template: &str, names: &[&str], values: &[&str]) -> Result<String> {
    if names.len() != values.len() {
        return Err(Error::ParameterMismatch {
            names: names.len(),
            values: values.len(),
        });
    }
    let parameters: HashMap<String, String> = names
        .iter()
        .zip(values)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    render_sql(template, &parameters)
}

/// Render a template with a map of parameter names (without `@`) to values
pub fn render_sql(template: &str, parameters: &HashMap<String, String>) -> Result<String> {
    let substituted = params::substitute_parameters(template, parameters);
    trace!(parameters = parameters.len(), "substituted parameters");
    conditions::resolve(&substituted)
}

/// Warn about parameter names the SQL never references
pub fn check_render(sql: &str, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .filter(|name| !sql.contains(&format!("@{}", name)))
        .map(|name| format!("Parameter '{}' not found in SQL", name))
        .collect()
}
