//! BigQuery rewrites applied before the replacement rules
//!
//! BigQuery does not accept column lists on common table expressions and is
//! picky about GROUP BY / ORDER BY expressions that repeat a select list
//! expression. Both are fixed here with the pattern matcher, on SQL that has
//! first been lower-cased outside string literals.

use crate::error::Result;
use crate::parser::{fold_case, tokenize, Pattern};
use crate::rewrite::list::{DelimitedList, ListKind};
use crate::rewrite::{search, substitute, MatchedPattern};
use std::collections::HashMap;
use tracing::debug;

const CTE_PATTERNS: [&str; 4] = [
    "with @@a (@@b) as (select @@c from @@d)",
    "with @@a (@@b) as (select @@c union @@d)",
    "with @@a (@@b) as (select @@c)",
    ", @@a (@@b) as (select @@c from @@d)",
];

const GROUP_BY_PATTERN: &str = "select @@s from @@b group by @@r";
const ORDER_BY_PATTERN: &str = "select @@s from @@b order by @@r";

/// Apply all BigQuery rewrites
pub fn rewrite(sql: &str) -> Result<String> {
    let mut sql = lower_case(sql);

    for pattern in CTE_PATTERNS {
        sql = alias_common_table_expressions(&sql, pattern)?;
    }
    for terminator in [";", ")", " having", " order by"] {
        let pattern = format!("{}{}", GROUP_BY_PATTERN, terminator);
        sql = convert_select_list_references(&sql, &pattern, ListKind::GroupBy)?;
    }
    for terminator in [";", ")"] {
        let pattern = format!("{}{}", ORDER_BY_PATTERN, terminator);
        sql = convert_select_list_references(&sql, &pattern, ListKind::OrderBy)?;
    }

    Ok(sql)
}

/// Lower-case every token outside string literals, except `@` parameters
pub fn lower_case(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut copied = 0;
    for token in tokenize(sql) {
        if token.in_quotes || token.text.starts_with('@') {
            continue;
        }
        result.push_str(&sql[copied..token.start]);
        result.push_str(&token.text.to_lowercase());
        copied = token.end;
    }
    result.push_str(&sql[copied..]);
    result
}

fn captured<'m>(matched: &'m MatchedPattern, name: &str) -> &'m str {
    matched.variables.get(name).map_or("", |value| value.trim())
}

/// Move a CTE's column list onto aliases in its select list
fn alias_common_table_expressions(sql: &str, template: &str) -> Result<String> {
    let pattern = Pattern::compile(template)?;
    let mut sql = sql.to_string();
    let mut found = search(&sql, &pattern, 0);

    while let Some(matched) = found {
        let name = captured(&matched, "@@a");
        let columns = DelimitedList::parse(captured(&matched, "@@b"), ListKind::WithColumns)?;

        if tokenize(name).len() == 1 && !columns.is_empty() {
            let mut select = DelimitedList::parse(captured(&matched, "@@c"), ListKind::Select)?;
            for (element, column) in select.elements.iter_mut().zip(&columns.elements) {
                element.suffix = format!("as {}", column.full());
            }

            let bindings = HashMap::from([
                ("@@a".to_string(), name.to_string()),
                (" (@@b)".to_string(), String::new()),
                ("@@c".to_string(), select.to_string()),
                ("@@d".to_string(), captured(&matched, "@@d").to_string()),
            ]);
            let replacement = substitute(template, &bindings);
            debug!(cte = name, columns = columns.len(), "aliased common table expression");
            sql.replace_range(matched.start..matched.end, &replacement);
        }

        found = search(&sql, &pattern, matched.start_token + 1);
    }

    Ok(sql)
}

/// Replace GROUP BY or ORDER BY expressions that repeat a select list
/// expression with that expression's ordinal
fn convert_select_list_references(sql: &str, template: &str, kind: ListKind) -> Result<String> {
    let pattern = Pattern::compile(template)?;
    // The last statement of a script may lack its semicolon
    let terminated = template.ends_with(';');
    let mut sql = if terminated { format!("{};", sql) } else { sql.to_string() };
    let mut found = search(&sql, &pattern, 0);

    while let Some(matched) = found {
        let select = DelimitedList::parse(captured(&matched, "@@s"), ListKind::Select)?;
        let mut list = DelimitedList::parse(captured(&matched, "@@r"), kind)?;

        let mut changed = false;
        for element in &mut list.elements {
            if element.is_single_column_reference() || tokenize(&element.expression).len() < 2 {
                continue;
            }
            let ordinal = select
                .elements
                .iter()
                .position(|s| same_tokens(&s.expression, &element.expression));
            if let Some(ordinal) = ordinal {
                element.expression = (ordinal + 1).to_string();
                changed = true;
            }
        }

        if changed {
            let replacement = rebuild(&pattern, &matched, &list.to_string());
            sql.replace_range(matched.start..matched.end, &replacement);
        }

        found = search(&sql, &pattern, matched.start_token + 1);
    }

    if terminated {
        sql.pop();
    }
    Ok(sql)
}

/// Reassemble a matched statement from its pattern, swapping in a new `@@r`
fn rebuild(pattern: &Pattern, matched: &MatchedPattern, list: &str) -> String {
    let mut result = String::new();
    for block in pattern.blocks() {
        let text = match block.text() {
            "@@r" => list,
            name if block.is_variable => captured(matched, name),
            literal => literal,
        };
        if !result.is_empty() && text != ";" && text != ")" {
            result.push(' ');
        }
        result.push_str(text);
    }
    result
}

fn same_tokens(a: &str, b: &str) -> bool {
    let a = tokenize(&fold_case(a));
    let b = tokenize(&fold_case(b));
    a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.text == y.text)
}
