//! Conditional blocks
//!
//! A conditional block is `{condition}?{if true}` or
//! `{condition}?{if true}:{if false}`. Blocks may be nested in each other's
//! branches and conditions. Spans are found on the unmodified text, and the
//! output is written in one pass, resolving inner blocks as they are reached.

use crate::error::{Error, Result};
use crate::parser::fold_case;
use std::collections::HashMap;
use std::ops::Range;

/// A balanced `{...}` span, braces included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// The text between the braces
    fn inner(&self) -> Range<usize> {
        self.start + 1..self.end - 1
    }
}

/// A condition span linked to its branches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfThenElse {
    pub condition: Span,
    pub if_true: Span,
    pub if_false: Option<Span>,
}

impl IfThenElse {
    pub fn start(&self) -> usize {
        self.condition.start
    }

    pub fn end(&self) -> usize {
        self.if_false.unwrap_or(self.if_true).end
    }
}

/// Find balanced curly bracket spans, in the order they close.
/// Unmatched braces are ignored.
pub fn find_curly_spans(text: &str) -> Vec<Span> {
    let mut opens = Vec::new();
    let mut spans = Vec::new();
    for (i, ch) in text.char_indices() {
        match ch {
            '{' => opens.push(i),
            '}' => {
                if let Some(start) = opens.pop() {
                    spans.push(Span { start, end: i + 1 });
                }
            }
            _ => {}
        }
    }
    spans
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    let rest = &text[from..];
    from + rest.len() - rest.trim_start().len()
}

/// The span starting right after `separator`, allowing whitespace around it
fn span_after<'s>(
    text: &str,
    from: usize,
    separator: char,
    by_start: &HashMap<usize, &'s Span>,
) -> Option<&'s Span> {
    let at = skip_whitespace(text, from);
    if !text[at..].starts_with(separator) {
        return None;
    }
    let next = skip_whitespace(text, at + separator.len_utf8());
    by_start.get(&next).copied()
}

/// Link spans into conditional blocks, ordered by position
pub fn link(text: &str, spans: &[Span]) -> Vec<IfThenElse> {
    let by_start: HashMap<usize, &Span> = spans.iter().map(|span| (span.start, span)).collect();
    let mut linked: Vec<IfThenElse> = spans
        .iter()
        .filter_map(|condition| {
            let if_true = span_after(text, condition.end, '?', &by_start)?;
            let if_false = span_after(text, if_true.end, ':', &by_start).copied();
            Some(IfThenElse {
                condition: *condition,
                if_true: *if_true,
                if_false,
            })
        })
        .collect();
    linked.sort_by_key(IfThenElse::start);
    linked
}

/// Replace every conditional block with the branch its condition selects
pub fn resolve(text: &str) -> Result<String> {
    let constructs = link(text, &find_curly_spans(text));
    let mut output = String::with_capacity(text.len());
    emit(text, &constructs, 0..text.len(), &mut output)?;
    Ok(output)
}

fn emit(text: &str, constructs: &[IfThenElse], range: Range<usize>, output: &mut String) -> Result<()> {
    let mut position = range.start;
    for construct in constructs {
        // Blocks overlapping one already written are gone
        if construct.start() < position || construct.end() > range.end {
            continue;
        }
        output.push_str(&text[position..construct.start()]);

        let mut condition = String::new();
        emit(text, constructs, construct.condition.inner(), &mut condition)?;
        let branch = if evaluate_condition(&condition)? {
            Some(construct.if_true)
        } else {
            construct.if_false
        };
        if let Some(branch) = branch {
            emit(text, constructs, branch.inner(), output)?;
        }
        position = construct.end();
    }
    output.push_str(&text[position..range.end]);
    Ok(())
}

/// Evaluate a condition, collapsing parenthesized sub-expressions first.
///
/// Parentheses right after the keyword `in` hold a value list and are kept.
pub fn evaluate_condition(condition: &str) -> Result<bool> {
    let mut buffer = String::with_capacity(condition.len());
    let mut opens = Vec::new();
    for ch in condition.trim().chars() {
        match ch {
            '(' => {
                opens.push(buffer.len());
                buffer.push(ch);
            }
            ')' => match opens.pop() {
                Some(open) if !preceded_by_in(&buffer[..open]) => {
                    let value = evaluate_boolean(&buffer[open + 1..])?;
                    buffer.truncate(open);
                    buffer.push(if value { '1' } else { '0' });
                }
                _ => buffer.push(ch),
            },
            _ => buffer.push(ch),
        }
    }
    evaluate_boolean(&buffer)
}

/// Whether `prefix` ends with the word `in` followed by optional whitespace
fn preceded_by_in(prefix: &str) -> bool {
    let mut matched = 0;
    for ch in prefix.chars().rev() {
        if ch.is_whitespace() {
            if matched == 2 {
                return true;
            }
            continue;
        }
        match (matched, ch.to_ascii_lowercase()) {
            (0, 'n') | (1, 'i') => matched += 1,
            _ => return false,
        }
    }
    false
}

/// Split like a regex split: trailing empty parts are dropped
fn split_parts(expression: &str, separator: char) -> Vec<&str> {
    let mut parts: Vec<&str> = expression.split(separator).collect();
    while parts.len() > 1 && parts.last() == Some(&"") {
        parts.pop();
    }
    if parts.len() == 1 && parts[0].is_empty() && !expression.is_empty() {
        parts.clear();
    }
    parts
}

/// `&` binds the whole expression if present, otherwise `|`.
/// The two are never combined in one expression.
fn evaluate_boolean(expression: &str) -> Result<bool> {
    let expression = expression.trim();
    if expression.contains('&') {
        for part in split_parts(expression, '&') {
            if !evaluate_primitive(part)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }
    if expression.contains('|') {
        for part in split_parts(expression, '|') {
            if evaluate_primitive(part)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }
    evaluate_primitive(expression)
}

fn strip_quotes(value: &str) -> &str {
    let quoted = value.len() > 1
        && ((value.starts_with('\'') && value.ends_with('\''))
            || (value.starts_with('"') && value.ends_with('"')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn operands(left: &str, right: &str) -> (String, String) {
    (
        strip_quotes(left.trim()).to_string(),
        strip_quotes(right.trim()).to_string(),
    )
}

fn evaluate_primitive(expression: &str) -> Result<bool> {
    let expression = expression.trim();
    let folded = fold_case(expression);
    match folded.as_str() {
        "false" | "0" | "!true" | "!1" => return Ok(false),
        "true" | "1" | "!false" | "!0" => return Ok(true),
        _ => {}
    }

    if let Some((left, right)) = expression.split_once("==") {
        let (left, right) = operands(left, right);
        return Ok(left == right);
    }
    if let Some((left, right)) = expression
        .split_once("!=")
        .or_else(|| expression.split_once("<>"))
    {
        let (left, right) = operands(left, right);
        return Ok(left != right);
    }
    if let Some(found) = folded.find(" in ") {
        let left = strip_quotes(expression[..found].trim());
        let right = expression[found + 4..].trim();
        if right.len() > 2 && right.starts_with('(') && right.ends_with(')') {
            let values = &right[1..right.len() - 1];
            return Ok(values
                .split(',')
                .any(|value| strip_quotes(value.trim()) == left));
        }
    }

    Err(Error::ConditionParse {
        condition: expression.to_string(),
    })
}
