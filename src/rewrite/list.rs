//! Comma-separated list handling
//!
//! Dialect rewriters often need to walk a select list, a GROUP BY list or a
//! CTE column list element by element. [`DelimitedList`] splits such a list on
//! its top-level commas using the pattern matcher, so commas inside function
//! calls, subqueries and string literals are left alone.

use super::search;
use crate::error::Result;
use crate::parser::{fold_case, tokenize, Pattern, Token};
use std::fmt;

/// The kind of list being parsed, which decides what may surround the elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// A select list: optional leading `distinct`, trailing `into`, element aliases
    Select,
    /// A GROUP BY list, possibly followed by an ORDER BY clause
    GroupBy,
    /// An ORDER BY list with optional `asc`/`desc` per element
    OrderBy,
    /// Column names of a common table expression
    WithColumns,
    /// The values of an IN list
    In,
}

/// One element of a delimited list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListElement {
    pub expression: String,
    /// Alias clause for select lists, sort direction for ORDER BY lists
    pub suffix: String,
}

impl ListElement {
    fn parse(text: &str, kind: ListKind) -> Self {
        let text = text.trim();
        let (expression, suffix) = match kind {
            ListKind::Select => split_alias(text),
            ListKind::OrderBy => split_direction(text),
            ListKind::GroupBy | ListKind::WithColumns | ListKind::In => (text, ""),
        };
        Self {
            expression: expression.trim().to_string(),
            suffix: suffix.trim().to_string(),
        }
    }

    /// The element as it appears in SQL
    pub fn full(&self) -> String {
        if self.suffix.is_empty() {
            self.expression.clone()
        } else {
            format!("{} {}", self.expression, self.suffix)
        }
    }

    /// True for exactly `identifier . identifier`
    pub fn is_single_column_reference(&self) -> bool {
        let tokens = tokenize(&self.expression);
        matches!(
            tokens.as_slice(),
            [table, dot, column] if table.is_identifier() && dot.text == "." && column.is_identifier()
        )
    }
}

/// A parsed comma-separated list with the clauses around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedList {
    /// Text before the first element, such as `distinct`
    pub prefix: String,
    pub elements: Vec<ListElement>,
    /// Text after the last element, such as an `into` or `order by` clause
    pub suffix: String,
}

impl DelimitedList {
    /// Split `text` into list elements according to `kind`
    pub fn parse(text: &str, kind: ListKind) -> Result<Self> {
        let folded = fold_case(text);
        let tokens = tokenize(&folded);
        let top = top_level(&tokens);

        let mut list_start = 0;
        let mut list_end = text.len();
        match kind {
            ListKind::Select => {
                if let Some(&first) = top.first() {
                    if tokens[first].text == "distinct" {
                        list_start = tokens[first].end;
                    }
                }
                if let Some(&into) = top.iter().find(|&&i| tokens[i].text == "into") {
                    list_end = tokens[into].start;
                }
            }
            ListKind::GroupBy => {
                let order_by = top
                    .windows(2)
                    .find(|pair| tokens[pair[0]].text == "order" && tokens[pair[1]].text == "by");
                if let Some(pair) = order_by {
                    list_end = tokens[pair[0]].start;
                }
            }
            ListKind::OrderBy | ListKind::WithColumns | ListKind::In => {}
        }
        let list_end = list_end.max(list_start);

        Ok(Self {
            prefix: text[..list_start].trim().to_string(),
            elements: split_elements(&text[list_start..list_end], kind)?,
            suffix: text[list_end..].trim().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Display for DelimitedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.prefix.is_empty() {
            write!(f, "{} ", self.prefix)?;
        }
        let elements: Vec<String> = self.elements.iter().map(ListElement::full).collect();
        write!(f, "{}", elements.join(", "))?;
        if !self.suffix.is_empty() {
            write!(f, " {}", self.suffix)?;
        }
        Ok(())
    }
}

fn split_elements(list: &str, kind: ListKind) -> Result<Vec<ListElement>> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }

    let pattern = Pattern::compile(", @@a ,")?;
    let padded = format!(",{},", list);
    let mut elements = Vec::new();
    let mut start_token = 0;

    while let Some(matched) = search(&padded, &pattern, start_token) {
        let captured = matched.variables.get("@@a").map(String::as_str).unwrap_or_default();
        elements.push(ListElement::parse(captured, kind));
        // The closing comma opens the next element
        let consumed = tokenize(&padded[matched.start..matched.end]).len();
        start_token = matched.start_token + consumed.saturating_sub(1).max(1);
    }

    Ok(elements)
}

/// Indices of tokens outside any parentheses and string literals
fn top_level(tokens: &[Token]) -> Vec<usize> {
    let mut depth = 0usize;
    let mut top = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if token.in_quotes {
            continue;
        }
        match token.text.as_str() {
            "(" => {
                if depth == 0 {
                    top.push(i);
                }
                depth += 1;
            }
            ")" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    top.push(i);
                }
            }
            _ if depth == 0 => top.push(i),
            _ => {}
        }
    }
    top
}

const OPERATORS: &[&str] = &[".", "+", "-", "*", "/", "%", "=", "<", ">", ",", "|", "&"];

/// Split `expr [as] alias` into expression and alias clause
fn split_alias(text: &str) -> (&str, &str) {
    let folded = fold_case(text);
    let tokens = tokenize(&folded);
    let top = top_level(&tokens);

    if let Some(pos) = top.iter().skip(1).rposition(|&i| tokens[i].text == "as") {
        let as_token = &tokens[top[pos + 1]];
        return (&text[..as_token.start], &text[as_token.start..]);
    }

    if let [.., before, last] = top.as_slice() {
        let alias = &tokens[*last];
        let before = &tokens[*before];
        let looks_like_alias = *last + 1 == tokens.len()
            && alias.is_identifier()
            && !alias.text.starts_with(|c: char| c.is_ascii_digit())
            && alias.text != "end"
            && !OPERATORS.contains(&before.text.as_str());
        if looks_like_alias {
            return (&text[..alias.start], &text[alias.start..]);
        }
    }

    (text, "")
}

/// Split `expr asc|desc` into expression and direction
fn split_direction(text: &str) -> (&str, &str) {
    let folded = fold_case(text);
    let tokens = tokenize(&folded);
    match tokens.as_slice() {
        [_, .., last] if !last.in_quotes && (last.text == "asc" || last.text == "desc") => {
            (&text[..last.start], &text[last.start..])
        }
        _ => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_skips_parenthesized_tokens() {
        let tokens = tokenize("f(a, b) x");
        let texts: Vec<&str> = top_level(&tokens).into_iter().map(|i| tokens[i].text.as_str()).collect();
        assert_eq!(texts, vec!["f", "(", ")", "x"]);
    }

    #[test]
    fn alias_is_not_taken_from_qualified_name() {
        assert_eq!(split_alias("t.col"), ("t.col", ""));
        assert_eq!(split_alias("a + b total"), ("a + b ", "total"));
    }
}
