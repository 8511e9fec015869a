//! Statement splitting
//!
//! Splits a script on the semicolons that end statements, ignoring those
//! inside `BEGIN ... END` blocks, `CASE ... END` expressions, `[bracketed]`
//! names and string literals.

use crate::parser::{fold_case, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opaque {
    None,
    Quote(char),
    Bracket,
}

/// Split SQL into individual statements.
///
/// The terminating semicolon is dropped, except after an `END` closing a
/// `BEGIN` block (some dialects require it there) and for a semicolon that
/// is the very first token. Text after the last semicolon becomes a final
/// statement.
pub fn split_statements(sql: &str) -> Vec<String> {
    let folded = fold_case(sql);
    let tokens = tokenize(&folded);
    let mut statements = Vec::new();
    let mut nest: Vec<&str> = Vec::new();
    let mut last_pop = "";
    let mut opaque = Opaque::None;
    let mut start = 0;

    for (cursor, token) in tokens.iter().enumerate() {
        let text = token.text.as_str();
        match opaque {
            Opaque::Quote(quote) => {
                if text.len() == 1 && text.starts_with(quote) {
                    opaque = Opaque::None;
                }
                continue;
            }
            Opaque::Bracket => {
                if text == "]" {
                    opaque = Opaque::None;
                }
                continue;
            }
            Opaque::None => {}
        }

        match text {
            "'" => opaque = Opaque::Quote('\''),
            "\"" => opaque = Opaque::Quote('"'),
            "[" => opaque = Opaque::Bracket,
            "begin" | "case" => nest.push(text),
            // END IF closes a conditional statement, not a block
            "end" if tokens.get(cursor + 1).map_or(true, |next| next.text != "if") => {
                if let Some(popped) = nest.pop() {
                    last_pop = popped;
                }
            }
            ";" if nest.is_empty() => {
                let keep_semicolon = cursor == 0
                    || (tokens[cursor - 1].text == "end" && last_pop == "begin");
                let end = if keep_semicolon { token.end } else { token.start };
                let begin = tokens[start].start.min(end);
                statements.push(sql[begin..end].to_string());
                start = cursor + 1;
            }
            _ => {}
        }
    }

    if start < tokens.len() {
        let last = &tokens[tokens.len() - 1];
        statements.push(sql[tokens[start].start..last.end].to_string());
    }

    statements
}
