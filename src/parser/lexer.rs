//! SQL tokenization
//!
//! This module breaks SQL into a flat list of tokens. It does not try to
//! classify tokens: a token is either a run of word characters or a single
//! punctuation character. Whitespace and comments produce no tokens.

/// A token with its byte offsets into the string that was tokenized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// True when the token started inside a single- or double-quoted string
    pub in_quotes: bool,
}

impl Token {
    /// Check whether the token consists only of alphanumerics and underscores
    pub fn is_identifier(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|c| c.is_alphanumeric() || c == '_')
    }

    /// Check whether the token is a single quote character
    pub fn is_quote(&self) -> bool {
        self.text == "'" || self.text == "\""
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '@'
}

#[derive(Clone, Copy, PartialEq)]
enum Comment {
    None,
    Line,
    /// Block comment, with the offset of its opening `/`
    Block(usize),
}

/// Tokenize SQL input
pub fn tokenize(sql: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let bytes = sql.as_bytes();
    let mut start = 0;
    let mut comment = Comment::None;
    let mut in_single_quotes = false;
    let mut in_double_quotes = false;

    for (i, ch) in sql.char_indices() {
        match comment {
            Comment::Line => {
                if ch == '\n' {
                    comment = Comment::None;
                    start = i + 1;
                }
                continue;
            }
            Comment::Block(opened_at) => {
                // "/*/" does not close the comment it opens
                if ch == '/' && i >= opened_at + 3 && bytes[i - 1] == b'*' {
                    comment = Comment::None;
                    start = i + 1;
                }
                continue;
            }
            Comment::None => {}
        }

        if is_word_char(ch) {
            continue;
        }

        let in_quotes = in_single_quotes || in_double_quotes;
        if i > start {
            tokens.push(Token {
                text: sql[start..i].to_string(),
                start,
                end: i,
                in_quotes,
            });
        }

        let next = bytes.get(i + 1).copied();
        if !in_quotes && ch == '-' && next == Some(b'-') && !sql[i + 2..].starts_with("hint") {
            comment = Comment::Line;
        } else if !in_quotes && ch == '/' && next == Some(b'*') {
            comment = Comment::Block(i);
        } else if !ch.is_whitespace() {
            let end = i + ch.len_utf8();
            tokens.push(Token {
                text: sql[i..end].to_string(),
                start: i,
                end,
                in_quotes,
            });
            if ch == '\'' && !in_double_quotes {
                in_single_quotes = !in_single_quotes;
            }
            if ch == '"' && !in_single_quotes {
                in_double_quotes = !in_double_quotes;
            }
        }
        start = i + ch.len_utf8();
    }

    if sql.len() > start && comment == Comment::None {
        tokens.push(Token {
            text: sql[start..].to_string(),
            start,
            end: sql.len(),
            in_quotes: in_single_quotes || in_double_quotes,
        });
    }

    tokens
}

/// Lower-case SQL without moving any byte offsets.
///
/// Characters whose lower-case form has a different UTF-8 length are left as
/// they are, so offsets of tokens computed on the result are valid for the input.
pub fn fold_case(sql: &str) -> String {
    let mut folded = String::with_capacity(sql.len());
    for ch in sql.chars() {
        let mut lower = ch.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) if l.len_utf8() == ch.len_utf8() => folded.push(l),
            _ => folded.push(ch),
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_comment_needs_its_own_star() {
        let tokens = tokenize("a /*/ b */ c");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn fold_case_keeps_offsets() {
        let sql = "SELECT 'İstanbul' FROM T";
        assert_eq!(fold_case(sql).len(), sql.len());
        assert!(fold_case(sql).starts_with("select"));
    }
}
