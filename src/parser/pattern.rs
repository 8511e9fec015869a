//! Search pattern compilation
//!
//! A search pattern is SQL text in which `@@name` tokens capture arbitrary
//! spans of the input. `@@(regex)name` captures a span that must also match
//! the regular expression.

use crate::error::{Error, Result};
use crate::parser::lexer::{fold_case, tokenize, Token};
use regex::{Regex, RegexBuilder};

/// A compiled regular expression constraint on a pattern variable
#[derive(Debug, Clone)]
pub struct RegexConstraint {
    source: String,
    /// Matches at the start of the haystack only
    anchored: Regex,
    /// Matches the complete haystack only
    full: Regex,
}

impl RegexConstraint {
    fn compile(source: &str) -> std::result::Result<Self, regex::Error> {
        let build = |expr: String| {
            RegexBuilder::new(&expr)
                .case_insensitive(true)
                .multi_line(true)
                .dot_matches_new_line(true)
                .build()
        };
        Ok(Self {
            source: source.to_string(),
            anchored: build(format!(r"\A(?:{})", source))?,
            full: build(format!(r"\A(?:{})\z", source))?,
        })
    }

    /// The regular expression as written in the pattern
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Length of the match starting at the first byte of `text`, if any
    pub fn match_prefix(&self, text: &str) -> Option<usize> {
        self.anchored.find(text).map(|m| m.end())
    }

    /// Check whether the whole of `text` matches
    pub fn matches_fully(&self, text: &str) -> bool {
        self.full.is_match(text)
    }
}

/// One element of a compiled pattern
#[derive(Debug, Clone)]
pub struct Block {
    pub token: Token,
    pub is_variable: bool,
    pub regex: Option<RegexConstraint>,
}

impl Block {
    pub fn text(&self) -> &str {
        &self.token.text
    }

    /// A variable without a regex has no intrinsic stopping rule
    pub fn is_plain_variable(&self) -> bool {
        self.is_variable && self.regex.is_none()
    }
}

/// A compiled search pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    blocks: Vec<Block>,
}

impl Pattern {
    /// Compile a search pattern
    pub fn compile(pattern: &str) -> Result<Self> {
        let tokens = tokenize(&fold_case(pattern));
        let mut blocks = Vec::with_capacity(tokens.len());

        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            let opens_regex = token.text == "@@"
                && i + 2 < tokens.len()
                && tokens[i + 1].text == "(";

            if opens_regex {
                let close = find_regex_close(&tokens, i + 2).ok_or_else(|| {
                    Error::pattern(pattern, "unterminated regular expression variable")
                })?;
                let name = tokens
                    .get(close + 1)
                    .ok_or_else(|| Error::pattern(pattern, "regular expression variable has no name"))?;
                let source = &pattern[tokens[i + 1].end..tokens[close].start];
                let regex = RegexConstraint::compile(source)
                    .map_err(|e| Error::pattern(pattern, format!("invalid regular expression: {}", e)))?;
                blocks.push(Block {
                    token: Token {
                        text: format!("@@{}", name.text),
                        start: token.start,
                        end: name.end,
                        in_quotes: token.in_quotes,
                    },
                    is_variable: true,
                    regex: Some(regex),
                });
                i = close + 2;
                continue;
            }

            blocks.push(Block {
                token: token.clone(),
                is_variable: token.text.len() > 2 && token.text.starts_with('@'),
                regex: None,
            });
            i += 1;
        }

        match (blocks.first(), blocks.last()) {
            (None, _) | (_, None) => Err(Error::pattern(pattern, "pattern is empty")),
            (Some(first), Some(last)) if first.is_plain_variable() || last.is_plain_variable() => Err(
                Error::pattern(pattern, "pattern cannot start or end with a non-regex variable"),
            ),
            _ => Ok(Self {
                source: pattern.to_string(),
                blocks,
            }),
        }
    }

    /// The pattern text as given to [`Pattern::compile`]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Text of the first literal block, if the pattern has one
    pub fn first_literal(&self) -> Option<&str> {
        self.blocks.iter().find(|b| !b.is_variable).map(Block::text)
    }
}

/// Find the token index of the `)` closing a regex that starts at `from`
fn find_regex_close(tokens: &[Token], from: usize) -> Option<usize> {
    let mut escape = false;
    let mut nesting = 0usize;
    for (j, token) in tokens.iter().enumerate().skip(from) {
        match token.text.as_str() {
            "\\" => {
                escape = !escape;
                continue;
            }
            "(" if !escape => nesting += 1,
            ")" if !escape => {
                if nesting == 0 {
                    return Some(j);
                }
                nesting -= 1;
            }
            _ => {}
        }
        escape = false;
    }
    None
}
