//! Nesting-aware pattern matcher
//!
//! The matcher walks the tokens of the (case-folded) SQL once per attempt.
//! Each token is fed to [`Matcher::step`], which reports what the driver loop
//! in [`search_tokens`] should do next. A failed attempt never backtracks to
//! the failure point: the whole pattern is retried from the token after the
//! attempt's anchor.

use super::MatchedPattern;
use crate::parser::{Block, Pattern, RegexConstraint, Token};
use std::collections::HashMap;

/// Outcome of feeding one token to the matcher
#[derive(Debug)]
pub(crate) enum Step {
    /// Move on to the next token
    Continue,
    /// Move on to the given token, keeping the current attempt
    SkipTo(usize),
    /// The attempt failed; start a new one at the given token
    RestartAt(usize),
    Matched(MatchedPattern),
}

pub(crate) struct Matcher<'a> {
    sql: &'a str,
    tokens: &'a [Token],
    blocks: &'a [Block],
    /// No match may start before this token
    lower_bound: usize,
    match_count: usize,
    var_start: usize,
    nest: Vec<char>,
    /// Inside a quote that the pattern itself matched
    in_pattern_quote: bool,
    start: usize,
    anchor: usize,
    restart: usize,
    variables: HashMap<String, String>,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(sql: &'a str, tokens: &'a [Token], pattern: &'a Pattern, lower_bound: usize) -> Self {
        Self {
            sql,
            tokens,
            blocks: pattern.blocks(),
            lower_bound,
            match_count: 0,
            var_start: 0,
            nest: Vec::new(),
            in_pattern_quote: false,
            start: 0,
            anchor: 0,
            restart: lower_bound,
            variables: HashMap::new(),
        }
    }

    /// Whether an attempt has matched at least one block
    pub(crate) fn in_progress(&self) -> bool {
        self.match_count > 0
    }

    /// Abandon the current attempt and return the token to retry from
    pub(crate) fn reset(&mut self) -> usize {
        self.match_count = 0;
        self.nest.clear();
        self.in_pattern_quote = false;
        self.variables.clear();
        self.restart
    }

    pub(crate) fn step(&mut self, cursor: usize) -> Step {
        let blocks = self.blocks;
        let block = &blocks[self.match_count];
        if !block.is_variable {
            return self.step_literal(cursor, block);
        }
        let at_end_or_before_variable =
            self.match_count + 1 == blocks.len() || blocks[self.match_count + 1].is_variable;
        match &block.regex {
            Some(regex) if at_end_or_before_variable => self.step_regex_forward(cursor, block, regex),
            Some(regex) if self.match_count == 0 => self.step_regex_backward(cursor, block, regex),
            _ => self.step_variable(cursor, block),
        }
    }

    fn begin(&mut self, anchor: usize, start: usize, restart: usize) {
        self.anchor = anchor;
        self.start = start;
        self.restart = restart;
    }

    /// Bookkeeping after a block matched up to byte offset `end`
    fn advance(&mut self, end: usize) -> Option<MatchedPattern> {
        if self.match_count == self.blocks.len() {
            return Some(MatchedPattern {
                start: self.start,
                end,
                start_token: self.anchor,
                variables: std::mem::take(&mut self.variables),
            });
        }
        if self.blocks[self.match_count].is_variable {
            self.var_start = end;
        }
        None
    }

    fn finish(&mut self, end: usize) -> Step {
        match self.advance(end) {
            Some(matched) => Step::Matched(matched),
            None => Step::Continue,
        }
    }

    fn step_literal(&mut self, cursor: usize, block: &Block) -> Step {
        let token = &self.tokens[cursor];
        // The first block never matches inside a string literal
        if token.text == block.text() && (self.match_count != 0 || !token.in_quotes) {
            if self.match_count == 0 {
                self.begin(cursor, token.start, cursor + 1);
            }
            self.match_count += 1;
            if token.is_quote() {
                self.in_pattern_quote = !self.in_pattern_quote;
            }
            self.finish(token.end)
        } else if self.match_count != 0 {
            Step::RestartAt(self.reset())
        } else {
            Step::Continue
        }
    }

    fn step_variable(&mut self, cursor: usize, block: &Block) -> Step {
        let tokens = self.tokens;
        let token = &tokens[cursor];
        let terminator = &self.blocks[self.match_count + 1];

        if self.nest.is_empty() && token.text == terminator.text() {
            let captured = &self.sql[self.var_start.min(token.start)..token.start];
            if let Some(regex) = &block.regex {
                // The capture keeps surrounding whitespace, the constraint does not see it
                if !regex.matches_fully(captured.trim()) {
                    return Step::RestartAt(self.reset());
                }
            }
            self.variables.insert(block.text().to_string(), captured.to_string());
            self.match_count += 2;
            if token.is_quote() {
                self.in_pattern_quote = !self.in_pattern_quote;
            }
            return self.finish(token.end);
        }

        // A variable may not run past the end of a statement or its enclosing parentheses
        if self.nest.is_empty() && !self.in_pattern_quote && (token.text == ";" || token.text == ")") {
            return Step::RestartAt(self.reset());
        }

        self.track_nesting(token);
        Step::Continue
    }

    fn track_nesting(&mut self, token: &Token) {
        let ch = match token.text.chars().next() {
            Some(ch) if token.text.len() == ch.len_utf8() => ch,
            _ => return,
        };
        match self.nest.last() {
            Some(&quote) if quote == '\'' || quote == '"' => {
                if ch == quote {
                    self.nest.pop();
                }
            }
            top => {
                if ch == '\'' || ch == '"' {
                    self.nest.push(ch);
                } else if !self.in_pattern_quote && ch == '(' {
                    self.nest.push(ch);
                } else if !self.in_pattern_quote && ch == ')' && top == Some(&'(') {
                    self.nest.pop();
                }
            }
        }
    }

    fn step_regex_forward(&mut self, cursor: usize, block: &Block, regex: &RegexConstraint) -> Step {
        let tokens = self.tokens;
        let token = &tokens[cursor];
        if self.match_count == 0 && token.in_quotes {
            return Step::Continue;
        }
        let Some(len) = regex.match_prefix(&self.sql[token.start..]) else {
            return if self.match_count > 0 {
                Step::RestartAt(self.reset())
            } else {
                Step::Continue
            };
        };

        if self.match_count == 0 {
            self.begin(cursor, token.start, cursor + 1);
        }
        let end = token.start + len;
        self.variables
            .insert(block.text().to_string(), self.sql[token.start..end].to_string());
        self.match_count += 1;
        if let Some(matched) = self.advance(end) {
            return Step::Matched(matched);
        }

        let next = tokens[cursor..]
            .iter()
            .position(|t| t.start >= end)
            .map_or(tokens.len(), |offset| cursor + offset);
        Step::SkipTo(next)
    }

    /// Leading regex variable followed by a literal: find the literal first,
    /// then look backward for where the regex-constrained span begins.
    fn step_regex_backward(&mut self, cursor: usize, block: &Block, regex: &RegexConstraint) -> Step {
        let tokens = self.tokens;
        let token = &tokens[cursor];
        if token.text != self.blocks[1].text() || cursor <= self.lower_bound {
            return Step::Continue;
        }

        let span_end = tokens[cursor - 1].end;
        let mut best = None;
        for k in (self.lower_bound..cursor).rev() {
            let candidate = &tokens[k];
            if candidate.text == ";" {
                break;
            }
            if regex.matches_fully(&self.sql[candidate.start..span_end]) {
                if !candidate.in_quotes {
                    best = Some(k);
                }
            } else if best.is_some() {
                break;
            }
        }

        let Some(anchor) = best else {
            return Step::Continue;
        };
        let start = tokens[anchor].start;
        // Restarting at the anchor would find this terminator again
        self.begin(anchor, start, cursor + 1);
        self.variables
            .insert(block.text().to_string(), self.sql[start..span_end].to_string());
        self.match_count = 2;
        if token.is_quote() {
            self.in_pattern_quote = !self.in_pattern_quote;
        }
        self.finish(token.end)
    }
}

/// Run the matcher over an already tokenized, case-folded view of `sql`
pub(crate) fn search_tokens(
    sql: &str,
    tokens: &[Token],
    pattern: &Pattern,
    start_token: usize,
) -> Option<MatchedPattern> {
    let mut matcher = Matcher::new(sql, tokens, pattern, start_token);
    let mut cursor = start_token;

    while cursor < tokens.len() {
        let next = match matcher.step(cursor) {
            Step::Matched(matched) => return Some(matched),
            Step::Continue => cursor + 1,
            Step::SkipTo(next) | Step::RestartAt(next) => next,
        };
        // Input ended before the pattern did
        cursor = if next >= tokens.len() && matcher.in_progress() {
            matcher.reset()
        } else {
            next
        };
    }

    None
}
