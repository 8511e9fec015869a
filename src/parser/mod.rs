//! SQL tokenization and search pattern compilation

pub mod lexer;
pub mod pattern;

pub use lexer::{fold_case, tokenize, Token};
pub use pattern::{Block, Pattern, RegexConstraint};
