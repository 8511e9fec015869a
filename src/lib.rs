//! sqlport - Render parameterized SQL templates and translate SQL Server SQL
//! into other dialects
//!
//! Translation works on tokens rather than a syntax tree: each target dialect
//! has an ordered list of search patterns with replacement templates, applied
//! until none of them matches any more.

pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod render;
pub mod rewrite;
pub mod split;
pub mod translate;

pub use error::{Error, Result};
pub use render::{check_render, render, render_sql};
pub use split::split_statements;
pub use translate::session::validate_session_id;
pub use translate::{
    check_translate, generate_session_id, translate, CheckOptions, RuleCache, TranslateOptions,
    SOURCE_DIALECT,
};
