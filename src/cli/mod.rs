//! CLI argument parsing and file discovery

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// sqlport - Render parameterized SQL and translate it to other dialects
#[derive(Parser, Debug)]
#[command(name = "sqlport")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to ./sqlport.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render and/or translate a SQL file
    #[command(after_help = "Flat flag equivalents:\n  \
-render is --render\n  \
-translate is --translate\n  \
-oracle_temp_schema is --temp-schema\n  \
-session_id is --session-id")]
    Convert {
        /// Input file (use - for stdin)
        input: PathBuf,

        /// Output file (use - for stdout)
        output: PathBuf,

        /// Set a template parameter
        #[arg(long, num_args = 2, value_names = ["NAME", "VALUE"], action = ArgAction::Append)]
        render: Vec<String>,

        /// Translate to this dialect
        #[arg(long, value_name = "DIALECT")]
        translate: Option<String>,

        /// Schema for emulated temp tables
        #[arg(long, value_name = "SCHEMA")]
        temp_schema: Option<String>,

        /// Session id appended to emulated temp table names
        #[arg(long)]
        session_id: Option<String>,

        /// Replacement rule file to use instead of the embedded rules
        #[arg(long, value_name = "PATH")]
        rules: Option<PathBuf>,
    },
    /// Print the statements in SQL files, one block per statement
    Split {
        /// Files, directories or glob patterns (use - for stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Report parameters that are never used and names that are too long (exit code 1 on warnings)
    Check {
        /// Files, directories or glob patterns
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Parameter name the templates should reference
        #[arg(long = "param", value_name = "NAME")]
        params: Vec<String>,

        /// Dialect whose identifier limits apply
        #[arg(long, value_name = "DIALECT")]
        translate: Option<String>,

        /// Longest identifier allowed
        #[arg(long, value_name = "N")]
        max_identifier_length: Option<usize>,
    },
    /// List the dialects SQL can be translated to
    Dialects {
        /// Replacement rule file to use instead of the embedded rules
        #[arg(long, value_name = "PATH")]
        rules: Option<PathBuf>,
    },
}

fn is_sql_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "sql")
}

/// Discover SQL files from a path: a file, a directory searched recursively,
/// or a glob pattern
pub fn discover_sql_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    if path.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| is_sql_file(p))
            .collect();
        files.sort();
        return files;
    }

    match path.to_str().map(glob::glob) {
        Some(Ok(paths)) => paths.filter_map(|p| p.ok()).filter(|p| is_sql_file(p)).collect(),
        _ => Vec::new(),
    }
}

/// Pair up the flat `NAME VALUE NAME VALUE ...` list collected by `--render`
pub fn render_pairs(values: &[String]) -> (Vec<&str>, Vec<&str>) {
    values
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| (pair[0].as_str(), pair[1].as_str()))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_values_pair_up_in_order() {
        let values: Vec<String> = ["a", "1", "b", "2"].iter().map(|s| s.to_string()).collect();
        let (names, values) = render_pairs(&values);
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn render_flag_takes_two_values() {
        let cli = Cli::try_parse_from([
            "sqlport", "convert", "in.sql", "out.sql", "--render", "a", "1", "--render", "b", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert { render, .. } => assert_eq!(render, vec!["a", "1", "b", "2"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
