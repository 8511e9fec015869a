//! sqlport CLI - Render parameterized SQL and translate it to other dialects

use clap::Parser;
use sqlport::cli::{discover_sql_files, render_pairs, Cli, Commands};
use sqlport::config::Config;
use sqlport::translate::{check_translate, RuleCache, SOURCE_DIALECT};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Convert {
            input,
            output,
            render,
            translate,
            temp_schema,
            session_id,
            rules,
        } => {
            let mut options = config.translate_options();
            options.temp_schema = temp_schema.or(options.temp_schema);
            options.session_id = session_id.or(options.session_id);
            options.rule_path = rules.or(options.rule_path);
            let request = ConvertRequest {
                render: &render,
                translate: translate.as_deref(),
                options: &options,
            };
            report(run_convert(&input, &output, &request))
        }
        Commands::Split { files } => report(run_split(&files)),
        Commands::Check {
            files,
            params,
            translate,
            max_identifier_length,
        } => {
            let mut options = config.check_options();
            if let Some(limit) = max_identifier_length {
                options.max_identifier_length = limit;
            }
            run_check(&files, &params, translate.as_deref(), &options)
        }
        Commands::Dialects { rules } => {
            let path = rules.or(config.translate.rules);
            report(run_dialects(path))
        }
    }
}

/// Log to stderr, `RUST_LOG` taking precedence over `-v`
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sqlport={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn report(result: sqlport::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn read_input(path: &Path) -> sqlport::Result<String> {
    let mut contents = String::new();
    if path == Path::new("-") {
        io::stdin().read_to_string(&mut contents)?;
    } else {
        contents = fs::read_to_string(path)?;
    }
    Ok(contents)
}

struct ConvertRequest<'a> {
    render: &'a [String],
    translate: Option<&'a str>,
    options: &'a sqlport::TranslateOptions,
}

/// Run the convert command
fn run_convert(input: &Path, output: &Path, request: &ConvertRequest<'_>) -> sqlport::Result<()> {
    let mut sql = read_input(input)?;

    if !request.render.is_empty() {
        let (names, values) = render_pairs(request.render);
        sql = sqlport::render(&sql, &names, &values)?;
    }

    if let Some(target) = request.translate {
        debug!(target, "translating");
        sql = sqlport::translate(&sql, target, request.options)?;
    }

    if output == Path::new("-") {
        io::stdout().write_all(sql.as_bytes())?;
    } else {
        fs::write(output, sql)?;
    }
    Ok(())
}

/// Run the split command
fn run_split(files: &[PathBuf]) -> sqlport::Result<()> {
    let mut stdout = io::stdout().lock();
    for file_path in files {
        let sources = if file_path == Path::new("-") {
            vec![file_path.clone()]
        } else {
            discover_sql_files(file_path)
        };
        for source in sources {
            let sql = read_input(&source)?;
            for statement in sqlport::split_statements(&sql) {
                writeln!(stdout, "{}", statement.trim())?;
                writeln!(stdout, "--")?;
            }
        }
    }
    Ok(())
}

/// Run the check command
fn run_check(
    files: &[PathBuf],
    params: &[String],
    target: Option<&str>,
    options: &sqlport::CheckOptions,
) -> ExitCode {
    let names: Vec<&str> = params.iter().map(String::as_str).collect();
    let target = target.unwrap_or(SOURCE_DIALECT);
    let mut has_warnings = false;
    let mut had_errors = false;

    for file_path in files {
        let sources = discover_sql_files(file_path);
        if sources.is_empty() {
            eprintln!("{}: no SQL files found", file_path.display());
            had_errors = true;
        }
        for source in sources {
            let sql = match read_input(&source) {
                Ok(sql) => sql,
                Err(e) => {
                    eprintln!("{}: {}", source.display(), e);
                    had_errors = true;
                    continue;
                }
            };

            let mut warnings = sqlport::check_render(&sql, &names);
            warnings.extend(check_translate(&sql, target, options));
            for warning in &warnings {
                println!("{}: {}", source.display(), warning);
            }
            has_warnings |= !warnings.is_empty();
        }
    }

    if had_errors {
        ExitCode::from(2)
    } else if has_warnings {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Run the dialects command
fn run_dialects(rules: Option<PathBuf>) -> sqlport::Result<()> {
    let cache = match rules {
        Some(path) => RuleCache::from_path(path),
        None => RuleCache::embedded(),
    };
    for dialect in cache.dialects()? {
        println!("{}", dialect);
    }
    Ok(())
}
