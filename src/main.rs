use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sqlalign::{FormatMode, Mode};

/// sqlalign - A SQL formatter that right-aligns clause keywords.
#[derive(Parser, Debug)]
#[command(name = "sqlalign", version, about)]
struct Cli {
    /// Files or directories to format. Use "-" to read from stdin.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Expression whitespace mode: default, trim-leading-whitespace,
    /// compact-expressions.
    #[arg(short = 'm', long)]
    mode: Option<FormatMode>,

    /// Check formatting without writing changes.
    #[arg(long)]
    check: bool,

    /// Show formatting diff.
    #[arg(long)]
    diff: bool,

    /// Glob patterns to exclude.
    #[arg(long)]
    exclude: Vec<String>,

    /// Deepest subquery nesting to accept.
    #[arg(long)]
    max_nesting_depth: Option<usize>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only).
    #[arg(short, long)]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progressbar: bool,

    /// Force color output.
    #[arg(long)]
    force_color: bool,

    /// Disable color output.
    #[arg(long)]
    no_color: bool,

    /// Path to config file (sqlalign.toml or pyproject.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match try_main(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn try_main(cli: Cli) -> anyhow::Result<ExitCode> {
    let is_stdin = cli.files.len() == 1 && cli.files[0].to_string_lossy() == "-";
    let search_paths: &[PathBuf] = if is_stdin { &[] } else { &cli.files };

    let base_mode = sqlalign::load_config(search_paths, cli.config.as_deref())
        .context("Configuration error")?;
    let mode = merge_mode(base_mode, &cli)?;

    if is_stdin {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Error reading stdin")?;
        let formatted = sqlalign::format_script(&source, &mode)?;
        print!("{formatted}");
        if mode.check && formatted != source {
            return Ok(ExitCode::from(1));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let report = sqlalign::run(&cli.files, &mode);

    if !mode.quiet {
        if mode.verbose || mode.check {
            report.print_changed(mode.check);
        }
        eprintln!("{}", report.summary());
    }
    report.print_errors();

    if report.has_errors() {
        Ok(ExitCode::from(2))
    } else if mode.check && report.has_changes() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// CLI flags override values loaded from config files.
fn merge_mode(base: Mode, cli: &Cli) -> anyhow::Result<Mode> {
    if cli.max_nesting_depth == Some(0) {
        anyhow::bail!("--max-nesting-depth must be at least 1");
    }
    Ok(Mode {
        format_mode: cli.mode.unwrap_or(base.format_mode),
        max_nesting_depth: cli.max_nesting_depth.unwrap_or(base.max_nesting_depth),
        check: cli.check,
        diff: cli.diff,
        exclude: if cli.exclude.is_empty() {
            base.exclude
        } else {
            cli.exclude.clone()
        },
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_progressbar: cli.no_progressbar,
        no_color: cli.no_color,
        force_color: cli.force_color,
    })
}
