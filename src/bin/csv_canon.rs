use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use csv_canon::app::{App, ProgressSink, StandardizeOptions};
use csv_canon::config::ConfigLoader;
use csv_canon::error::CanonError;
use csv_canon::expected::ScopeFilter;
use csv_canon::output::{HumanOutput, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "csv-canon")]
#[command(about = "Canonical, SQL-safe names for directories of CSV exports and checks against expected datasets")]
#[command(version, author)]
struct Cli {
    /// JSON config (defaults to ./csv-canon.json when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Rename CSV files to canonical, versioned, SQL-safe names")]
    Standardize(StandardizeArgs),
    #[command(about = "List expected datasets with no CSV file and write missingfiles.txt")]
    Missing(MissingArgs),
    #[command(about = "Count files by extension and CSV progress against the expected lists")]
    Count(DirArgs),
    #[command(about = "Finish or roll back a rename interrupted in an earlier run")]
    Recover(DirArgs),
}

#[derive(Args)]
struct DirArgs {
    dir: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct StandardizeArgs {
    dir: Option<Utf8PathBuf>,

    /// Strip trailing _YYYYMMDD_HHMMSS from the new names
    #[arg(long)]
    drop_timestamp: bool,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct MissingArgs {
    dir: Option<Utf8PathBuf>,

    #[arg(long, value_enum, default_value_t = ScopeFilter::All)]
    scope: ScopeFilter,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(canon) = report.downcast_ref::<CanonError>() {
                return ExitCode::from(map_exit_code(canon));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &CanonError) -> u8 {
    match error {
        CanonError::InvalidDirectory(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<u8> {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Json => &JsonOutput,
        OutputMode::Human => &HumanOutput,
    };

    let resolved = ConfigLoader::resolve(cli.config.as_deref())?;
    let app = App::new(resolved);

    match cli.command {
        Commands::Standardize(args) => {
            let dir = app.target_dir(args.dir);
            let options = StandardizeOptions {
                drop_timestamp: args.drop_timestamp,
                dry_run: args.dry_run,
            };
            let result = app.standardize(&dir, options, sink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_standardize(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_standardize(&result),
            }
            Ok(0)
        }
        Commands::Missing(args) => {
            let dir = app.target_dir(args.dir);
            let result = app.missing_files(&dir, args.scope, sink)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_missing(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_missing(&result),
            }
            Ok(result.exit_code())
        }
        Commands::Count(args) => {
            let dir = app.target_dir(args.dir);
            let result = app.count_files(&dir)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_count(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_count(&result),
            }
            Ok(0)
        }
        Commands::Recover(args) => {
            let dir = app.target_dir(args.dir);
            let result = app.recover(&dir)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_recover(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_recover(&result),
            }
            Ok(0)
        }
    }
}
