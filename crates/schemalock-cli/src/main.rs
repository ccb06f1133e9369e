mod console;
mod logging;
mod redaction;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use console::{DotProgress, StdinConfirm};
use logging::{LoggingError, init_logging};
use redaction::redact_connection_string;
use schemalock_core::Error as CoreError;
use schemalock_engine::{
    GenerateOptions, LoadOptions, Outcome, PgDatabase, SeedImportOptions, Summary, drop_tables,
    import_seed_file, load, save, write_generated_seed,
};
use settings::{Settings, SettingsError};
use thiserror::Error;

const EXIT_FAILURE: u8 = 1;
const EXIT_CANCELLED: u8 = 3;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("invalid configuration: {0}")]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemalock", version, about = "Snapshot and restore database schemas and seed data")]
struct Cli {
    /// Settings file (defaults to ./schemalock.toml when present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Append JSON log lines to this file.
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture every table of the database into a snapshot file.
    Save(SaveArgs),
    /// Drop all tables and recreate them from a snapshot file.
    Load(LoadArgs),
    /// Drop all tables.
    Drop(DropArgs),
    /// Dump table rows into a seed file.
    SeedGenerate(SeedGenerateArgs),
    /// Insert the rows of a seed file.
    SeedImport(SeedImportArgs),
}

#[derive(Args, Debug)]
struct ConnectionArg {
    /// Connection name from [connections], or a database URL.
    #[arg(short = 'c', long = "connection", value_name = "CONNECTION")]
    connection: Option<String>,
}

#[derive(Args, Debug)]
struct SaveArgs {
    #[command(flatten)]
    conn: ConnectionArg,
    /// Snapshot file to write.
    #[arg(short, long)]
    path: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LoadArgs {
    #[command(flatten)]
    conn: ConnectionArg,
    /// Snapshot file to read.
    #[arg(short, long)]
    path: Option<PathBuf>,
    /// Drop existing tables without asking.
    #[arg(short = 'n', long, default_value_t = false)]
    no_interaction: bool,
}

#[derive(Args, Debug)]
struct DropArgs {
    #[command(flatten)]
    conn: ConnectionArg,
    /// Drop without asking.
    #[arg(short = 'n', long, default_value_t = false)]
    no_interaction: bool,
}

#[derive(Args, Debug)]
struct SeedGenerateArgs {
    #[command(flatten)]
    conn: ConnectionArg,
    /// Snapshot file listing the tables to dump.
    #[arg(short, long)]
    path: Option<PathBuf>,
    /// Seed file to write.
    #[arg(short, long)]
    seed: Option<PathBuf>,
    /// Maximum rows per table.
    #[arg(long, value_name = "N")]
    count: Option<u64>,
    /// SQL condition applied to every table.
    #[arg(long, value_name = "SQL")]
    conditions: Option<String>,
    /// Tables to leave out, comma separated.
    #[arg(long, value_name = "TABLES", value_delimiter = ',')]
    exclude: Vec<String>,
}

#[derive(Args, Debug)]
struct SeedImportArgs {
    #[command(flatten)]
    conn: ConnectionArg,
    /// Seed file to read.
    #[arg(short, long)]
    seed: Option<PathBuf>,
    /// Empty seeded tables before inserting.
    #[arg(short, long, default_value_t = false)]
    truncate: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.log_file.as_deref()) {
        eprintln!("error: {err}");
        return ExitCode::from(EXIT_FAILURE);
    }

    let command = command_name(&cli.command);
    let timer = Instant::now();
    match run(cli).await {
        Ok(Outcome::Completed(summary)) => {
            tracing::info!(
                event = "command_finished",
                command,
                status = "success",
                tables = summary.tables,
                rows = summary.rows,
                statements = summary.statements,
                duration_ms = timer.elapsed().as_millis()
            );
            ExitCode::SUCCESS
        }
        Ok(Outcome::Cancelled) => {
            tracing::info!(event = "command_finished", command, status = "cancelled");
            eprintln!("Cancelled, nothing was changed.");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(err) => {
            tracing::error!(event = "command_failed", command, error = %err);
            eprintln!("error: {err}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Save(_) => "save",
        Command::Load(_) => "load",
        Command::Drop(_) => "drop",
        Command::SeedGenerate(_) => "seed-generate",
        Command::SeedImport(_) => "seed-import",
    }
}

async fn run(cli: Cli) -> Result<Outcome, CliError> {
    let settings = Settings::load(cli.config.as_deref())?;
    let progress = DotProgress::default();

    let outcome = match cli.command {
        Command::Save(args) => {
            let path = settings.schema_path(args.path);
            let mut db = connect(&settings, &args.conn).await?;
            let snapshot = save(&mut db, &path, &progress).await;
            progress.finish();
            let snapshot = snapshot?;
            println!("Saved {} table(s) to {}", snapshot.len(), path.display());
            Outcome::Completed(Summary {
                tables: snapshot.len(),
                ..Default::default()
            })
        }
        Command::Load(args) => {
            let path = settings.schema_path(args.path);
            let opts = LoadOptions {
                assume_yes: args.no_interaction,
            };
            let mut db = connect(&settings, &args.conn).await?;
            let outcome = load(&mut db, &path, &opts, &StdinConfirm, &progress).await;
            progress.finish();
            report("Loaded", outcome?)
        }
        Command::Drop(args) => {
            let opts = LoadOptions {
                assume_yes: args.no_interaction,
            };
            let mut db = connect(&settings, &args.conn).await?;
            let outcome = drop_tables(&mut db, &opts, &StdinConfirm, &progress).await;
            progress.finish();
            report("Dropped", outcome?)
        }
        Command::SeedGenerate(args) => {
            let snapshot_path = settings.schema_path(args.path);
            let seed_path = settings.seed_path(args.seed);
            let opts = GenerateOptions {
                record_limit: args.count.or(settings.seed.record_limit),
                filter: args.conditions.or_else(|| settings.seed.conditions.clone()),
                excluded_tables: settings.excluded_tables(args.exclude),
            };
            let mut db = connect(&settings, &args.conn).await?;
            let seed = write_generated_seed(&mut db, &snapshot_path, &seed_path, &opts, &progress)
                .await;
            progress.finish();
            let seed = seed?;
            println!(
                "Wrote {} row(s) from {} table(s) to {}",
                seed.row_count(),
                seed.len(),
                seed_path.display()
            );
            Outcome::Completed(Summary {
                tables: seed.len(),
                rows: seed.row_count(),
                statements: 0,
            })
        }
        Command::SeedImport(args) => {
            let path = settings.seed_path(args.seed);
            let opts = SeedImportOptions {
                truncate: args.truncate,
            };
            let mut db = connect(&settings, &args.conn).await?;
            let outcome = import_seed_file(&mut db, &path, &opts, &progress).await;
            progress.finish();
            report("Seeded", outcome?)
        }
    };

    Ok(outcome)
}

fn report(verb: &str, outcome: Outcome) -> Outcome {
    if let Outcome::Completed(summary) = outcome {
        println!(
            "{verb} {} table(s), {} row(s), {} statement(s)",
            summary.tables, summary.rows, summary.statements
        );
    }
    outcome
}

async fn connect(settings: &Settings, conn: &ConnectionArg) -> Result<PgDatabase, CliError> {
    let url = settings.resolve_connection(
        conn.connection.as_deref(),
        std::env::var("DATABASE_URL").ok(),
    )?;
    let engine = detect_engine(&url)?;
    tracing::info!(
        event = "connection_opening",
        engine,
        connection = %redact_connection_string(&url),
        schema = %settings.postgres.schema
    );

    Ok(PgDatabase::connect(&url, settings.postgres.introspect_options()).await?)
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(redact_connection_string(conn)))
    }
}
