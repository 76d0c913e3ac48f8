use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{TimeDelta, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use snaphist::{
    AppError, Config, GrepMatch, Selector, Snaphist, SnapshotDirScanner, VersionCache,
    VersionRecord, render,
};

#[derive(Parser)]
#[command(name = "snaphist", version)]
#[command(about = "Find older versions of a file in your volume snapshots")]
struct Cli {
    /// Days to scan
    #[arg(short = 'd', long)]
    days: Option<u32>,

    /// Show N unchanged lines before and after each change
    #[arg(long)]
    context_size: Option<usize>,

    /// Don't color the diff output, use '+' / '-' for inserted / deleted lines
    #[arg(long)]
    no_color: bool,

    /// Scripting mode: no headers, absolute dates, tab separated fields
    #[arg(short = 'H', long)]
    scripting: bool,

    /// Debug output (-v) or trace output (-vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List snapshots where the given file was modified
    List { file: PathBuf },
    /// Show the file content from the given snapshot
    Cat { file: PathBuf, selector: Selector },
    /// Show a diff from the selected snapshot to the current version
    Diff { file: PathBuf, selector: Selector },
    /// Revert the given chunk of the diff against the selected snapshot
    Revert {
        file: PathBuf,
        selector: Selector,
        chunk_nr: usize,
    },
    /// Restore the file from the given snapshot
    Restore { file: PathBuf, selector: Selector },
    /// Grep the changes between file versions
    Grep { file: PathBuf, pattern: String },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "snaphist", &mut io::stdout());
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(days) = cli.days {
        config.days_to_scan = days;
    }
    if let Some(context_size) = cli.context_size {
        config.context_size = context_size;
    }
    colored::control::set_override(!cli.no_color);

    let cache = VersionCache::new(Config::cache_file()?);
    let app = Snaphist::new(config, cache);

    match cli.command {
        Commands::List { file } => {
            let file = absolute(&file)?;
            if !cli.scripting {
                println!(
                    "scan the last {} days for other file versions",
                    app.config().days_to_scan
                );
            }

            let scanner = SnapshotDirScanner::locate(&file, app.config())?;
            let records = app.list(&scanner, &file)?;
            print_version_table(&records, cli.scripting);
        }

        Commands::Cat { file, selector } => {
            let file = absolute(&file)?;
            println!("{}", app.cat(&file, &selector)?);
        }

        Commands::Diff { file, selector } => {
            let file = absolute(&file)?;
            let (record, diff) = app.diff(&file, &selector)?;
            if !cli.scripting {
                println!(
                    "Diff from the actual version to the version from: {}",
                    record.backup.modified
                );
            }
            print!("{}", render::render_diff(&diff, !cli.no_color));
        }

        Commands::Revert {
            file,
            selector,
            chunk_nr,
        } => {
            let file = absolute(&file)?;
            let (backup, chunk) = app.revert(&file, &selector, chunk_nr)?;
            if !cli.scripting {
                println!(
                    "backup from the actual version created at: {}",
                    backup.display()
                );
                println!("reverted:");
                print!("{}", render::render_chunk(&chunk, !cli.no_color));
            }
        }

        Commands::Restore { file, selector } => {
            let file = absolute(&file)?;
            let (backup, record) = app.restore(&file, &selector)?;
            if !cli.scripting {
                println!(
                    "backup from the actual version created at: {}",
                    backup.display()
                );
                println!("version restored from snapshot: {}", record.snapshot.name);
            }
        }

        Commands::Grep { file, pattern } => {
            let file = absolute(&file)?;
            if !cli.scripting {
                println!(
                    "scan the last {} days for other file versions",
                    app.config().days_to_scan
                );
            }

            let scanner = SnapshotDirScanner::locate(&file, app.config())?;
            let (records, matches) = app.grep(&scanner, &file, &pattern)?;
            print_grep_table(&records, &matches, cli.scripting);
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf, AppError> {
    let file = std::path::absolute(path).map_err(|e| AppError::InvalidPath {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    debug!("full path: {}", file.display());
    Ok(file)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .without_time()
        .init();
}

fn print_version_table(records: &[VersionRecord], scripting: bool) {
    if scripting {
        for (nr, record) in records.iter().enumerate() {
            println!(
                "{nr}\t{}\t{}",
                record.snapshot.name,
                record.snapshot.created.to_rfc2822()
            );
        }
        return;
    }

    let width = snapshot_column_width(records);
    let header = format!(
        "{:>3} | {:>12} | {:<width$} | {:>12}",
        "#", "File changed", "Snapshot", "Snapshot age"
    );
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    let now = Utc::now();
    for (nr, record) in records.iter().enumerate() {
        println!(
            "{:>3} | {:>12} | {:<width$} | {:>12}",
            nr,
            human_age(now - record.backup.modified),
            record.snapshot.name,
            human_age(now - record.snapshot.created)
        );
    }
}

fn print_grep_table(records: &[VersionRecord], matches: &[GrepMatch], scripting: bool) {
    if scripting {
        for m in matches {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{} {}",
                m.version_index,
                m.newer_modified.to_rfc2822(),
                m.snapshot.name,
                m.snapshot.created.to_rfc2822(),
                m.line_nr,
                m.marker(),
                m.line
            );
        }
        return;
    }

    let width = snapshot_column_width(records);
    let header = format!(
        "{:>3} | {:>12} | {:<width$} | {:>12} | {:>5} | {}",
        "#", "File changed", "Snapshot", "Snapshot age", "Line", "Change"
    );
    println!("{header}");
    println!("{}", "-".repeat(header.len()));

    let now = Utc::now();
    for m in matches {
        println!(
            "{:>3} | {:>12} | {:<width$} | {:>12} | {:>5} | {} {}",
            m.version_index,
            human_age(now - m.newer_modified),
            m.snapshot.name,
            human_age(now - m.snapshot.created),
            m.line_nr,
            m.marker(),
            m.line
        );
    }
}

fn snapshot_column_width(records: &[VersionRecord]) -> usize {
    records
        .iter()
        .map(|r| r.snapshot.name.len())
        .max()
        .unwrap_or(0)
        .max("Snapshot".len())
}

fn human_age(age: TimeDelta) -> String {
    let seconds = age.num_seconds();
    if seconds < 60 {
        return format!("{seconds} seconds");
    }
    let minutes = age.num_minutes();
    if minutes < 60 {
        return format!("{minutes} minutes");
    }
    let hours = age.num_hours();
    if hours < 48 {
        return format!("{hours} hours");
    }
    format!("{} days", hours / 24)
}
