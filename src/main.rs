//! cmptree - Compare two directory trees and detect moved files.
//!
//! Usage:
//!   cmptree SOURCE TARGET            Compare SOURCE against TARGET
//!   cmptree SOURCE TARGET -s         Also report unchanged files
//!   cmptree SOURCE TARGET -o out     Write the result files into `out`
//!   cmptree --help                   Show help
//!
//! Exit codes: 0 on success, 8 on bad arguments, 12 on any other error.

use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cmptree_analyze::{DiffProcessor, DiffWriter, MoveReport, StatsSnapshot};
use cmptree_core::{CompareConfig, ErrorHandler, NameOrder, WalkWarning};
use cmptree_walk::{TreeWalker, WalkSummary};

const EXIT_BAD_ARGS: u8 = 8;
const EXIT_FAILURE: u8 = 12;

/// Name of the warning detail log in the output directory.
const ERRORS_FILE: &str = "errors.txt";

/// Interval of the progress line.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(
    name = "cmptree",
    version,
    about = "Compare two directory trees",
    long_about = "cmptree compares a source tree against a target tree and writes \
                  new, modified and deleted entries to text files.\n\n\
                  Files that disappeared from one directory and appeared in \
                  another with the same name, size and modification time are \
                  reported as moves."
)]
struct Cli {
    /// Source directory (entries only here are new)
    source: PathBuf,

    /// Target directory (entries only here are deleted)
    target: PathBuf,

    /// Maximum depth to descend (-1 = unlimited)
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    depth: i32,

    /// Follow junctions and symbolic links to directories
    #[arg(short = 'j', long)]
    follow: bool,

    /// Maximum number of worker threads
    #[arg(short, long, default_value_t = 32)]
    threads: usize,

    /// Report unchanged files (same.txt)
    #[arg(short, long)]
    same: bool,

    /// Sort source listings before comparing (filesystem listings are always sorted)
    #[arg(long = "sorts")]
    sort_source: bool,

    /// Sort target listings before comparing (filesystem listings are always sorted)
    #[arg(long = "sortt")]
    sort_target: bool,

    /// Compare names case-insensitively
    #[arg(short, long)]
    ignore_case: bool,

    /// Directory for the result files
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Skip move detection
    #[arg(long)]
    no_moves: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_BAD_ARGS)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    for (label, dir) in [("source", &cli.source), ("target", &cli.target)] {
        if !dir.is_dir() {
            eprintln!("error: {label} directory {} does not exist", dir.display());
            return ExitCode::from(EXIT_BAD_ARGS);
        }
    }

    if let Err(err) = color_eyre::install() {
        eprintln!("{err}");
    }
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Final summary, printed as text or JSON.
#[derive(Serialize)]
struct Report {
    source: PathBuf,
    target: PathBuf,
    walk: WalkSummary,
    stats: StatsSnapshot,
    moves: Option<MoveReport>,
}

fn run(cli: Cli) -> Result<()> {
    let config = CompareConfig::builder()
        .source(cli.source.clone())
        .target(cli.target.clone())
        .max_depth(CompareConfig::depth_limit(cli.depth))
        .follow_junctions(cli.follow)
        .threads(cli.threads)
        .force_sort_source(cli.sort_source)
        .force_sort_target(cli.sort_target)
        .report_same(cli.same)
        .name_order(if cli.ignore_case {
            NameOrder::OrdinalIgnoreCase
        } else {
            NameOrder::Ordinal
        })
        .build()
        .context("Invalid configuration")?;

    let writer = Arc::new(DiffWriter::create(&cli.out, cli.same).context("Cannot create result files")?);
    let error_log = Arc::new(ErrorLog::create(&cli.out.join(ERRORS_FILE))?);
    let processor = Arc::new(
        DiffProcessor::new()
            .with_move_detection(!cli.no_moves)
            .with_sink(writer.clone()),
    );

    let cancel = CancellationToken::new();
    let done = CancellationToken::new();
    spawn_ctrl_c(cancel.clone(), done.clone())?;

    let mut walker = TreeWalker::new(config, processor.clone())
        .with_error_handler(error_log.clone())
        .with_cancellation(cancel);
    walker.start(cli.threads).context("Cannot start the comparison")?;

    let show_progress = std::io::stderr().is_terminal() && !cli.json;
    while !walker.wait_timeout(PROGRESS_INTERVAL) {
        if show_progress {
            let c = walker.counters().snapshot();
            eprint!(
                "\rdirs queued/running/done: {}/{}/{}  errors: {}   ",
                c.queued,
                c.running,
                c.done,
                walker.errors()
            );
        }
    }
    if show_progress {
        eprintln!();
    }
    done.cancel();

    let summary = walker.summary();
    writer.flush().context("Cannot write result files")?;
    error_log.flush();

    let moves = if cli.no_moves || summary.cancelled {
        None
    } else {
        let report = processor.detect_moves().context("Move detection failed")?;
        writer.write_moves(&report).context("Cannot write move files")?;
        Some(report)
    };

    let report = Report {
        source: cli.source,
        target: cli.target,
        walk: summary,
        stats: processor.stats().snapshot(),
        moves,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, cli.same);
    }

    if report.walk.errors > 0 {
        eprintln!(
            "{} error(s) occurred. Details in {}",
            report.walk.errors,
            cli.out.join(ERRORS_FILE).display()
        );
    }
    Ok(())
}

/// Cancel `cancel` on Ctrl-C until `done` fires.
fn spawn_ctrl_c(cancel: CancellationToken, done: CancellationToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Cannot build signal runtime")?;

    std::thread::Builder::new()
        .name("cmptree-signal".to_string())
        .spawn(move || {
            runtime.block_on(async {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if result.is_ok() {
                            info!("Ctrl-C received, cancelling");
                            eprintln!("\ncancelling...");
                            cancel.cancel();
                        }
                    }
                    _ = done.cancelled() => {}
                }
            })
        })
        .context("Cannot spawn signal thread")?;
    Ok(())
}

/// Writes every walk warning to a detail log.
struct ErrorLog {
    writer: Mutex<BufWriter<File>>,
}

impl ErrorLog {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn flush(&self) {
        if let Err(err) = self.writer.lock().unwrap_or_else(PoisonError::into_inner).flush() {
            debug!("Cannot flush error log: {err}");
        }
    }
}

impl ErrorHandler for ErrorLog {
    fn on_error(&self, warning: &WalkWarning) {
        let code = warning.code.map(|c| c.to_string()).unwrap_or_default();
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            warning.kind,
            code,
            warning.path.display(),
            warning.message
        ) {
            debug!("Cannot write error log: {err}");
        }
    }
}

fn print_summary(report: &Report, same: bool) {
    let stats = &report.stats;

    println!();
    println!("{}", "─".repeat(60));
    println!(" {} vs {}", report.source.display(), report.target.display());
    println!("{}", "─".repeat(60));
    println!(" new files       {:>12}  {}", stats.files_new, format_size(stats.files_new_bytes));
    println!(
        " modified files  {:>12}  {}",
        stats.files_modified,
        format_delta(stats.files_modified_delta)
    );
    println!(" deleted files   {:>12}  {}", stats.files_deleted, format_size(stats.files_deleted_bytes));
    println!(" new dirs        {:>12}", stats.dirs_new);
    println!(" deleted dirs    {:>12}", stats.dirs_deleted);
    if same {
        println!(" same files      {:>12}", stats.files_same);
    }
    if let Some(moves) = &report.moves {
        println!(" moved files     {:>12}  {}", moves.move_count(), format_size(moves.moved_bytes));
        if !moves.ambiguous.is_empty() {
            println!(" ambiguous moves {:>12}", moves.ambiguous.len());
        }
    }
    println!("{}", "─".repeat(60));
    println!(
        " {} directories in {:.2}s{}",
        report.walk.counters.done,
        report.walk.duration.as_secs_f64(),
        if report.walk.cancelled { " (cancelled)" } else { "" }
    );
    if stats.write_errors > 0 {
        println!(" {} line(s) could not be written", stats.write_errors);
    }
    println!();
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Format a signed size difference.
fn format_delta(delta: i64) -> String {
    let sign = if delta < 0 { "-" } else { "+" };
    format!("{sign}{}", format_size(delta.unsigned_abs()))
}
