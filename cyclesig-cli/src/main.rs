//! cyclesig CLI — scan passes, universe ranking and signal management.
//!
//! Commands:
//! - `scan` — one pass over the observed universe (re-ranks if the stamp is stale)
//! - `watch` — repeat `scan` on the configured interval
//! - `rank` — re-rank the universe now and rewrite the asset registry
//! - `signals` — list the most recent stored signals
//! - `set-status` — move a stored signal through its lifecycle

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cyclesig_core::domain::{Signal, SignalStatus};
use cyclesig_core::report::TracingReporter;
use cyclesig_core::store::SignalStore;
use cyclesig_runner::{InstrumentOutcome, Runner, RunnerConfig, ScanSummary};

#[derive(Parser)]
#[command(
    name = "cyclesig",
    about = "cyclesig — trend-cycle signal scanner"
)]
struct Cli {
    /// Path to a TOML runner config. Built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan pass over the observed instruments.
    Scan {
        /// Evaluate as of this time (YYYY-MM-DDTHH:MM:SS). Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
    /// Run scan passes repeatedly.
    Watch {
        /// Stop after this many passes.
        #[arg(long)]
        passes: Option<u64>,
    },
    /// Re-rank the market universe and rewrite the asset registry.
    Rank,
    /// List stored signals, newest first.
    Signals {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Change the status of a stored signal.
    SetStatus {
        /// Signal id or unique id prefix.
        id: String,
        #[arg(value_enum)]
        status: StatusArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    InExecution,
    Closed,
}

impl From<StatusArg> for SignalStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => SignalStatus::Pending,
            StatusArg::InExecution => SignalStatus::InExecution,
            StatusArg::Closed => SignalStatus::Closed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let config = match &cli.config {
        Some(path) => RunnerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RunnerConfig::default(),
    };
    let runner = Runner::new(config)?;

    match cli.command {
        Commands::Scan { at } => run_scan(&runner, at.as_deref()),
        Commands::Watch { passes } => run_watch(&runner, passes),
        Commands::Rank => run_rank(&runner),
        Commands::Signals { limit } => run_signals(&runner, limit),
        Commands::SetStatus { id, status } => run_set_status(&runner, &id, status.into()),
    }
}

/// `RUST_LOG` overrides the default `info` filter. Logs go to stderr so
/// command output on stdout stays clean.
fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Plain => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn parse_at(raw: &str) -> Result<NaiveDateTime> {
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(t);
        }
    }
    bail!("invalid --at time '{raw}', expected YYYY-MM-DDTHH:MM:SS")
}

fn run_scan(runner: &Runner, at: Option<&str>) -> Result<()> {
    let at = at.map(parse_at).transpose()?.unwrap_or_else(now);
    let summary = runner.run_once(at, &TracingReporter)?;
    print_summary(&summary);
    Ok(())
}

fn run_watch(runner: &Runner, passes: Option<u64>) -> Result<()> {
    let interval = Duration::from_secs(runner.config().scan.interval_secs);
    let mut done = 0u64;
    loop {
        match runner.run_once(now(), &TracingReporter) {
            Ok(summary) => print_summary(&summary),
            // A failed pass (unreadable registry, bad universe file) does not
            // end the watch; the next pass retries.
            Err(e) => tracing::error!(error = %e, "scan pass failed"),
        }
        done += 1;
        if passes.is_some_and(|limit| done >= limit) {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

fn run_rank(runner: &Runner) -> Result<()> {
    let observed = runner.rank(now())?;
    println!(
        "Observing {observed} instruments (registry: {})",
        runner.config().paths.registry.display()
    );
    Ok(())
}

fn run_signals(runner: &Runner, limit: usize) -> Result<()> {
    let signals = runner.store().recent(limit)?;
    if signals.is_empty() {
        println!("No signals stored.");
        return Ok(());
    }
    println!(
        "{:<12} {:<19} {:<10} {:<5} {:>12} {:>12} {:>12} {:<12}",
        "ID", "EMITTED", "SYMBOL", "DIR", "ENTRY", "STOP", "TARGET", "STATUS"
    );
    for s in &signals {
        print_signal(s);
    }
    Ok(())
}

fn print_signal(s: &Signal) {
    println!(
        "{:<12} {:<19} {:<10} {:<5} {:>12.5} {:>12.5} {:>12.5} {:<12}",
        s.id.short(),
        s.emitted_at.format("%Y-%m-%d %H:%M:%S"),
        s.instrument,
        s.direction.as_str(),
        s.entry,
        s.stop,
        s.target,
        s.status.as_str()
    );
}

fn run_set_status(runner: &Runner, id: &str, status: SignalStatus) -> Result<()> {
    let store = runner.store();
    let matches: Vec<Signal> = store
        .recent(usize::MAX)?
        .into_iter()
        .filter(|s| s.id.0.starts_with(id))
        .collect();

    let signal = match matches.as_slice() {
        [one] => one,
        [] => bail!("no signal matches '{id}'"),
        _ => bail!("'{id}' matches {} signals; use a longer prefix", matches.len()),
    };

    store.update_status(&signal.id, status)?;
    println!(
        "{} {} -> {}",
        signal.id.short(),
        signal.status.as_str(),
        status.as_str()
    );
    Ok(())
}

fn print_summary(summary: &ScanSummary) {
    println!();
    println!("=== Scan Summary ===");
    println!(
        "Instruments: {}  Emitted: {}  Suppressed: {}  Failed: {}",
        summary.outcomes.len(),
        summary.emitted(),
        summary.suppressed(),
        summary.failed()
    );
    for (symbol, outcome) in &summary.outcomes {
        match outcome {
            InstrumentOutcome::Emitted(s) => println!(
                "  {symbol:<10} {} entry {:.5} stop {:.5} target {:.5} [{}]",
                s.direction.as_str(),
                s.entry,
                s.stop,
                s.target,
                s.id.short()
            ),
            InstrumentOutcome::Suppressed(s) => println!("  {symbol:<10} suppressed: {}", s.reason),
            InstrumentOutcome::Failed(e) => println!("  {symbol:<10} failed: {e}"),
        }
    }
}
