use clap::Parser;
use commit_audit::config::{self, AuditConfig};
use commit_audit::pipeline::{AnalysisCounters, AnalysisObserver, Analyzer};
use commit_audit::reporters;
use commit_audit::types::{AnalysisResult, Penalties, TimeBasis};
use commit_audit::{AnalysisError, GitHistoryReader, ReaderOptions};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_MAX_COMMITS:      usize = 100;
const DEFAULT_MAX_REPO_SIZE_MB: u64   = 500;
const DEFAULT_CLONE_TIMEOUT:    u64   = 300;
const DEFAULT_CONCURRENCY:      usize = 4;

#[derive(Parser, Debug)]
#[command(
    name = "commit-audit",
    about = "🔎 Score git commit histories for signs of fabricated or bulk-imported activity",
    version,
    long_about = "Reads the commit history of one or more repositories and scores how\n\
                  consistent each one is with genuine, incremental development.\n\n\
                  A reference is a local repository path or a remote URL\n\
                  (https://, ssh://, git@...), which is shallow-cloned to a temp dir.\n\
                  With no references the current directory is analyzed."
)]
struct Args {
    /// Local repository paths or remote URLs.
    #[arg(value_name = "REFERENCE")]
    references: Vec<String>,

    /// YAML config file. Defaults to <config dir>/commit-audit/config.yml when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print an annotated config template (to --output if given) and exit.
    #[arg(long)]
    generate_config: bool,

    /// Output format: terminal, json
    #[arg(long)]
    format: Option<String>,

    /// Output file (json only). Defaults to stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Newest commits to read per repository.
    #[arg(long, conflicts_with = "all_history")]
    max_commits: Option<usize>,

    /// Read the whole history instead of the newest commits only.
    #[arg(long)]
    all_history: bool,

    /// Repositories analyzed at the same time.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Bucket commit hours by UTC instead of the local clock.
    #[arg(long)]
    utc: bool,

    /// Log filter, e.g. "info" or "commit_audit=debug". Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

/// Settings after CLI flags have been layered over the config file.
#[derive(Debug)]
struct Settings {
    format: String,
    output: Option<PathBuf>,
    reader: ReaderOptions,
    concurrency: usize,
    basis: TimeBasis,
    penalties: Penalties,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    if args.generate_config {
        return match config::print_template(args.output.as_deref()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::from(2)
            }
        };
    }

    let settings = match config::resolve_config(args.config.as_deref())
        .and_then(|cfg| resolve_settings(&args, &cfg))
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let references = if args.references.is_empty() {
        match std::env::current_dir() {
            Ok(dir) => vec![dir.display().to_string()],
            Err(e) => {
                eprintln!("Error: cannot determine current directory: {e}");
                return ExitCode::from(2);
            }
        }
    } else {
        args.references.clone()
    };

    let analyzer = Analyzer::new(GitHistoryReader::new(settings.reader.clone()))
        .with_time_basis(settings.basis)
        .with_penalties(settings.penalties.clone());

    let started = Instant::now();
    let pb = ProgressBar::new(references.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message("Analyzing commit histories...");

    let observer = (AnalysisCounters::default(), Progress(pb.clone()));
    let report = analyzer.analyze_batch(&references, settings.concurrency, &observer);
    pb.finish_and_clear();

    let counters = &observer.0;
    eprintln!(
        "✔ {} repositor{} — {} analyzed, {} failed — ⏱ {}",
        counters.requests(),
        if counters.requests() == 1 { "y" } else { "ies" },
        counters.analyses(),
        counters.errors(),
        fmt_dur(started.elapsed()),
    );

    let written = match settings.format.as_str() {
        "json" => reporters::json::report_json(&report, settings.output.as_deref()),
        _ => {
            reporters::terminal::report_terminal(&report);
            Ok(())
        }
    };
    if let Err(e) = written {
        eprintln!("Error: {e}");
        return ExitCode::from(2);
    }

    if report.summary.failed > 0 { ExitCode::from(1) } else { ExitCode::SUCCESS }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(l) => EnvFilter::new(l),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// CLI flag, then config file, then built-in default.
fn resolve_settings(args: &Args, cfg: &AuditConfig) -> Result<Settings, String> {
    let format = args.format.clone()
        .or_else(|| cfg.format.clone())
        .unwrap_or_else(|| "terminal".to_string());
    if !matches!(format.as_str(), "terminal" | "json") {
        return Err(format!(
            "Invalid format: \"{format}\". Expected one of: \"terminal\", \"json\""
        ));
    }

    let max_commits = if args.all_history {
        None
    } else {
        Some(args.max_commits.or(cfg.max_commits).unwrap_or(DEFAULT_MAX_COMMITS))
    };
    if max_commits == Some(0) {
        return Err("Invalid --max-commits value: 0. Must be 1 or greater".to_string());
    }

    let concurrency = args.concurrency.or(cfg.concurrency).unwrap_or(DEFAULT_CONCURRENCY);
    if concurrency == 0 {
        return Err("Invalid --concurrency value: 0. Must be 1 or greater".to_string());
    }

    Ok(Settings {
        format,
        output: args.output.clone().or_else(|| cfg.output.as_ref().map(PathBuf::from)),
        reader: ReaderOptions {
            max_commits,
            max_repo_size_mb: cfg.max_repo_size_mb.unwrap_or(DEFAULT_MAX_REPO_SIZE_MB),
            clone_timeout: Duration::from_secs(cfg.clone_timeout_secs.unwrap_or(DEFAULT_CLONE_TIMEOUT)),
        },
        concurrency,
        basis: if args.utc { TimeBasis::Utc } else { cfg.timezone.unwrap_or_default() },
        penalties: cfg.penalties(),
    })
}

/// Advances the progress bar as repositories finish.
struct Progress(ProgressBar);

impl AnalysisObserver for Progress {
    fn on_completed(&self, result: &AnalysisResult) {
        self.0.inc(1);
        self.0.set_message(format!("{} scored {}", result.repository, result.authenticity_score));
    }

    fn on_failed(&self, reference: &str, _error: &AnalysisError) {
        self.0.inc(1);
        self.0.set_message(format!("{reference} failed"));
    }
}

// ── Duration formatting ────────────────────────────────────────────────────────

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 { format!("{:.1}s", d.as_secs_f64()) } else { format!("{ms}ms") }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
