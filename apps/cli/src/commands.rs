//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docbundle_core::{RunConfig, Source};
use docbundle_shared::{
    AppConfig, CrawlConfig, LocalConfig, ProgressReporter, ProgressSnapshot, RunSummary,
    UnitStatus, init_config, load_config, load_config_from, to_toml,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docbundle: bundle a directory or a documentation site into one file.
#[derive(Parser)]
#[command(
    name = "docbundle",
    version,
    about = "Aggregate a directory tree or a documentation site into a single plain-text artifact.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Aggregate a source into one artifact.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `docbundle run`. Flags override the config file.
#[derive(clap::Args, Debug)]
pub(crate) struct RunArgs {
    /// Local directory or http(s) seed URL.
    pub source: String,

    /// Artifact path. Missing parent directories are created.
    pub output: PathBuf,

    /// Extraction workers for local mode.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Pause between consecutive web requests, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Stop the crawl after this many pages.
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Do not follow links deeper than this.
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Config file to use instead of ~/.docbundle/docbundle.toml.
    #[arg(long, env = "DOCBUNDLE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docbundle=info",
        1 => "docbundle=debug",
        _ => "docbundle=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let app_config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let config = resolve_run_config(&args, &app_config)?;

    info!(
        source = %config.source,
        output = %config.output.display(),
        workers = config.local.workers,
        "starting run"
    );

    let reporter = CliProgress::new();
    let summary = docbundle_core::run(&config, &reporter).await?;

    print_summary(&summary);
    Ok(())
}

/// Merge config file values with CLI flags. Flags win.
fn resolve_run_config(args: &RunArgs, app_config: &AppConfig) -> Result<RunConfig> {
    let source = Source::parse(&args.source)?;

    let mut local = LocalConfig::from(app_config);
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err(eyre!("--workers must be at least 1"));
        }
        local = LocalConfig::with_cap(workers);
    }

    let mut crawl = CrawlConfig::from(app_config);
    if let Some(delay_ms) = args.delay_ms {
        crawl.delay = Duration::from_millis(delay_ms);
    }
    if let Some(max_pages) = args.max_pages {
        crawl.max_pages = max_pages;
    }
    if args.max_depth.is_some() {
        crawl.max_depth = args.max_depth;
    }

    Ok(RunConfig {
        source,
        output: args.output.clone(),
        filter: app_config.filter.clone(),
        local,
        crawl,
    })
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Bundle written.");
    println!("  Units:    {}", summary.units);
    println!("  Ok:       {}", summary.ok);
    println!("  Warnings: {}", summary.warnings);
    println!("  Errors:   {}", summary.errors);
    println!("  Skipped:  {}", summary.skipped);
    println!("  Size:     {} bytes", summary.bytes_written);
    println!("  Path:     {}", summary.output.display());
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn unit_done(&self, identity: &str, status: UnitStatus, snapshot: &ProgressSnapshot) {
        if status == UnitStatus::Error {
            self.spinner.println(format!("  ! {identity}"));
        }
        self.spinner
            .set_message(format!("{} {identity}", progress_line(snapshot)));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

/// `[12/40] 30% ETA 4s`, or `[130 (est. 100)]` once an estimate is exceeded.
fn progress_line(snapshot: &ProgressSnapshot) -> String {
    let Some(percent) = snapshot.percent() else {
        return if snapshot.estimated {
            format!("[{} (est. {})]", snapshot.processed, snapshot.total)
        } else {
            format!("[{}]", snapshot.processed)
        };
    };

    let estimate = if snapshot.estimated { "~" } else { "" };
    let mut line = format!(
        "[{}/{estimate}{}] {percent:.0}%",
        snapshot.processed, snapshot.total
    );
    if let Some(eta) = snapshot.eta {
        line.push_str(&format!(" ETA {}", format_eta(eta)));
    }
    line
}

fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    println!("{}", to_toml(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Run(args) => args,
            Command::Config { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().to_str().unwrap();
        let args = parse(&[
            "docbundle", "run", source, "out.md", "--workers", "3", "--delay-ms", "0",
            "--max-depth", "2",
        ]);

        let config = resolve_run_config(&args, &AppConfig::default()).unwrap();

        assert!(config.local.workers >= 1 && config.local.workers <= 3);
        assert_eq!(config.crawl.delay, Duration::ZERO);
        assert_eq!(config.crawl.max_depth, Some(2));
        assert_eq!(config.crawl.max_pages, 500);
        assert!(matches!(config.source, Source::Local(_)));
    }

    #[test]
    fn workers_flag_never_exceeds_available_parallelism() {
        let dir = tempfile::tempdir().unwrap();
        let args = parse(&[
            "docbundle",
            "run",
            dir.path().to_str().unwrap(),
            "out.md",
            "--workers",
            "64",
        ]);

        let config = resolve_run_config(&args, &AppConfig::default()).unwrap();

        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(config.local.workers, available.min(64));
    }

    #[test]
    fn zero_workers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = parse(&[
            "docbundle",
            "run",
            dir.path().to_str().unwrap(),
            "out.md",
            "--workers",
            "0",
        ]);
        assert!(resolve_run_config(&args, &AppConfig::default()).is_err());
    }

    #[test]
    fn progress_line_formats() {
        let mut snapshot = ProgressSnapshot {
            processed: 12,
            total: 40,
            estimated: false,
            elapsed: Duration::from_secs(6),
            rate: Some(2.0),
            eta: Some(Duration::from_secs(14)),
        };
        assert_eq!(progress_line(&snapshot), "[12/40] 30% ETA 14s");

        snapshot.estimated = true;
        snapshot.total = 10;
        snapshot.eta = None;
        assert_eq!(progress_line(&snapshot), "[12 (est. 10)]");
    }
}
