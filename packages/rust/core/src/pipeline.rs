//! End-to-end run: source → enumerate → extract → assemble → artifact.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument};
use url::Url;

use docbundle_crawler::Crawler;
use docbundle_shared::{
    CrawlConfig, DocBundleError, ExtractionResult, FilterConfig, LocalConfig, ProgressReporter,
    Result, RunSummary, ScopeFilter,
};

use crate::assembler::{OutputSink, render_artifact};
use crate::coordinator::{Coordinator, FileExtractor};
use crate::walker::LocalEnumerator;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// What a run aggregates: a local directory or a seed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Web(Url),
}

impl Source {
    /// Classify a user-supplied source string.
    ///
    /// Anything that starts with `http://` or `https://` is a seed URL; other
    /// `scheme://` strings are rejected. Everything else must name an existing
    /// directory.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DocBundleError::invalid_source("source is empty"));
        }

        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|e| {
                DocBundleError::invalid_source(format!("invalid URL '{trimmed}': {e}"))
            })?;
            if url.host_str().is_none_or(str::is_empty) {
                return Err(DocBundleError::invalid_source(format!(
                    "URL has no host: {trimmed}"
                )));
            }
            return Ok(Self::Web(url));
        }

        if trimmed.contains("://") {
            return Err(DocBundleError::invalid_source(format!(
                "unsupported scheme in '{trimmed}' (only http and https)"
            )));
        }

        let path = PathBuf::from(trimmed);
        if !path.exists() {
            return Err(DocBundleError::invalid_source(format!(
                "'{trimmed}' does not exist"
            )));
        }
        if !path.is_dir() {
            return Err(DocBundleError::invalid_source(format!(
                "'{trimmed}' is not a directory"
            )));
        }
        Ok(Self::Local(path))
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Web(url) => write!(f, "{url}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Everything a run needs, already merged from config file and CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: Source,
    /// Where the artifact is written. Parent directories are created.
    pub output: PathBuf,
    pub filter: FilterConfig,
    pub local: LocalConfig,
    pub crawl: CrawlConfig,
}

impl RunConfig {
    /// Config with default policies for `source` and `output`.
    pub fn new(source: Source, output: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output: output.into(),
            filter: FilterConfig::default(),
            local: LocalConfig::with_cap(8),
            crawl: CrawlConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Aggregate the source into a single artifact.
///
/// Only source and sink problems are returned as errors. Failures of
/// individual units become diagnostic blocks inside the artifact.
#[instrument(skip_all, fields(source = %config.source, output = %config.output.display()))]
pub async fn run(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<RunSummary> {
    let start = Instant::now();
    let filter = ScopeFilter::new(&config.filter);

    // Source checks come before the sink creates any directories.
    let prepared = match &config.source {
        Source::Local(root) => Prepared::Local(LocalEnumerator::new(root, filter)?),
        Source::Web(seed) => {
            if seed.scheme() != "http" && seed.scheme() != "https" {
                return Err(DocBundleError::invalid_source(format!(
                    "seed URL must be http or https: {seed}"
                )));
            }
            Prepared::Web(Crawler::new(config.crawl.clone(), filter)?, seed)
        }
    };

    // Opened before any work: an unwritable destination fails the run here.
    let sink = OutputSink::open(&config.output)?;

    let results = match prepared {
        Prepared::Local(enumerator) => run_local(enumerator, config, &sink, progress).await,
        Prepared::Web(crawler, seed) => {
            progress.phase("Crawling");
            crawler.crawl(seed, progress).await?.results
        }
    };

    progress.phase("Assembling");
    let artifact = render_artifact(&results);
    let output = sink.target().to_path_buf();
    let bytes_written = sink.commit(&artifact)?;

    let summary = RunSummary {
        output,
        bytes_written,
        elapsed: start.elapsed(),
        ..RunSummary::tally(&results)
    };

    info!(
        units = summary.units,
        ok = summary.ok,
        warnings = summary.warnings,
        errors = summary.errors,
        skipped = summary.skipped,
        bytes = summary.bytes_written,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "run completed"
    );

    progress.done(&summary);
    Ok(summary)
}

/// A validated source, ready to enumerate.
enum Prepared<'a> {
    Local(LocalEnumerator),
    Web(Crawler, &'a Url),
}

async fn run_local(
    enumerator: LocalEnumerator,
    config: &RunConfig,
    sink: &OutputSink,
    progress: &dyn ProgressReporter,
) -> Vec<ExtractionResult> {
    progress.phase("Scanning");
    let enumerator = enumerator
        .exclude(sink.target())
        .exclude(sink.staging());
    let units: Vec<_> = enumerator.iter().collect();
    info!(root = %enumerator.root().display(), units = units.len(), "enumeration finished");

    progress.phase("Extracting");
    let coordinator = Coordinator::new(FileExtractor, config.local.workers);
    coordinator.run(&units, progress).await
}
