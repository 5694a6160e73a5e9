//! Shared types, error model, configuration and progress tracking for docbundle.
//!
//! This crate is the foundation depended on by all other docbundle crates.
//! It provides:
//! - [`DocBundleError`]: the unified error type
//! - Domain types ([`ContentUnit`], [`UnitKind`], [`ExtractionResult`], [`RunSummary`])
//! - The [`ScopeFilter`] consulted by both enumerators
//! - [`ProgressTracker`] and the [`ProgressReporter`] callback trait
//! - Configuration ([`AppConfig`], [`CrawlConfig`], [`LocalConfig`], config loading)

pub mod config;
pub mod error;
pub mod filter;
pub mod progress;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, CrawlPolicyConfig, DEFAULT_USER_AGENT, FilterConfig, LocalConfig,
    LocalPolicyConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    to_toml,
};
pub use error::{DocBundleError, Result};
pub use filter::{Admission, ScopeFilter, SourceMode, kind_for_name};
pub use progress::{ProgressReporter, ProgressSnapshot, ProgressTracker, SilentProgress};
pub use types::{
    ContentUnit, ExtractionResult, FailureKind, RunSummary, SourceLocation, UnitKind, UnitStatus,
};
