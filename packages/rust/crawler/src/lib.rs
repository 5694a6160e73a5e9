//! Scoped web crawler.
//!
//! This crate provides:
//! - [`engine`]: rate-limited, depth-first crawler that extracts every page it visits
//! - [`scope`]: the host + path-prefix containment rule for discovered links

pub mod engine;
pub mod scope;

pub use engine::{CrawlResult, Crawler};
pub use scope::WebScope;
