//! Crawl scope: which discovered links may enter the frontier.

use regex::Regex;
use url::Url;

/// Host and path-prefix boundary derived from the seed URL.
#[derive(Debug, Clone)]
pub struct WebScope {
    host: String,
    port: Option<u16>,
    /// Seed path minus its last segment, always ending in `/`.
    base_path: String,
    exclude_patterns: Vec<Regex>,
}

impl WebScope {
    pub fn new(seed: &Url, exclude_patterns: &[String]) -> Self {
        let path = seed.path();
        let base_path = match path.rfind('/') {
            Some(idx) => path[..=idx].to_string(),
            None => "/".to_string(),
        };

        Self {
            host: seed.host_str().unwrap_or_default().to_string(),
            port: seed.port_or_known_default(),
            base_path,
            exclude_patterns: exclude_patterns
                .iter()
                .filter_map(|p| glob_to_regex(p))
                .collect(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// True if `url` is on the seed's host and under the seed's base path.
    pub fn in_scope(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        if url.host_str().unwrap_or_default() != self.host
            || url.port_or_known_default() != self.port
        {
            return false;
        }

        let path = url.path();
        if !path.starts_with(&self.base_path) {
            return false;
        }

        !self.exclude_patterns.iter().any(|p| p.is_match(path))
    }
}

/// Convert a glob-like pattern to a regex.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*\*", ".*")
        .replace(r"\*", "[^/]*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{escaped}$")).ok()
}
