//! Scope filter: decides whether a discovered path or URL is processed.
//!
//! The filter is pure. It looks only at names, never at file contents, so
//! both the directory walker and the crawler can consult it before any I/O.

use std::collections::HashSet;
use std::path::{Component, Path};

use url::Url;

use crate::config::FilterConfig;
use crate::types::UnitKind;

/// Verdict for one discovered identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Dispatch to the extractor with this declared kind.
    Proceed(UnitKind),
    /// Excluded; produces no output at all.
    Skip,
    /// Recognised but unextractable; carries the extension without the dot.
    Unsupported(String),
}

/// Which enumerator is asking. HTML is only extracted as markup in web mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Local,
    Web,
}

/// Compiled skip and unsupported-format rules.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    skip_dirs: HashSet<String>,
    skip_suffixes: Vec<String>,
    unsupported: HashSet<String>,
}

impl ScopeFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            skip_dirs: config.skip_dirs.iter().map(|d| d.to_lowercase()).collect(),
            skip_suffixes: config
                .skip_extensions
                .iter()
                .map(|e| dotted(&e.to_lowercase()))
                .collect(),
            unsupported: config
                .unsupported_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// True if a directory with this name must not be descended into.
    pub fn skips_dir(&self, name: &str) -> bool {
        self.skip_dirs.contains(&name.to_lowercase())
    }

    /// Admit a file by its root-relative path.
    pub fn admit_path(&self, relative: &Path) -> Admission {
        let mut components = relative.components().peekable();
        let mut file_name = None;
        while let Some(component) = components.next() {
            let Component::Normal(part) = component else {
                continue;
            };
            let part = part.to_string_lossy();
            if components.peek().is_none() {
                file_name = Some(part.into_owned());
            } else if self.skips_dir(&part) {
                return Admission::Skip;
            }
        }

        match file_name {
            Some(name) => self.admit_name(&name, SourceMode::Local),
            None => Admission::Skip,
        }
    }

    /// Admit a URL by the last segment of its path.
    ///
    /// The returned kind is provisional: the crawler replaces it with the kind
    /// announced by the response's `Content-Type`.
    pub fn admit_url(&self, url: &Url) -> Admission {
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();
        self.admit_name(name, SourceMode::Web)
    }

    fn admit_name(&self, name: &str, mode: SourceMode) -> Admission {
        let lower = name.to_lowercase();

        if self
            .skip_suffixes
            .iter()
            .any(|suffix| lower.ends_with(suffix.as_str()) && lower.len() > suffix.len())
        {
            return Admission::Skip;
        }

        if let Some(ext) = extension_of(&lower) {
            if self.unsupported.contains(ext) {
                return Admission::Unsupported(ext.to_string());
            }
        }

        Admission::Proceed(kind_for_name(&lower, mode))
    }
}

impl Default for ScopeFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

/// Declared kind from a file name's extension.
pub fn kind_for_name(name: &str, mode: SourceMode) -> UnitKind {
    let lower = name.to_lowercase();
    match extension_of(&lower) {
        Some("pdf") => UnitKind::Pdf,
        Some("xlsx" | "xlsm" | "xlsb" | "ods") => UnitKind::Spreadsheet,
        Some("docx") => UnitKind::WordDocument,
        Some("html" | "htm" | "xhtml") if mode == SourceMode::Web => UnitKind::Html,
        None if mode == SourceMode::Web => UnitKind::Html,
        _ => UnitKind::PlainText,
    }
}

fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

fn dotted(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}
