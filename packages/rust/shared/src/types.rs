//! Core domain types for an aggregation run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

// ---------------------------------------------------------------------------
// UnitKind
// ---------------------------------------------------------------------------

/// Declared format of a content unit, decided before any bytes are read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Source code, configuration, prose: anything read as text.
    PlainText,
    Pdf,
    /// `.xlsx` and friends; one block per workbook.
    Spreadsheet,
    /// `.docx`.
    WordDocument,
    /// Fetched HTML page (web mode only).
    Html,
    /// Recognised but not extractable (legacy binary office formats).
    /// Carries the lowercase extension without the dot.
    Unsupported(String),
    /// Bytes that are not text and have no extractor.
    BinaryOther,
}

impl UnitKind {
    /// Short lowercase label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PlainText => "plain-text",
            Self::Pdf => "pdf",
            Self::Spreadsheet => "spreadsheet",
            Self::WordDocument => "word-document",
            Self::Html => "html",
            Self::Unsupported(_) => "unsupported",
            Self::BinaryOther => "binary-other",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ContentUnit
// ---------------------------------------------------------------------------

/// Where the bytes of a unit live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Absolute path on the local filesystem.
    Path(PathBuf),
    Url(Url),
}

/// One file or one fetched page, the indivisible extraction target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUnit {
    /// Root-relative `/`-separated path, or absolute URL. Unique within a run.
    pub identity: String,
    pub kind: UnitKind,
    pub location: SourceLocation,
}

impl ContentUnit {
    pub fn new(identity: impl Into<String>, kind: UnitKind, location: SourceLocation) -> Self {
        Self {
            identity: identity.into(),
            kind,
            location,
        }
    }
}

// ---------------------------------------------------------------------------
// ExtractionResult
// ---------------------------------------------------------------------------

/// Outcome category of a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitStatus {
    Ok,
    /// Deliberately left out of the artifact (binary content).
    Skipped,
    /// Placeholder emitted instead of content (unsupported format).
    Warning,
    Error,
}

/// Unit-scoped failure taxonomy. Every variant is non-fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnsupportedFormat,
    ReadError,
    DecodeError,
    ExtractionError,
    FetchError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported-format",
            Self::ReadError => "read-error",
            Self::DecodeError => "decode-error",
            Self::ExtractionError => "extraction-error",
            Self::FetchError => "fetch-error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one of these exists per enumerated unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub identity: String,
    /// Extracted text, or a one-line diagnostic for warnings and errors.
    pub rendered_block: String,
    pub status: UnitStatus,
}

impl ExtractionResult {
    pub fn ok(identity: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            rendered_block: text.into(),
            status: UnitStatus::Ok,
        }
    }

    pub fn skipped(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            rendered_block: reason.into(),
            status: UnitStatus::Skipped,
        }
    }

    /// Placeholder for a recognised but unextractable extension.
    pub fn unsupported(identity: impl Into<String>, extension: &str) -> Self {
        let identity = identity.into();
        let rendered_block = format!(
            "[{}] {identity}: .{extension} files are not supported",
            FailureKind::UnsupportedFormat
        );
        Self {
            identity,
            rendered_block,
            status: UnitStatus::Warning,
        }
    }

    /// One-line diagnostic naming the failure kind and the source identity.
    pub fn failed(identity: impl Into<String>, kind: FailureKind, detail: impl fmt::Display) -> Self {
        let identity = identity.into();
        let detail = detail.to_string();
        let detail = detail.lines().next().unwrap_or_default().trim();
        let rendered_block = format!("[{kind}] {identity}: {detail}");
        Self {
            identity,
            rendered_block,
            status: UnitStatus::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Output artifact path.
    pub output: PathBuf,
    /// Units that produced a result.
    pub units: usize,
    pub ok: usize,
    pub warnings: usize,
    pub errors: usize,
    pub skipped: usize,
    /// Size of the written artifact in bytes.
    pub bytes_written: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Tally statuses of a finished result list.
    pub fn tally(results: &[ExtractionResult]) -> Self {
        let mut summary = Self {
            units: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                UnitStatus::Ok => summary.ok += 1,
                UnitStatus::Warning => summary.warnings += 1,
                UnitStatus::Error => summary.errors += 1,
                UnitStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_is_one_line() {
        let result = ExtractionResult::failed(
            "src/a.txt",
            FailureKind::ReadError,
            "permission denied\nsecond line",
        );
        assert_eq!(result.status, UnitStatus::Error);
        assert_eq!(result.rendered_block, "[read-error] src/a.txt: permission denied");
    }

    #[test]
    fn unsupported_names_extension() {
        let result = ExtractionResult::unsupported("legacy/report.doc", "doc");
        assert_eq!(result.status, UnitStatus::Warning);
        assert!(result.rendered_block.contains(".doc"));
        assert!(result.rendered_block.contains("legacy/report.doc"));
        assert!(result.rendered_block.starts_with("[unsupported-format]"));
    }

    #[test]
    fn tally_counts_each_status() {
        let results = vec![
            ExtractionResult::ok("a", "x"),
            ExtractionResult::ok("b", "y"),
            ExtractionResult::unsupported("c.xls", "xls"),
            ExtractionResult::failed("d", FailureKind::FetchError, "HTTP 404"),
            ExtractionResult::skipped("e", "binary"),
        ];
        let summary = RunSummary::tally(&results);
        assert_eq!(summary.units, 5);
        assert_eq!(summary.ok, 2);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.skipped, 1);
    }
}
