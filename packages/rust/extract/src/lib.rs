//! Format-polymorphic text extraction.
//!
//! [`extract`] turns raw bytes plus a declared [`UnitKind`] into an
//! [`ExtractionResult`]. It never returns an error and never unwinds: parser
//! failures, including panics inside third-party parsers, become a result with
//! [`UnitStatus::Error`](docbundle_shared::UnitStatus) and a one-line diagnostic.

mod html;
mod pdf;
mod sheet;
mod text;
mod word;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use docbundle_shared::{ExtractionResult, FailureKind, Result, UnitKind};

pub use html::visible_text;
pub use text::decode_text;

/// What a format extractor produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Text(String),
    /// Not text, and no extractor applies. Left out of the artifact.
    Binary,
}

/// Extract normalized text from `bytes` according to `kind`.
pub fn extract(identity: &str, kind: &UnitKind, bytes: &[u8]) -> ExtractionResult {
    if let UnitKind::Unsupported(ext) = kind {
        return ExtractionResult::unsupported(identity, ext);
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| extract_bytes(kind, bytes)));

    match outcome {
        Ok(Ok(Extracted::Text(text))) => {
            debug!(identity, %kind, chars = text.len(), "extracted");
            ExtractionResult::ok(identity, text)
        }
        Ok(Ok(Extracted::Binary)) => {
            debug!(identity, "binary content, skipping");
            ExtractionResult::skipped(identity, "binary content")
        }
        Ok(Err(e)) => {
            warn!(identity, %kind, error = %e, "extraction failed");
            ExtractionResult::failed(identity, FailureKind::ExtractionError, e)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(identity, %kind, panic = %message, "extractor panicked");
            ExtractionResult::failed(
                identity,
                FailureKind::ExtractionError,
                format!("{kind} parser panicked: {message}"),
            )
        }
    }
}

fn extract_bytes(kind: &UnitKind, bytes: &[u8]) -> Result<Extracted> {
    match kind {
        UnitKind::PlainText => Ok(text::decode_text(bytes)),
        UnitKind::Pdf => pdf::extract(bytes).map(Extracted::Text),
        UnitKind::Spreadsheet => sheet::extract(bytes).map(Extracted::Text),
        UnitKind::WordDocument => word::extract(bytes).map(Extracted::Text),
        UnitKind::Html => Ok(Extracted::Text(html::visible_text(&String::from_utf8_lossy(
            bytes,
        )))),
        UnitKind::BinaryOther => Ok(Extracted::Binary),
        UnitKind::Unsupported(_) => unreachable!("handled before dispatch"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbundle_shared::UnitStatus;

    #[test]
    fn plain_text_ok() {
        let result = extract("a.txt", &UnitKind::PlainText, b"hello");
        assert_eq!(result.status, UnitStatus::Ok);
        assert_eq!(result.rendered_block, "hello");
        assert_eq!(result.identity, "a.txt");
    }

    #[test]
    fn unsupported_never_parses() {
        let result = extract("old.doc", &UnitKind::Unsupported("doc".into()), b"\xd0\xcf\x11\xe0");
        assert_eq!(result.status, UnitStatus::Warning);
        assert!(result.rendered_block.contains(".doc"));
    }

    #[test]
    fn corrupt_pdf_is_unit_error() {
        let result = extract("broken.pdf", &UnitKind::Pdf, b"%PDF-1.4 this is not a pdf");
        assert_eq!(result.status, UnitStatus::Error);
        assert!(result.rendered_block.starts_with("[extraction-error] broken.pdf:"));
        assert!(!result.rendered_block.contains('\n'));
    }

    #[test]
    fn corrupt_spreadsheet_is_unit_error() {
        let result = extract("t.xlsx", &UnitKind::Spreadsheet, b"not a zip");
        assert_eq!(result.status, UnitStatus::Error);
        assert!(result.rendered_block.contains("t.xlsx"));
    }

    #[test]
    fn corrupt_word_document_is_unit_error() {
        let result = extract("w.docx", &UnitKind::WordDocument, b"PK\x03\x04garbage");
        assert_eq!(result.status, UnitStatus::Error);
        assert!(result.rendered_block.starts_with("[extraction-error] w.docx:"));
    }

    #[test]
    fn binary_other_is_skipped() {
        let result = extract("blob", &UnitKind::BinaryOther, &[0, 1, 2]);
        assert_eq!(result.status, UnitStatus::Skipped);
    }

    #[test]
    fn html_kind_strips_markup() {
        let html = b"<html><body><p>Visible</p><script>var x = 1;</script></body></html>";
        let result = extract("https://example.com/", &UnitKind::Html, html);
        assert_eq!(result.status, UnitStatus::Ok);
        assert_eq!(result.rendered_block, "Visible");
    }

    #[test]
    fn panic_payloads_are_readable() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
