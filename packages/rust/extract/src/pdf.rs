//! PDF text extraction, page by page.

use lopdf::Document;
use tracing::debug;

use docbundle_shared::{DocBundleError, Result};

/// Text of every page in order, joined by newlines.
///
/// Pages without a text layer (scans) contribute nothing. Only a document
/// that cannot be parsed at all is an error.
pub(crate) fn extract(bytes: &[u8]) -> Result<String> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| DocBundleError::Extraction(format!("unreadable PDF: {e}")))?;

    let mut pages = Vec::new();
    for (number, _) in doc.get_pages() {
        match doc.extract_text(&[number]) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    pages.push(text.to_string());
                }
            }
            Err(e) => debug!(page = number, error = %e, "no extractable text on page"),
        }
    }

    Ok(pages.join("\n"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build a PDF with one page per entry; `None` makes an empty page.
    pub(crate) fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids = Vec::new();
        for text in pages {
            let mut operations = Vec::new();
            if let Some(text) = text {
                operations = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ];
            }
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn single_page() {
        let pdf = build_pdf(&[Some("world")]);
        assert_eq!(extract(&pdf).unwrap(), "world");
    }

    #[test]
    fn pages_in_order_and_blank_pages_dropped() {
        let pdf = build_pdf(&[Some("first"), None, Some("third")]);
        assert_eq!(extract(&pdf).unwrap(), "first\nthird");
    }

    #[test]
    fn garbage_is_error() {
        assert!(extract(b"definitely not a pdf").is_err());
    }
}
