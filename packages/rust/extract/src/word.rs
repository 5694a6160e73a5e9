//! Word (`.docx`) extraction: non-blank paragraphs, one per line.

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild, read_docx};

use docbundle_shared::{DocBundleError, Result};

pub(crate) fn extract(bytes: &[u8]) -> Result<String> {
    let docx = read_docx(bytes)
        .map_err(|e| DocBundleError::Extraction(format!("unreadable Word document: {e}")))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

/// Concatenate the text runs of a paragraph, including those inside hyperlinks.
fn paragraph_text(para: &Paragraph) -> String {
    let mut text = String::new();
    push_children(&para.children, &mut text);
    text
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for rc in &run.children {
                    match rc {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            _ => {}
        }
    }
}
