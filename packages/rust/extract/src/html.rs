//! Visible-text extraction for fetched HTML pages.

use scraper::{Html, Node};

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Collapse an HTML document to its visible text.
///
/// Text nodes are concatenated in document order, then each line is split on
/// double spaces and every non-empty trimmed fragment becomes its own line.
pub fn visible_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut raw = String::new();

    for node in doc.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            raw.push_str(text);
        }
    }

    normalize_whitespace(&raw)
}

fn normalize_whitespace(raw: &str) -> String {
    raw.lines()
        .flat_map(|line| line.trim().split("  "))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style() {
        let html = r#"<html><head><title>Docs</title><style>body { color: red; }</style></head>
            <body><h1>Guide</h1><script>alert("hi")</script><p>Read me.</p></body></html>"#;
        let text = visible_text(html);
        assert!(text.contains("Guide"));
        assert!(text.contains("Read me."));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn splits_on_double_spaces_and_drops_blanks() {
        let html = "<html><body><p>one  two</p>\n\n   \n<p>three</p></body></html>";
        assert_eq!(visible_text(html), "one\ntwo\nthree");
    }

    #[test]
    fn inline_elements_join_text() {
        let html = "<html><body><p>bold <b>word</b> here</p></body></html>";
        assert_eq!(visible_text(html), "bold word here");
    }

    #[test]
    fn empty_document() {
        assert_eq!(visible_text("<html><body></body></html>"), "");
    }
}
