//! Spreadsheet extraction: one header per sheet, one tab-separated line per row.

use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use tracing::debug;

use docbundle_shared::{DocBundleError, Result};

pub(crate) fn extract(bytes: &[u8]) -> Result<String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DocBundleError::Extraction(format!("unreadable workbook: {e}")))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| DocBundleError::Extraction(format!("sheet '{name}': {e}")))?;
        debug!(sheet = %name, rows = range.height(), "read sheet");
        sheets.push(render_sheet(&name, &range));
    }

    Ok(sheets.join("\n"))
}

/// Render one sheet. Rows that are blank after joining are omitted.
pub(crate) fn render_sheet(name: &str, range: &Range<Data>) -> String {
    let mut out = format!("## {name}\n");
    for row in range.rows() {
        let line = row.iter().map(cell_text).collect::<Vec<_>>().join("\t");
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
