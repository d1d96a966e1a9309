//! Standalone HTML document containing one table

use super::table::ExportTable;
use quick_xml::escape::escape;

/// Render `table` as an HTML page titled `title`.
///
/// With `escape_values` off, cell text is inserted verbatim, which is the
/// legacy behaviour and unsafe for untrusted input.
pub fn to_html(table: &ExportTable, title: &str, escape_values: bool) -> Vec<u8> {
    let text = |s: &str| -> String {
        if escape_values {
            escape(s).into_owned()
        } else {
            s.to_string()
        }
    };

    let mut out = String::with_capacity(256 + table.rows.len() * table.column_count() * 24);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    // The title is always escaped; it is not table data
    out.push_str(&format!("<title>{}</title>\n", escape(title)));
    out.push_str("</head>\n<body>\n<table border=\"1\">\n<thead>\n<tr>");
    for header in &table.headers {
        out.push_str(&format!("<th>{}</th>", text(header.as_str())));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in table.display_rows() {
        out.push_str("<tr>");
        for cell in &row {
            out.push_str(&format!("<td>{}</td>", text(&**cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out.into_bytes()
}
