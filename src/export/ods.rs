//! OpenDocument spreadsheet encoder
//!
//! The archive holds the uncompressed `mimetype` entry first, then the
//! manifest, styles and content parts.

use super::workbook::SheetLayout;
use crate::error::{GridError, GridResult};
use quick_xml::escape::escape;
use std::borrow::Cow;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub(crate) const ODS_MIME: &str = "application/vnd.oasis.opendocument.spreadsheet";

const MANIFEST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
 <manifest:file-entry manifest:full-path="/" manifest:version="1.2" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
 <manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/>
</manifest:manifest>
"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" office:version="1.2"/>
"#;

pub(crate) fn write_ods(layout: &SheetLayout<'_>) -> GridResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("mimetype", stored).map_err(zip_error)?;
    zip.write_all(ODS_MIME.as_bytes())?;

    zip.start_file("META-INF/manifest.xml", deflated)
        .map_err(zip_error)?;
    zip.write_all(MANIFEST_XML.as_bytes())?;

    zip.start_file("styles.xml", deflated).map_err(zip_error)?;
    zip.write_all(STYLES_XML.as_bytes())?;

    zip.start_file("content.xml", deflated).map_err(zip_error)?;
    zip.write_all(content_xml(layout).as_bytes())?;

    let cursor = zip.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

fn zip_error(e: zip::result::ZipError) -> GridError {
    GridError::Export(format!("Failed to write ODS archive: {}", e))
}

fn content_xml(layout: &SheetLayout<'_>) -> String {
    let mut out = String::with_capacity(1024 + layout.rows.len() * layout.column_count() * 64);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(concat!(
        r#"<office:document-content"#,
        r#" xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0""#,
        r#" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0""#,
        r#" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0""#,
        r#" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0""#,
        r#" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0""#,
        r#" office:version="1.2">"#
    ));
    out.push('\n');
    out.push_str(concat!(
        "<office:automatic-styles>",
        r#"<style:style style:name="hdr" style:family="table-cell">"#,
        r#"<style:text-properties fo:font-weight="bold"/>"#,
        "</style:style>",
        "</office:automatic-styles>\n"
    ));
    out.push_str("<office:body><office:spreadsheet>\n");
    out.push_str(&format!(
        "<table:table table:name=\"{}\">\n",
        xml_text(layout.name)
    ));
    if layout.column_count() > 0 {
        out.push_str(&format!(
            "<table:table-column table:number-columns-repeated=\"{}\"/>\n",
            layout.column_count()
        ));
    }

    out.push_str("<table:table-row>");
    for header in layout.headers {
        string_cell(&mut out, header, Some("hdr"));
    }
    out.push_str("</table:table-row>\n");

    for row in &layout.rows {
        out.push_str("<table:table-row>");
        for value in row {
            string_cell(&mut out, value, None);
        }
        out.push_str("</table:table-row>\n");
    }

    out.push_str("</table:table>\n</office:spreadsheet></office:body>\n</office:document-content>\n");
    out
}

fn string_cell(out: &mut String, value: &str, style: Option<&str>) {
    if value.is_empty() {
        out.push_str("<table:table-cell/>");
        return;
    }
    out.push_str("<table:table-cell");
    if let Some(style) = style {
        out.push_str(&format!(" table:style-name=\"{}\"", style));
    }
    out.push_str(" office:value-type=\"string\">");
    // One paragraph per line; readers join them back with newlines
    for line in value.split('\n') {
        out.push_str(&format!("<text:p>{}</text:p>", xml_text(line)));
    }
    out.push_str("</table:table-cell>");
}

/// Escaped character data; characters XML 1.0 cannot carry become spaces
fn xml_text(value: &str) -> Cow<'_, str> {
    let allowed = |c: char| match c {
        '\t' | '\n' | '\r' => true,
        '\u{fffe}' | '\u{ffff}' => false,
        c => !c.is_control(),
    };
    if value.chars().all(allowed) {
        return escape(value);
    }
    let cleaned: String = value
        .chars()
        .map(|c| if allowed(c) { c } else { ' ' })
        .collect();
    Cow::Owned(escape(&cleaned).into_owned())
}
