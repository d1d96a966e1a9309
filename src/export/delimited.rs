//! Comma- and tab-separated text

use super::table::ExportTable;
use crate::error::{GridError, GridResult};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::borrow::Cow;

/// Every field quoted, embedded quotes doubled, rows joined by `\n`
pub fn to_csv(table: &ExportTable) -> GridResult<Vec<u8>> {
    let builder = {
        let mut b = WriterBuilder::new();
        b.quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'));
        b
    };
    write_records(table, &builder, "CSV", |field| field)
}

/// Tab-separated; tabs and line breaks inside a field become spaces
pub fn to_tsv(table: &ExportTable) -> GridResult<Vec<u8>> {
    let builder = {
        let mut b = WriterBuilder::new();
        b.delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'));
        b
    };
    write_records(table, &builder, "TSV", flatten)
}

fn write_records<'a>(
    table: &'a ExportTable,
    builder: &WriterBuilder,
    kind: &str,
    prepare: impl Fn(Cow<'a, str>) -> Cow<'a, str>,
) -> GridResult<Vec<u8>> {
    let mut wtr = builder.from_writer(Vec::new());

    let headers = table.headers.iter().map(|h| prepare(Cow::Borrowed(h.as_str())));
    wtr.write_record(headers.map(|h| h.into_owned()))
        .map_err(|e| GridError::Export(format!("Failed to write {} header: {}", kind, e)))?;

    for row in table.display_rows() {
        wtr.write_record(row.into_iter().map(|c| prepare(c).into_owned()))
            .map_err(|e| GridError::Export(format!("Failed to write {} row: {}", kind, e)))?;
    }

    let mut bytes = wtr
        .into_inner()
        .map_err(|e| GridError::Export(format!("Failed to finish {}: {}", kind, e.error())))?;

    // No terminator after the last row
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    Ok(bytes)
}

fn flatten(field: Cow<'_, str>) -> Cow<'_, str> {
    if field.contains(['\t', '\n', '\r']) {
        Cow::Owned(field.replace("\r\n", " ").replace(['\t', '\n', '\r'], " "))
    } else {
        field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::table::ExportCell;
    use pretty_assertions::assert_eq;

    fn table(headers: &[&str], row: &[&str]) -> ExportTable {
        ExportTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: vec![row.iter().map(|c| ExportCell::Text(c.to_string())).collect()],
        }
    }

    #[test]
    fn test_csv_quotes_everything() {
        let bytes = to_csv(&table(&["a", "b c"], &["say \"hi\"", ""])).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "\"a\",\"b c\"\n\"say \"\"hi\"\"\",\"\""
        );
    }

    #[test]
    fn test_csv_keeps_line_breaks_inside_quotes() {
        let bytes = to_csv(&table(&["Note"], &["line one\nline two"])).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "\"Note\"\n\"line one\nline two\"");
    }

    #[test]
    fn test_tsv_flattens_separators() {
        let bytes = to_tsv(&table(&["H\t1", "H2"], &["a\tb", "c\r\nd"])).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "H 1\tH2\na b\tc d");
    }

    #[test]
    fn test_tsv_leaves_quotes_alone() {
        let bytes = to_tsv(&table(&["Name"], &["say \"hi\""])).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "Name\nsay \"hi\"");
    }
}
