//! Paginated document (PDF 1.4)
//!
//! Writes a self-contained PDF using the standard Helvetica fonts, so no
//! font files are embedded. Text outside Latin-1 is replaced by `?`. Every
//! page repeats the header row; rows that do not fit move to a new page.
//!
//! Columns are sized to their header and contents. When the columns are wider
//! than the page they are split into bands; each band gets its own pages and
//! repeats the static columns on the left. Headers are never shortened, cell
//! text may be.

use super::table::{ExportCell, ExportTable, ABSENT, PRESENT};
use crate::config::PdfLayout;
use std::fmt::Write as _;

const PRODUCER: &str = "attendance-grid";

/// Average Helvetica glyph width in ems
const GLYPH_EM: f64 = 0.6;
/// Horizontal padding inside a cell, both sides together
const CELL_PADDING: f64 = 4.0;
/// Static columns never take more than this share of the content width for their cells
const MAX_STATIC_SHARE: f64 = 1.0 / 3.0;

/// Split data rows into pages of at most `rows_per_page` rows each
pub fn paginate(rows: &[Vec<ExportCell>], rows_per_page: usize) -> Vec<&[Vec<ExportCell>]> {
    rows.chunks(rows_per_page.max(1)).collect()
}

/// Data rows per page once the repeated header row is accounted for
pub fn body_rows_per_page(layout: &PdfLayout) -> usize {
    layout.rows_per_page().saturating_sub(1).max(1)
}

/// Column widths in points and the groups of columns printed side by side
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPlan {
    pub widths: Vec<f64>,
    pub bands: Vec<Vec<usize>>,
}

impl ColumnPlan {
    pub fn new(table: &ExportTable, layout: &PdfLayout) -> Self {
        let content = layout.content_width();
        let font = layout.font_size;
        let static_count = table
            .rows
            .first()
            .map(|row| {
                row.iter()
                    .take_while(|c| matches!(c, ExportCell::Text(_)))
                    .count()
            })
            .unwrap_or(0)
            .min(table.column_count());

        let widths: Vec<f64> = table
            .headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let header_width = text_width(header.chars().count(), font);
                let body_width = if col < static_count {
                    let longest = table
                        .rows
                        .iter()
                        .filter_map(|row| row.get(col))
                        .map(|c| c.display().chars().count())
                        .max()
                        .unwrap_or(0);
                    text_width(longest, font).min(content * MAX_STATIC_SHARE)
                } else {
                    text_width(PRESENT.len().max(ABSENT.len()), font)
                };
                header_width.max(body_width).min(content)
            })
            .collect();

        let static_width: f64 = widths[..static_count].iter().sum();
        let widest_rest = widths[static_count..].iter().copied().fold(0.0, f64::max);
        let frozen: Vec<usize> = if static_width + widest_rest <= content {
            (0..static_count).collect()
        } else {
            Vec::new()
        };
        let frozen_width: f64 = frozen.iter().map(|&c| widths[c]).sum();
        let available = content - frozen_width;

        let mut bands: Vec<Vec<usize>> = Vec::new();
        let mut current = frozen.clone();
        let mut used = 0.0;
        for (col, &width) in widths.iter().enumerate().skip(frozen.len()) {
            if used > 0.0 && used + width > available {
                bands.push(std::mem::replace(&mut current, frozen.clone()));
                used = 0.0;
            }
            current.push(col);
            used += width;
        }
        bands.push(current);

        Self { widths, bands }
    }
}

pub fn to_pdf(table: &ExportTable, title: &str, layout: &PdfLayout) -> Vec<u8> {
    let plan = ColumnPlan::new(table, layout);
    let chunks = paginate(&table.rows, body_rows_per_page(layout));
    let page_count = chunks.len() * plan.bands.len();

    let streams: Vec<String> = chunks
        .iter()
        .flat_map(|rows| plan.bands.iter().map(move |band| (*rows, band)))
        .enumerate()
        .map(|(idx, (rows, band))| {
            let page = Page {
                number: idx + 1,
                count: page_count,
                columns: band,
            };
            page_content(table, rows, title, &page, &plan, layout)
        })
        .collect();

    PdfWriter::new().finish(&streams, title, layout)
}

//==============================================================================
// Page layout
//==============================================================================

struct Page<'a> {
    number: usize,
    count: usize,
    columns: &'a [usize],
}

fn page_content(
    table: &ExportTable,
    rows: &[Vec<ExportCell>],
    title: &str,
    page: &Page<'_>,
    plan: &ColumnPlan,
    layout: &PdfLayout,
) -> String {
    let mut out = String::new();
    let text_offset = ((layout.row_height - layout.font_size) / 2.0).max(0.0) + 1.0;
    let left = layout.margin;
    let top = layout.page_height - layout.margin;

    // Title line
    let _ = writeln!(
        out,
        "BT /F2 {} Tf {} {} Td ({}) Tj ET",
        num(layout.font_size + 2.0),
        num(left),
        num(top - layout.row_height + text_offset),
        pdf_text(title, usize::MAX)
    );

    // Left edge of every column on this page
    let mut slots = Vec::with_capacity(page.columns.len());
    let mut x = left;
    for &col in page.columns {
        slots.push(Slot {
            col,
            x,
            width: plan.widths[col],
        });
        x += plan.widths[col];
    }

    // Header row, shaded
    let header_y = top - 2.0 * layout.row_height;
    let _ = writeln!(
        out,
        "0.9 g {} {} {} {} re f 0 g",
        num(left),
        num(header_y),
        num(x - left),
        num(layout.row_height)
    );
    for slot in &slots {
        let header = table.headers.get(slot.col).map(String::as_str).unwrap_or_default();
        cell(&mut out, "F2", header, slot, header_y, text_offset, layout);
    }

    for (idx, row) in rows.iter().enumerate() {
        let y = header_y - (idx + 1) as f64 * layout.row_height;
        for slot in &slots {
            let value = row.get(slot.col).map(ExportCell::display).unwrap_or_default();
            cell(&mut out, "F1", &value, slot, y, text_offset, layout);
        }
    }

    // Footer
    let _ = writeln!(
        out,
        "BT /F1 {} Tf {} {} Td (Page {} of {}) Tj ET",
        num(layout.font_size),
        num(left),
        num(layout.margin - layout.font_size.min(layout.margin)),
        page.number,
        page.count
    );
    out
}

struct Slot {
    col: usize,
    x: f64,
    width: f64,
}

fn cell(out: &mut String, font: &str, text: &str, slot: &Slot, y: f64, text_offset: f64, layout: &PdfLayout) {
    let _ = writeln!(
        out,
        "0.5 w {} {} {} {} re S",
        num(slot.x),
        num(y),
        num(slot.width),
        num(layout.row_height)
    );
    if text.is_empty() {
        return;
    }
    let _ = writeln!(
        out,
        "BT /{} {} Tf {} {} Td ({}) Tj ET",
        font,
        num(layout.font_size),
        num(slot.x + CELL_PADDING / 2.0),
        num(y + text_offset),
        pdf_text(text, fit_chars(slot.width, layout.font_size))
    );
}

/// Column width that holds `chars` glyphs
fn text_width(chars: usize, font_size: f64) -> f64 {
    (chars as f64 + 0.5) * font_size * GLYPH_EM + CELL_PADDING
}

/// Glyphs that fit in a column of `width` points
fn fit_chars(width: f64, font_size: f64) -> usize {
    let usable = (width - CELL_PADDING).max(0.0);
    ((usable / (font_size * GLYPH_EM)).floor() as usize).max(1)
}

fn num(v: f64) -> String {
    let s = format!("{:.2}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Escape text for a PDF literal string, truncating to `max_chars` glyphs
fn pdf_text(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let truncated: Vec<char> = if chars.len() > max_chars {
        if max_chars > 3 {
            let mut kept: Vec<char> = chars[..max_chars - 3].to_vec();
            kept.extend(['.', '.', '.']);
            kept
        } else {
            chars[..max_chars].to_vec()
        }
    } else {
        chars
    };

    let mut out = String::with_capacity(truncated.len());
    for c in truncated {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c if c.is_control() => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}

//==============================================================================
// Object serialization
//==============================================================================

// Fixed object numbers; pages start at FIRST_PAGE_OBJ, two objects each
const CATALOG_OBJ: usize = 1;
const PAGES_OBJ: usize = 2;
const FONT_REGULAR_OBJ: usize = 3;
const FONT_BOLD_OBJ: usize = 4;
const INFO_OBJ: usize = 5;
const FIRST_PAGE_OBJ: usize = 6;

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, number: usize, body: &str) {
        // Objects are written in number order, so offsets[n - 1] is object n
        debug_assert_eq!(self.offsets.len() + 1, number);
        self.offsets.push(self.buf.len());
        self.buf
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", number, body).as_bytes());
    }

    fn finish(mut self, streams: &[String], title: &str, layout: &PdfLayout) -> Vec<u8> {
        let page_obj = |i: usize| FIRST_PAGE_OBJ + 2 * i;
        let kids: Vec<String> = (0..streams.len())
            .map(|i| format!("{} 0 R", page_obj(i)))
            .collect();

        self.object(
            CATALOG_OBJ,
            &format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_OBJ),
        );
        self.object(
            PAGES_OBJ,
            &format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                streams.len()
            ),
        );
        self.object(
            FONT_REGULAR_OBJ,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        self.object(
            FONT_BOLD_OBJ,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
        );
        self.object(
            INFO_OBJ,
            &format!(
                "<< /Title ({}) /Producer ({}) >>",
                pdf_text(title, usize::MAX),
                PRODUCER
            ),
        );

        for (i, stream) in streams.iter().enumerate() {
            self.object(
                page_obj(i),
                &format!(
                    "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 {} 0 R /F2 {} 0 R >> >> /Contents {} 0 R >>",
                    PAGES_OBJ,
                    num(layout.page_width),
                    num(layout.page_height),
                    FONT_REGULAR_OBJ,
                    FONT_BOLD_OBJ,
                    page_obj(i) + 1
                ),
            );
            self.object(
                page_obj(i) + 1,
                &format!(
                    "<< /Length {} >>\nstream\n{}endstream",
                    stream.len(),
                    stream
                ),
            );
        }

        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        for offset in &self.offsets {
            let _ = write!(xref, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, CATALOG_OBJ, INFO_OBJ, xref_offset
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}
