//! Spreadsheet workbooks
//!
//! XLSX and ODS share one writer: the table is laid out once as a grid of
//! string cells with a bold header row, then handed to the variant's
//! encoder. Attendance cells are the strings `Present` / `Absent`.

use super::ods;
use super::table::ExportTable;
use crate::error::{GridError, GridResult};
use rust_xlsxwriter::{Format, Workbook};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookVariant {
    Xlsx,
    Ods,
}

/// Laid-out worksheet shared by both encoders
pub(crate) struct SheetLayout<'a> {
    pub(crate) name: &'a str,
    pub(crate) headers: &'a [String],
    pub(crate) rows: Vec<Vec<Cow<'a, str>>>,
}

impl SheetLayout<'_> {
    pub(crate) fn column_count(&self) -> usize {
        self.headers.len()
    }
}

pub struct WorkbookWriter<'a> {
    sheet_name: &'a str,
}

impl<'a> WorkbookWriter<'a> {
    pub fn new(sheet_name: &'a str) -> Self {
        Self { sheet_name }
    }

    pub fn write(&self, table: &ExportTable, variant: WorkbookVariant) -> GridResult<Vec<u8>> {
        let layout = SheetLayout {
            name: self.sheet_name,
            headers: &table.headers,
            rows: table.display_rows().collect(),
        };
        match variant {
            WorkbookVariant::Xlsx => write_xlsx(&layout),
            WorkbookVariant::Ods => ods::write_ods(&layout),
        }
    }
}

fn write_xlsx(layout: &SheetLayout<'_>) -> GridResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(layout.name)
        .map_err(|e| GridError::Export(format!("Failed to set worksheet name: {}", e)))?;

    for (col, header) in layout.headers.iter().enumerate() {
        let col = column_number(col)?;
        worksheet
            .write_string_with_format(0, col, header.as_str(), &bold)
            .map_err(|e| GridError::Export(format!("Failed to write header: {}", e)))?;
    }

    for (row_idx, row) in layout.rows.iter().enumerate() {
        let excel_row = u32::try_from(row_idx + 1)
            .map_err(|_| GridError::Export(format!("Row {} exceeds worksheet limits", row_idx + 1)))?;
        for (col, value) in row.iter().enumerate() {
            // Blank cells stay unwritten so readers see them as empty
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(excel_row, column_number(col)?, &**value)
                .map_err(|e| GridError::Export(format!("Failed to write cell: {}", e)))?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| GridError::Export(format!("Failed to freeze header row: {}", e)))?;

    workbook
        .save_to_buffer()
        .map_err(|e| GridError::Export(format!("Failed to save workbook: {}", e)))
}

fn column_number(col: usize) -> GridResult<u16> {
    u16::try_from(col)
        .map_err(|_| GridError::Export(format!("Column {} exceeds worksheet limits", col + 1)))
}
