//! Export-ready table: header row plus the non-empty data rows

use crate::core::GridSnapshot;
use crate::error::{GridError, GridResult};
use std::borrow::Cow;

pub const PRESENT: &str = "Present";
pub const ABSENT: &str = "Absent";

/// One cell as the serializers see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportCell {
    Text(String),
    Attendance(bool),
}

impl ExportCell {
    /// Text shown in every textual format; attendance never appears as a raw bool
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            ExportCell::Text(s) => Cow::Borrowed(s),
            ExportCell::Attendance(true) => Cow::Borrowed(PRESENT),
            ExportCell::Attendance(false) => Cow::Borrowed(ABSENT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<ExportCell>>,
}

impl ExportTable {
    /// Build from a snapshot, skipping empty rows.
    ///
    /// Fails with [`GridError::NoData`] when no row qualifies and with
    /// [`GridError::InvalidSnapshot`] when a row does not match the headers.
    pub fn from_snapshot(snapshot: &GridSnapshot) -> GridResult<Self> {
        snapshot.validate()?;

        let rows: Vec<Vec<ExportCell>> = snapshot
            .included_rows()
            .map(|(_, row)| {
                row.fields
                    .iter()
                    .cloned()
                    .map(ExportCell::Text)
                    .chain(row.attendance.iter().copied().map(ExportCell::Attendance))
                    .collect()
            })
            .collect();

        if rows.is_empty() {
            return Err(GridError::NoData);
        }

        Ok(Self {
            headers: snapshot.header_row(),
            rows,
        })
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Data rows rendered to display text
    pub fn display_rows(&self) -> impl Iterator<Item = Vec<Cow<'_, str>>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(ExportCell::display).collect())
    }
}
