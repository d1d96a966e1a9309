//! Immutable, positional view of a grid
//!
//! A snapshot is what observers receive, what the export engine reads, and
//! what gets persisted. It is dense: every row carries one field per static
//! header and one flag per date column.

use crate::error::{GridError, GridResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub headers: Vec<String>,
    pub start_date: NaiveDate,
    pub date_labels: Vec<String>,
    pub row_count: usize,
    pub rows: Vec<SnapshotRow>,
}

/// One row; `fields` follow `headers`, `attendance` follows `date_labels`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub fields: Vec<String>,
    pub attendance: Vec<bool>,
}

impl SnapshotRow {
    /// No text and no checked day
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(String::is_empty) && !self.attendance.iter().any(|p| *p)
    }

    pub fn present_count(&self) -> usize {
        self.attendance.iter().filter(|p| **p).count()
    }
}

impl GridSnapshot {
    pub fn date_column_count(&self) -> usize {
        self.date_labels.len()
    }

    /// Static headers followed by the formatted date labels
    pub fn header_row(&self) -> Vec<String> {
        self.headers
            .iter()
            .chain(self.date_labels.iter())
            .cloned()
            .collect()
    }

    /// Rows holding at least one non-empty cell, with their 1-based index
    pub fn included_rows(&self) -> impl Iterator<Item = (usize, &SnapshotRow)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_empty())
            .map(|(idx, row)| (idx + 1, row))
    }

    pub fn has_data(&self) -> bool {
        self.rows.iter().any(|row| !row.is_empty())
    }

    /// Check the dense shape: `row_count` rows, each with one field per
    /// header and one flag per date label.
    ///
    /// Snapshots built by a grid always pass; deserialized or hand-built
    /// ones may not.
    pub fn validate(&self) -> GridResult<()> {
        if self.rows.len() != self.row_count {
            return Err(GridError::InvalidSnapshot(format!(
                "row_count is {} but {} rows are present",
                self.row_count,
                self.rows.len()
            )));
        }
        for (idx, row) in self.rows.iter().enumerate() {
            if row.fields.len() != self.headers.len() {
                return Err(GridError::InvalidSnapshot(format!(
                    "row {} has {} fields, expected {}",
                    idx + 1,
                    row.fields.len(),
                    self.headers.len()
                )));
            }
            if row.attendance.len() != self.date_labels.len() {
                return Err(GridError::InvalidSnapshot(format!(
                    "row {} has {} attendance flags, expected {}",
                    idx + 1,
                    row.attendance.len(),
                    self.date_labels.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str], attendance: &[bool]) -> SnapshotRow {
        SnapshotRow {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            attendance: attendance.to_vec(),
        }
    }

    #[test]
    fn test_row_emptiness() {
        assert!(row(&["", ""], &[false, false]).is_empty());
        assert!(!row(&["", "x"], &[false]).is_empty());
        assert!(!row(&["", ""], &[false, true]).is_empty());
        assert!(SnapshotRow::default().is_empty());
    }

    #[test]
    fn test_included_rows_keep_original_index() {
        let snapshot = GridSnapshot {
            headers: vec!["Name".to_string()],
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            date_labels: vec!["2024-03-01".to_string()],
            row_count: 3,
            rows: vec![
                row(&["Alice"], &[false]),
                row(&[""], &[false]),
                row(&[""], &[true]),
            ],
        };
        let indices: Vec<usize> = snapshot.included_rows().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1, 3]);
        assert_eq!(snapshot.header_row(), vec!["Name", "2024-03-01"]);
        assert!(snapshot.has_data());
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_ragged_shapes() {
        let base = GridSnapshot {
            headers: vec!["Name".to_string()],
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            date_labels: vec!["2024-03-01".to_string()],
            row_count: 1,
            rows: vec![row(&["Alice"], &[true])],
        };

        let mut extra_flags = base.clone();
        extra_flags.rows[0].attendance.push(true);
        assert!(matches!(extra_flags.validate(), Err(GridError::InvalidSnapshot(_))));

        let mut missing_field = base.clone();
        missing_field.rows[0].fields.clear();
        assert!(missing_field.validate().is_err());

        let mut wrong_count = base;
        wrong_count.row_count = 2;
        assert!(wrong_count.validate().is_err());
    }
}
