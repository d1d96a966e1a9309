//! Structural edits: rows, columns, header labels
//!
//! Every operation is total. Out-of-range indices are no-ops that return
//! `false`; nothing here returns an error. Deleting a column or row drops
//! its id from the live-order list and purges its cells, so the remaining
//! cells keep their keys and simply move up one display position.

use super::coords::{ColumnId, RowId};
use super::grid::{Grid, StaticColumn};
use crate::types::ColumnClass;
use chrono::NaiveDate;
use tracing::debug;

impl Grid {
    /// Append an empty row; returns the new row count
    pub fn add_row(&mut self) -> usize {
        let id = self.ids.next_row();
        self.rows.push(id);
        debug!(rows = self.rows.len(), "row added");
        self.notify();
        self.rows.len()
    }

    /// Append the next calendar day; returns its date
    pub fn add_date_column(&mut self) -> NaiveDate {
        let date = self.date_at_offset(self.date_columns.len());
        let id = self.ids.next_column();
        self.date_columns.push(id);
        debug!(%date, columns = self.date_columns.len(), "date column added");
        self.notify();
        date
    }

    /// Append a static text column; returns its index
    pub fn add_static_column(&mut self, label: impl Into<String>) -> usize {
        let id = self.ids.next_column();
        self.static_columns.push(StaticColumn {
            id,
            label: label.into(),
        });
        debug!(columns = self.static_columns.len(), "static column added");
        self.notify();
        self.static_columns.len() - 1
    }

    /// Relabel static column `index`; cell data is untouched
    pub fn rename_header(&mut self, index: usize, label: impl Into<String>) -> bool {
        let Some(column) = self.static_columns.get_mut(index) else {
            return false;
        };
        column.label = label.into();
        debug!(index, label = %column.label, "header renamed");
        self.notify();
        true
    }

    /// Remove static column `index` and its cells; later columns shift left
    pub fn delete_static_column(&mut self, index: usize) -> bool {
        if index >= self.static_columns.len() {
            return false;
        }
        let removed = self.static_columns.remove(index);
        self.purge_column(ColumnClass::Static, removed.id);
        debug!(index, label = %removed.label, "static column deleted");
        self.notify();
        true
    }

    /// Remove date column `index` and its cells.
    ///
    /// Labels are positional, so every later column takes the date one day
    /// earlier than before.
    pub fn delete_date_column(&mut self, index: usize) -> bool {
        if index >= self.date_columns.len() {
            return false;
        }
        let removed = self.date_columns.remove(index);
        self.purge_column(ColumnClass::Date, removed);
        debug!(index, columns = self.date_columns.len(), "date column deleted");
        self.notify();
        true
    }

    /// Remove the 1-based `row`; rows below move up.
    ///
    /// The grid always keeps one row: deleting the only row clears it.
    pub fn delete_row(&mut self, row: usize) -> bool {
        let Some(position) = row.checked_sub(1).filter(|p| *p < self.rows.len()) else {
            return false;
        };

        if self.rows.len() == 1 {
            let only = self.rows[0];
            self.purge_row(only);
            debug!(row, "only row cleared");
        } else {
            let removed = self.rows.remove(position);
            self.purge_row(removed);
            debug!(row, rows = self.rows.len(), "row deleted");
        }
        self.notify();
        true
    }

    fn purge_column(&mut self, class: ColumnClass, column: ColumnId) {
        self.cells
            .retain(|key, _| !(key.class == class && key.column == column));
    }

    fn purge_row(&mut self, row: RowId) {
        self.cells.retain(|key, _| key.row != row);
    }
}
