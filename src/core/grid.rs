//! Grid model: sparse cell store plus static and date column layout

use super::coords::{CellKey, ColumnId, IdAllocator, RowId};
use super::snapshot::{GridSnapshot, SnapshotRow};
use crate::config::{AttendanceConfig, DEFAULT_DATE_FORMAT, DEFAULT_HEADERS};
use crate::error::GridResult;
use crate::types::{CellValue, ColumnClass};
use chrono::format::{Item, StrftimeItems};
use chrono::{Days, Local, NaiveDate};
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use tracing::debug;

/// Receives the full grid state after every change.
///
/// Called synchronously, in the same turn as the write that caused it.
pub trait GridObserver {
    fn grid_changed(&mut self, snapshot: &GridSnapshot);
}

impl<F> GridObserver for F
where
    F: FnMut(&GridSnapshot),
{
    fn grid_changed(&mut self, snapshot: &GridSnapshot) {
        self(snapshot)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StaticColumn {
    pub(crate) id: ColumnId,
    pub(crate) label: String,
}

/// In-memory attendance table for one sheet.
///
/// Static columns hold text, date columns hold a present flag. Date column
/// `i` always stands for `start_date + i` days; its label is derived on
/// demand. Rows are addressed 1-based.
pub struct Grid {
    start_date: NaiveDate,
    date_format: String,
    pub(crate) static_columns: Vec<StaticColumn>,
    pub(crate) date_columns: Vec<ColumnId>,
    pub(crate) rows: Vec<RowId>,
    pub(crate) cells: HashMap<CellKey, CellValue>,
    pub(crate) ids: IdAllocator,
    observers: Vec<Box<dyn GridObserver>>,
    batch_depth: usize,
    batch_changed: bool,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("start_date", &self.start_date)
            .field("headers", &self.headers())
            .field("date_columns", &self.date_columns.len())
            .field("rows", &self.rows.len())
            .field("stored_cells", &self.cells.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Grid {
    /// Default headers, no date columns, one row
    pub fn new(start_date: NaiveDate) -> Self {
        Self::with_headers(start_date, DEFAULT_HEADERS)
    }

    /// Grid whose day 0 is today's local date
    pub fn starting_today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn with_headers<I, S>(start_date: NaiveDate, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids = IdAllocator::default();
        let static_columns = headers
            .into_iter()
            .map(|label| StaticColumn {
                id: ids.next_column(),
                label: label.into(),
            })
            .collect();
        let first_row = ids.next_row();

        Self {
            start_date,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            static_columns,
            date_columns: Vec::new(),
            rows: vec![first_row],
            cells: HashMap::new(),
            ids,
            observers: Vec::new(),
            batch_depth: 0,
            batch_changed: false,
        }
    }

    /// Headers and date format taken from `config`
    pub fn from_config(config: &AttendanceConfig, start_date: NaiveDate) -> Self {
        let mut grid = Self::with_headers(start_date, config.default_headers.iter().cloned());
        grid.set_date_format(&config.date_format);
        grid
    }

    /// Rebuild a grid from a snapshot produced by [`Grid::snapshot`].
    ///
    /// Cells are assigned fresh ids; only non-empty values are stored.
    pub fn from_snapshot(snapshot: &GridSnapshot) -> GridResult<Self> {
        snapshot.validate()?;

        let mut grid = Self::with_headers(snapshot.start_date, snapshot.headers.iter().cloned());
        for _ in 0..snapshot.date_labels.len() {
            let id = grid.ids.next_column();
            grid.date_columns.push(id);
        }
        // with_headers already created row 1
        for _ in 1..snapshot.row_count {
            let id = grid.ids.next_row();
            grid.rows.push(id);
        }

        for (row_idx, (row, row_id)) in snapshot.rows.iter().zip(grid.rows.clone()).enumerate() {
            for (col, text) in row.fields.iter().enumerate() {
                if !text.is_empty() {
                    let key = CellKey::new(ColumnClass::Static, grid.static_columns[col].id, row_id);
                    grid.cells.insert(key, CellValue::Text(text.clone()));
                }
            }
            for (col, present) in row.attendance.iter().enumerate() {
                if *present {
                    let key = CellKey::new(ColumnClass::Date, grid.date_columns[col], row_id);
                    grid.cells.insert(key, CellValue::Present(true));
                }
            }
            debug!(row = row_idx + 1, "restored row");
        }

        Ok(grid)
    }

    //==========================================================================
    // Layout
    //==========================================================================

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Change how date labels are rendered; rejects invalid chrono formats
    pub fn set_date_format(&mut self, format: &str) -> bool {
        if !is_valid_date_format(format) {
            return false;
        }
        self.date_format = format.to_string();
        true
    }

    pub fn static_column_count(&self) -> usize {
        self.static_columns.len()
    }

    pub fn date_column_count(&self) -> usize {
        self.date_columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn headers(&self) -> Vec<String> {
        self.static_columns.iter().map(|c| c.label.clone()).collect()
    }

    pub fn header(&self, index: usize) -> Option<&str> {
        self.static_columns.get(index).map(|c| c.label.as_str())
    }

    /// Calendar day represented by date column `index`
    pub fn date_of(&self, index: usize) -> Option<NaiveDate> {
        if index >= self.date_columns.len() {
            return None;
        }
        Some(self.date_at_offset(index))
    }

    pub fn date_labels(&self) -> Vec<String> {
        (0..self.date_columns.len())
            .map(|idx| self.format_date(self.date_at_offset(idx)))
            .collect()
    }

    /// Static headers followed by date labels
    pub fn header_row(&self) -> Vec<String> {
        let mut row = self.headers();
        row.extend(self.date_labels());
        row
    }

    pub(crate) fn date_at_offset(&self, offset: usize) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(offset as u64))
            .unwrap_or(NaiveDate::MAX)
    }

    pub(crate) fn format_date(&self, date: NaiveDate) -> String {
        render_date(date, &self.date_format)
            .or_else(|| render_date(date, DEFAULT_DATE_FORMAT))
            .unwrap_or_default()
    }

    //==========================================================================
    // Addressing
    //==========================================================================

    /// Resolve a display position to the stable key of that cell.
    ///
    /// Returns None when the column index or 1-based row is out of range.
    pub fn key_at(&self, class: ColumnClass, index: usize, row: usize) -> Option<CellKey> {
        let row_id = *self.rows.get(row.checked_sub(1)?)?;
        let column = match class {
            ColumnClass::Static => self.static_columns.get(index)?.id,
            ColumnClass::Date => *self.date_columns.get(index)?,
        };
        Some(CellKey::new(class, column, row_id))
    }

    /// Current display position of `key`, or None if its column or row is gone
    pub fn position_of(&self, key: &CellKey) -> Option<(ColumnClass, usize, usize)> {
        let index = match key.class {
            ColumnClass::Static => self.static_columns.iter().position(|c| c.id == key.column)?,
            ColumnClass::Date => self.date_columns.iter().position(|id| *id == key.column)?,
        };
        let row = self.rows.iter().position(|id| *id == key.row)? + 1;
        Some((key.class, index, row))
    }

    /// Stored cells with their display positions, in row-major order
    pub fn stored_cells(&self) -> Vec<((ColumnClass, usize, usize), &CellValue)> {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .filter_map(|(key, value)| self.position_of(key).map(|pos| (pos, value)))
            .collect();
        cells.sort_by_key(|((class, index, row), _)| (*row, *class, *index));
        cells
    }

    pub fn stored_cell_count(&self) -> usize {
        self.cells.len()
    }

    //==========================================================================
    // Cell access
    //==========================================================================

    /// Value at a position; empty default for unknown or out-of-range cells
    pub fn get_cell(&self, class: ColumnClass, index: usize, row: usize) -> CellValue {
        self.key_at(class, index, row)
            .and_then(|key| self.cells.get(&key))
            .cloned()
            .unwrap_or_else(|| class.empty_value())
    }

    pub fn text(&self, index: usize, row: usize) -> &str {
        self.key_at(ColumnClass::Static, index, row)
            .and_then(|key| self.cells.get(&key))
            .and_then(CellValue::as_text)
            .unwrap_or("")
    }

    pub fn is_present(&self, index: usize, row: usize) -> bool {
        self.key_at(ColumnClass::Date, index, row)
            .and_then(|key| self.cells.get(&key))
            .and_then(CellValue::as_present)
            .unwrap_or(false)
    }

    /// Write a cell and notify observers.
    ///
    /// Returns false, changing nothing, when the position is out of range
    /// or the value's type does not match the column class. Empty values
    /// remove the stored entry.
    pub fn set_cell(
        &mut self,
        class: ColumnClass,
        index: usize,
        row: usize,
        value: impl Into<CellValue>,
    ) -> bool {
        let value = value.into();
        if value.class() != class {
            debug!(?class, index, row, "ignoring cell write with mismatched type");
            return false;
        }
        let Some(key) = self.key_at(class, index, row) else {
            debug!(?class, index, row, "ignoring cell write out of range");
            return false;
        };

        if value.is_empty() {
            self.cells.remove(&key);
        } else {
            self.cells.insert(key, value);
        }
        debug!(%key, index, row, "cell written");
        self.notify();
        true
    }

    pub fn set_text(&mut self, index: usize, row: usize, text: impl Into<String>) -> bool {
        self.set_cell(ColumnClass::Static, index, row, CellValue::Text(text.into()))
    }

    pub fn set_present(&mut self, index: usize, row: usize, present: bool) -> bool {
        self.set_cell(ColumnClass::Date, index, row, CellValue::Present(present))
    }

    /// True when no cell of the 1-based `row` holds a value
    pub fn is_row_empty(&self, row: usize) -> bool {
        let Some(row_id) = row.checked_sub(1).and_then(|r| self.rows.get(r)) else {
            return true;
        };
        !self
            .cells
            .iter()
            .any(|(key, value)| key.row == *row_id && !value.is_empty())
    }

    //==========================================================================
    // Snapshots and observers
    //==========================================================================

    pub fn snapshot(&self) -> GridSnapshot {
        let rows = self
            .rows
            .iter()
            .map(|row_id| SnapshotRow {
                fields: self
                    .static_columns
                    .iter()
                    .map(|col| {
                        self.cells
                            .get(&CellKey::new(ColumnClass::Static, col.id, *row_id))
                            .and_then(CellValue::as_text)
                            .unwrap_or("")
                            .to_string()
                    })
                    .collect(),
                attendance: self
                    .date_columns
                    .iter()
                    .map(|col| {
                        self.cells
                            .get(&CellKey::new(ColumnClass::Date, *col, *row_id))
                            .and_then(CellValue::as_present)
                            .unwrap_or(false)
                    })
                    .collect(),
            })
            .collect();

        GridSnapshot {
            headers: self.headers(),
            start_date: self.start_date,
            date_labels: self.date_labels(),
            row_count: self.rows.len(),
            rows,
        }
    }

    /// Register an observer; it is called after every successful change
    pub fn subscribe<O>(&mut self, observer: O)
    where
        O: GridObserver + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Run several changes as one: observers hear about them once, after
    /// `f` returns, and only if something changed. Batches nest.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Grid) -> R) -> R {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 && std::mem::take(&mut self.batch_changed) {
            self.notify();
        }
        result
    }

    pub(crate) fn notify(&mut self) {
        if self.batch_depth > 0 {
            self.batch_changed = true;
            return;
        }
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.grid_changed(&snapshot);
        }
    }
}

/// True if chrono can render a calendar date with `format`.
///
/// Time and offset items (`%H`, `%S`, `%z`, ...) parse fine but fail on a
/// `NaiveDate`, so the format is checked by rendering one date.
pub fn is_valid_date_format(format: &str) -> bool {
    !format.is_empty()
        && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
        && render_date(NaiveDate::MIN, format).is_some()
}

fn render_date(date: NaiveDate, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format)).ok()?;
    Some(out)
}
