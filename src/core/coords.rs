//! Cell addressing
//!
//! Cells are keyed by stable identifiers rather than by position. A column
//! or row receives its id once, at creation, and keeps it until deleted, so
//! structural edits never re-key stored cells. The grid translates display
//! positions to ids through its live-order lists.

use crate::error::{GridError, GridResult};
use crate::types::ColumnClass;
use std::fmt;
use std::str::FromStr;

/// Stable identity of a static or date column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub u64);

/// Stable identity of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u64);

/// Unique address of one stored cell.
///
/// String form is `{class tag}{column id}R{row id}`, e.g. `S0R1` or `D4R12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub class: ColumnClass,
    pub column: ColumnId,
    pub row: RowId,
}

impl CellKey {
    pub fn new(class: ColumnClass, column: ColumnId, row: RowId) -> Self {
        Self { class, column, row }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}R{}", self.class.tag(), self.column.0, self.row.0)
    }
}

impl FromStr for CellKey {
    type Err = GridError;

    fn from_str(s: &str) -> GridResult<Self> {
        let invalid = || GridError::InvalidCellKey(s.to_string());

        let mut chars = s.chars();
        let class = chars
            .next()
            .and_then(ColumnClass::from_tag)
            .ok_or_else(invalid)?;
        let (column, row) = chars.as_str().split_once('R').ok_or_else(invalid)?;
        let column = parse_id(column).ok_or_else(invalid)?;
        let row = parse_id(row).ok_or_else(invalid)?;

        Ok(CellKey::new(class, ColumnId(column), RowId(row)))
    }
}

// Plain decimal digits only; rejects signs and empty strings
fn parse_id(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Hands out monotonically increasing ids; never reuses one
#[derive(Debug, Clone, Default)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn next_column(&mut self) -> ColumnId {
        ColumnId(self.bump())
    }

    pub(crate) fn next_row(&mut self) -> RowId {
        RowId(self.bump())
    }

    fn bump(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}
