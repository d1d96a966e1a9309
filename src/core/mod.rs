//! Grid core: addressing, storage, structural edits, summaries

pub mod coords;
pub mod grid;
mod mutations;
pub mod snapshot;
pub mod summary;

pub use coords::{CellKey, ColumnId, RowId};
pub use grid::{is_valid_date_format, Grid, GridObserver};
pub use snapshot::{GridSnapshot, SnapshotRow};
pub use summary::{AttendanceSummary, DayTotal, MemberSummary};
