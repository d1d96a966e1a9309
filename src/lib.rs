//! Attendance grid - attendance sheets with multi-format export
//!
//! A grid has a few static text columns (name, phone, id) and one boolean
//! column per calendar day. Cells are stored sparsely under stable column
//! and row ids, so inserting or deleting rows and columns never re-keys
//! existing data.
//!
//! # Features
//!
//! - Structural edits: add/delete rows, static columns and date columns
//! - "Grid changed" observers receiving full snapshots
//! - Export to CSV, TSV, HTML, PDF, XLSX and ODS; empty rows are skipped
//! - Pluggable persistence through the [`persistence::SheetStore`] trait
//!
//! # Example
//!
//! ```
//! use attendance_grid::core::Grid;
//! use attendance_grid::export::{ExportEngine, ExportFormat};
//! use chrono::NaiveDate;
//!
//! let mut grid = Grid::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
//! grid.add_date_column();
//! grid.set_text(0, 1, "Alice");
//! grid.set_present(0, 1, true);
//!
//! let artifact = ExportEngine::default()
//!     .export(&grid.snapshot(), Some("Math 101"), ExportFormat::Csv)?;
//! assert_eq!(artifact.file_name, "Math 101.csv");
//! # Ok::<(), attendance_grid::error::GridError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod persistence;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::AttendanceConfig;
pub use error::{GridError, GridResult};
pub use types::{CellValue, ColumnClass, Sheet};
