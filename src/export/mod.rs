//! Export pipeline
//!
//! A snapshot is reduced to an [`ExportTable`] (header row plus non-empty
//! rows) and handed to the serializer for the requested format:
//! - CSV / TSV: delimited text
//! - HTML: single-table document
//! - PDF: paginated table, header repeated on every page, wide tables split
//!   into column bands
//! - XLSX / ODS: workbook with one `Attendance` worksheet

mod delimited;
mod html;
mod ods;
pub mod pdf;
mod table;
mod workbook;

pub use delimited::{to_csv, to_tsv};
pub use html::to_html;
pub use pdf::{paginate, to_pdf, ColumnPlan};
pub use table::{ExportCell, ExportTable, ABSENT, PRESENT};
pub use workbook::{WorkbookVariant, WorkbookWriter};

use crate::config::AttendanceConfig;
use crate::core::GridSnapshot;
use crate::error::{GridError, GridResult};
use crate::types::file_stem;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Output formats, one serializer each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Html,
    Pdf,
    Xlsx,
    Ods,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 6] = [
        ExportFormat::Csv,
        ExportFormat::Tsv,
        ExportFormat::Html,
        ExportFormat::Pdf,
        ExportFormat::Xlsx,
        ExportFormat::Ods,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Ods => "ods",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Tsv => "text/tab-separated-values",
            ExportFormat::Html => "text/html",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Ods => ods::ODS_MIME,
        }
    }

    /// `{title}.{extension}`, with the default title for blank titles
    pub fn file_name(self, title: Option<&str>, default_title: &str) -> String {
        format!("{}.{}", file_stem(title, default_title), self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = GridError;

    fn from_str(s: &str) -> GridResult<Self> {
        let wanted = s.trim().trim_start_matches('.').to_ascii_lowercase();
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.extension() == wanted)
            .ok_or_else(|| GridError::UnknownFormat(s.to_string()))
    }
}

/// A finished export, ready for a download or a file write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    /// Data rows written, header excluded
    pub rows: usize,
}

impl ExportArtifact {
    /// Write into `dir` under the artifact's file name.
    ///
    /// Path separators in the name are replaced so the file always lands in `dir`.
    pub fn write_to(&self, dir: &Path) -> GridResult<PathBuf> {
        let name: String = self
            .file_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
            .collect();
        let path = dir.join(name);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Dispatches snapshots to the format serializers
#[derive(Debug, Clone, Default)]
pub struct ExportEngine {
    config: AttendanceConfig,
}

impl ExportEngine {
    pub fn new(config: AttendanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    /// Export `snapshot` as `format`.
    ///
    /// Returns [`GridError::NoData`] when every row is empty.
    pub fn export(
        &self,
        snapshot: &GridSnapshot,
        title: Option<&str>,
        format: ExportFormat,
    ) -> GridResult<ExportArtifact> {
        let table = match ExportTable::from_snapshot(snapshot) {
            Ok(table) => table,
            Err(e) => {
                if e.is_no_data() {
                    warn!(%format, "export skipped: no rows with data");
                }
                return Err(e);
            }
        };

        let display_title = file_stem(title, &self.config.default_title);
        let bytes = self.serialize(&table, display_title, format)?;
        let artifact = ExportArtifact {
            format,
            file_name: format.file_name(title, &self.config.default_title),
            mime_type: format.mime_type(),
            rows: table.rows.len(),
            bytes,
        };

        info!(
            %format,
            file = %artifact.file_name,
            rows = artifact.rows,
            bytes = artifact.bytes.len(),
            "export complete"
        );
        Ok(artifact)
    }

    /// Run one serializer over an already-filtered table
    pub fn serialize(
        &self,
        table: &ExportTable,
        title: &str,
        format: ExportFormat,
    ) -> GridResult<Vec<u8>> {
        let writer = WorkbookWriter::new(&self.config.worksheet_name);
        match format {
            ExportFormat::Csv => to_csv(table),
            ExportFormat::Tsv => to_tsv(table),
            ExportFormat::Html => Ok(to_html(table, title, self.config.escape_html)),
            ExportFormat::Pdf => Ok(to_pdf(table, title, &self.config.pdf)),
            ExportFormat::Xlsx => writer.write(table, WorkbookVariant::Xlsx),
            ExportFormat::Ods => writer.write(table, WorkbookVariant::Ods),
        }
    }
}
