//! Runtime configuration
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields a working configuration.

use crate::core::is_valid_date_format;
use crate::error::{GridError, GridResult};
use crate::types::DEFAULT_TITLE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Static headers a fresh grid starts with
pub const DEFAULT_HEADERS: [&str; 3] = ["Name", "Phone", "ID"];

/// chrono format used for date column labels
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Worksheet name used by the XLSX and ODS writers
pub const DEFAULT_WORKSHEET_NAME: &str = "Attendance";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    pub default_headers: Vec<String>,
    pub date_format: String,
    pub default_title: String,
    pub worksheet_name: String,
    /// Escape `<`, `>`, `&` and quotes in HTML output
    pub escape_html: bool,
    pub pdf: PdfLayout,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            default_headers: DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            default_title: DEFAULT_TITLE.to_string(),
            worksheet_name: DEFAULT_WORKSHEET_NAME.to_string(),
            escape_html: true,
            pdf: PdfLayout::default(),
        }
    }
}

impl AttendanceConfig {
    /// Load from a YAML file and validate
    pub fn from_file(path: &Path) -> GridResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> GridResult<Self> {
        // An empty file deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> GridResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.worksheet_name.trim().is_empty() {
            return Err(GridError::Config(
                "worksheet_name must not be empty".to_string(),
            ));
        }
        if !is_valid_date_format(&self.date_format) {
            return Err(GridError::Config(format!(
                "date_format '{}' is not a valid chrono format",
                self.date_format
            )));
        }
        self.pdf.validate()
    }
}

/// Page geometry for the paginated document, in PDF points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfLayout {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub font_size: f64,
    pub row_height: f64,
}

impl Default for PdfLayout {
    // A4 landscape
    fn default() -> Self {
        Self {
            page_width: 842.0,
            page_height: 595.0,
            margin: 36.0,
            font_size: 9.0,
            row_height: 16.0,
        }
    }
}

impl PdfLayout {
    pub fn validate(&self) -> GridResult<()> {
        let checks = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("font_size", self.font_size),
            ("row_height", self.row_height),
        ];
        for (name, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(GridError::Config(format!(
                    "pdf.{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(GridError::Config(format!(
                "pdf.margin must not be negative, got {}",
                self.margin
            )));
        }
        if self.content_width() <= 0.0 || self.rows_per_page() < 2 {
            return Err(GridError::Config(
                "pdf page is too small for its margins and row height".to_string(),
            ));
        }
        Ok(())
    }

    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    /// Table rows that fit on one page, header row included.
    ///
    /// Two row heights are reserved for the title line and the page footer.
    pub fn rows_per_page(&self) -> usize {
        let usable = self.page_height - 2.0 * self.margin - 2.0 * self.row_height;
        if usable <= 0.0 {
            return 0;
        }
        (usable / self.row_height).floor() as usize
    }
}
