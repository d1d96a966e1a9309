use thiserror::Error;

pub type GridResult<T> = Result<T, GridError>;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Every row of the grid is empty, so there is nothing to export.
    #[error("No attendance data to export")]
    NoData,

    #[error("Export error: {0}")]
    Export(String),

    #[error("Invalid cell key: {0}")]
    InvalidCellKey(String),

    #[error("Invalid grid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// A row, column or day position outside the current grid.
    #[error("Position out of range: {0}")]
    OutOfRange(String),
}

impl GridError {
    /// True for conditions the user should see as a notice rather than a failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, GridError::NoData)
    }
}
