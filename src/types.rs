use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title used for file names when a sheet has none.
pub const DEFAULT_TITLE: &str = "Attendance";

//==============================================================================
// Cell Values
//==============================================================================

/// Which family of columns a cell lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnClass {
    /// User-labelled text column (name, phone, ...)
    Static,
    /// Implicit boolean column tied to one calendar day
    Date,
}

impl ColumnClass {
    /// Single-letter tag used in cell keys
    pub fn tag(self) -> char {
        match self {
            ColumnClass::Static => 'S',
            ColumnClass::Date => 'D',
        }
    }

    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'S' => Some(ColumnClass::Static),
            'D' => Some(ColumnClass::Date),
            _ => None,
        }
    }

    /// The value a cell of this class holds when nothing was written
    pub fn empty_value(self) -> CellValue {
        match self {
            ColumnClass::Static => CellValue::Text(String::new()),
            ColumnClass::Date => CellValue::Present(false),
        }
    }
}

/// Value stored in one grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellValue {
    Text(String),
    Present(bool),
}

impl CellValue {
    pub fn class(&self) -> ColumnClass {
        match self {
            CellValue::Text(_) => ColumnClass::Static,
            CellValue::Present(_) => ColumnClass::Date,
        }
    }

    /// Empty string or unchecked box
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Text(s) => s.is_empty(),
            CellValue::Present(p) => !p,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Present(_) => None,
        }
    }

    pub fn as_present(&self) -> Option<bool> {
        match self {
            CellValue::Present(p) => Some(*p),
            CellValue::Text(_) => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<bool> for CellValue {
    fn from(p: bool) -> Self {
        CellValue::Present(p)
    }
}

//==============================================================================
// Sheet Metadata
//==============================================================================

/// Who the sheet tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    #[default]
    Student,
    Employee,
}

/// Preferred reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SheetView {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

/// Identity and metadata of an attendance sheet.
///
/// The grid core only reads the title; everything else is carried for the
/// persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub kind: SheetKind,
    #[serde(default)]
    pub view: SheetView,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

impl Sheet {
    pub fn new(title: impl Into<String>, created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            kind: SheetKind::default(),
            view: SheetView::default(),
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            member_ids: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: SheetKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_view(mut self, view: SheetView) -> Self {
        self.view = view;
        self
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    /// Add a member id; returns false if already present
    pub fn add_member(&mut self, member_id: impl Into<String>) -> bool {
        let member_id = member_id.into();
        if self.member_ids.contains(&member_id) {
            return false;
        }
        self.member_ids.push(member_id);
        self.touch();
        true
    }

    pub fn remove_member(&mut self, member_id: &str) -> bool {
        let before = self.member_ids.len();
        self.member_ids.retain(|m| m != member_id);
        let removed = self.member_ids.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Base name for exported files: the trimmed title, or `default` when blank
    pub fn file_stem<'a>(&'a self, default: &'a str) -> &'a str {
        file_stem(Some(&self.title), default)
    }

    /// Bump `updated_at` to now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Trimmed title, falling back to `default` when missing or blank
pub fn file_stem<'a>(title: Option<&'a str>, default: &'a str) -> &'a str {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => default,
    }
}
