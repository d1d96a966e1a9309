//! Persistence collaborator
//!
//! The grid core never reaches a store through global state: a store handle
//! is injected into whatever owns the sheet. Writes are fire-and-forget from
//! the grid's point of view; a failed save is logged and recorded, and the
//! in-memory grid is left as it is.

use crate::core::{GridObserver, GridSnapshot};
use crate::error::{GridError, GridResult};
use crate::types::Sheet;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// What gets stored for one sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDocument {
    pub sheet: Sheet,
    pub grid: GridSnapshot,
}

pub trait SheetStore {
    fn load(&self, sheet_id: &str) -> GridResult<SheetDocument>;

    fn save(&self, document: &SheetDocument) -> GridResult<()>;

    /// Returns false when there was nothing to delete
    fn delete(&self, sheet_id: &str) -> GridResult<bool>;

    /// All stored sheets, most recently updated first
    fn list(&self) -> GridResult<Vec<Sheet>>;
}

/// Find a sheet by id, or failing that by exact title
pub fn find_sheet(store: &dyn SheetStore, key: &str) -> GridResult<Sheet> {
    let sheets = store.list()?;
    if let Some(sheet) = sheets.iter().find(|s| s.id == key) {
        return Ok(sheet.clone());
    }
    let mut by_title = sheets.into_iter().filter(|s| s.title == key);
    match (by_title.next(), by_title.next()) {
        (Some(sheet), None) => Ok(sheet),
        (Some(_), Some(_)) => Err(GridError::Persistence(format!(
            "more than one sheet is titled '{}'; use its id",
            key
        ))),
        (None, _) => Err(GridError::SheetNotFound(key.to_string())),
    }
}

fn sort_recent_first(sheets: &mut [Sheet]) {
    sheets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

//==============================================================================
// JSON files on disk
//==============================================================================

/// One pretty-printed JSON document per sheet, named `{id}.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, sheet_id: &str) -> GridResult<PathBuf> {
        let valid = !sheet_id.is_empty()
            && sheet_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(GridError::Persistence(format!(
                "sheet id '{}' is not usable as a file name",
                sheet_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", sheet_id)))
    }
}

impl SheetStore for JsonFileStore {
    fn load(&self, sheet_id: &str) -> GridResult<SheetDocument> {
        let path = self.path_for(sheet_id)?;
        if !path.exists() {
            return Err(GridError::SheetNotFound(sheet_id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, document: &SheetDocument) -> GridResult<()> {
        let path = self.path_for(&document.sheet.id)?;
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(document)?;

        // Write then rename so a crash never leaves half a document
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "sheet saved");
        Ok(())
    }

    fn delete(&self, sheet_id: &str) -> GridResult<bool> {
        let path = self.path_for(sheet_id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    fn list(&self) -> GridResult<Vec<Sheet>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut sheets = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<SheetDocument>(&content) {
                Ok(doc) => sheets.push(doc.sheet),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable sheet file"),
            }
        }
        sort_recent_first(&mut sheets);
        Ok(sheets)
    }
}

//==============================================================================
// In-memory
//==============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, SheetDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> GridResult<std::sync::MutexGuard<'_, HashMap<String, SheetDocument>>> {
        self.documents
            .lock()
            .map_err(|_| GridError::Persistence("memory store lock poisoned".to_string()))
    }
}

impl SheetStore for MemoryStore {
    fn load(&self, sheet_id: &str) -> GridResult<SheetDocument> {
        self.documents()?
            .get(sheet_id)
            .cloned()
            .ok_or_else(|| GridError::SheetNotFound(sheet_id.to_string()))
    }

    fn save(&self, document: &SheetDocument) -> GridResult<()> {
        self.documents()?
            .insert(document.sheet.id.clone(), document.clone());
        Ok(())
    }

    fn delete(&self, sheet_id: &str) -> GridResult<bool> {
        Ok(self.documents()?.remove(sheet_id).is_some())
    }

    fn list(&self) -> GridResult<Vec<Sheet>> {
        let mut sheets: Vec<Sheet> = self.documents()?.values().map(|d| d.sheet.clone()).collect();
        sort_recent_first(&mut sheets);
        Ok(sheets)
    }
}

//==============================================================================
// Save on every change
//==============================================================================

/// Outcome counters of [`PersistOnChange`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistStatus {
    pub saves: usize,
    pub failures: usize,
    pub last_error: Option<String>,
}

/// Grid observer that saves every snapshot through an injected store
pub struct PersistOnChange {
    store: Arc<dyn SheetStore>,
    sheet: Rc<RefCell<Sheet>>,
    status: Rc<RefCell<PersistStatus>>,
}

impl PersistOnChange {
    pub fn new(
        store: Arc<dyn SheetStore>,
        sheet: Rc<RefCell<Sheet>>,
        status: Rc<RefCell<PersistStatus>>,
    ) -> Self {
        Self {
            store,
            sheet,
            status,
        }
    }
}

impl GridObserver for PersistOnChange {
    fn grid_changed(&mut self, snapshot: &GridSnapshot) {
        self.sheet.borrow_mut().touch();
        let document = SheetDocument {
            sheet: self.sheet.borrow().clone(),
            grid: snapshot.clone(),
        };

        let mut status = self.status.borrow_mut();
        match self.store.save(&document) {
            Ok(()) => status.saves += 1,
            Err(e) => {
                warn!(
                    sheet = %document.sheet.id,
                    error = %e,
                    "failed to persist grid change; keeping in-memory grid"
                );
                status.failures += 1;
                status.last_error = Some(e.to_string());
            }
        }
    }
}
