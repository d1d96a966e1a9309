//! One open sheet: metadata, grid, injected store, exporter

use crate::config::AttendanceConfig;
use crate::core::{AttendanceSummary, Grid};
use crate::error::{GridError, GridResult};
use crate::export::{ExportArtifact, ExportEngine, ExportFormat};
use crate::persistence::{PersistOnChange, PersistStatus, SheetDocument, SheetStore};
use crate::types::Sheet;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::info;

/// Owns the grid of one sheet and keeps the store in sync with it.
///
/// Every grid change is saved through the injected store. Save failures do
/// not roll the grid back; they are recorded in [`PersistStatus`].
pub struct SheetSession {
    sheet: Rc<RefCell<Sheet>>,
    grid: Grid,
    store: Arc<dyn SheetStore>,
    status: Rc<RefCell<PersistStatus>>,
    engine: ExportEngine,
}

impl SheetSession {
    /// Start a new sheet with an empty grid and save it
    pub fn create(
        sheet: Sheet,
        store: Arc<dyn SheetStore>,
        config: AttendanceConfig,
        start_date: NaiveDate,
    ) -> GridResult<Self> {
        let grid = Grid::from_config(&config, start_date);
        let session = Self::wire(sheet, grid, store, config);
        session.save()?;
        info!(sheet = %session.sheet.borrow().id, "sheet created");
        Ok(session)
    }

    /// Load a stored sheet and its grid
    pub fn open(
        sheet_id: &str,
        store: Arc<dyn SheetStore>,
        config: AttendanceConfig,
    ) -> GridResult<Self> {
        let document = store.load(sheet_id)?;
        let mut grid = Grid::from_snapshot(&document.grid)?;
        grid.set_date_format(&config.date_format);
        Ok(Self::wire(document.sheet, grid, store, config))
    }

    fn wire(
        sheet: Sheet,
        mut grid: Grid,
        store: Arc<dyn SheetStore>,
        config: AttendanceConfig,
    ) -> Self {
        let sheet = Rc::new(RefCell::new(sheet));
        let status = Rc::new(RefCell::new(PersistStatus::default()));
        grid.subscribe(PersistOnChange::new(
            Arc::clone(&store),
            Rc::clone(&sheet),
            Rc::clone(&status),
        ));
        Self {
            sheet,
            grid,
            store,
            status,
            engine: ExportEngine::new(config),
        }
    }

    pub fn sheet(&self) -> Sheet {
        self.sheet.borrow().clone()
    }

    pub fn sheet_id(&self) -> String {
        self.sheet.borrow().id.clone()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable grid; changes are saved as they happen
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Change the title and save
    pub fn rename(&mut self, title: impl Into<String>) -> GridResult<()> {
        self.sheet.borrow_mut().rename(title);
        self.save()
    }

    /// Record a member on the sheet; saves only when the id is new
    pub fn add_member(&mut self, member_id: impl Into<String>) -> GridResult<bool> {
        let added = self.sheet.borrow_mut().add_member(member_id);
        if added {
            self.save()?;
        }
        Ok(added)
    }

    /// Drop a member; saves only when the id was present
    pub fn remove_member(&mut self, member_id: &str) -> GridResult<bool> {
        let removed = self.sheet.borrow_mut().remove_member(member_id);
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Save the current state now, reporting any failure
    pub fn save(&self) -> GridResult<()> {
        let document = SheetDocument {
            sheet: self.sheet(),
            grid: self.grid.snapshot(),
        };
        self.store.save(&document)
    }

    pub fn persist_status(&self) -> PersistStatus {
        self.status.borrow().clone()
    }

    /// Error if any automatic save has failed since the session opened
    pub fn ensure_persisted(&self) -> GridResult<()> {
        let status = self.status.borrow();
        match &status.last_error {
            Some(e) if status.failures > 0 => Err(GridError::Persistence(format!(
                "{} change(s) not saved: {}",
                status.failures, e
            ))),
            _ => Ok(()),
        }
    }

    pub fn export(&self, format: ExportFormat) -> GridResult<ExportArtifact> {
        let title = self.sheet.borrow().title.clone();
        self.engine
            .export(&self.grid.snapshot(), Some(&title), format)
    }

    pub fn summary(&self) -> GridResult<AttendanceSummary> {
        AttendanceSummary::from_snapshot(&self.grid.snapshot())
    }
}
