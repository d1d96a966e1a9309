//! Persistence collaborator and sheet session tests

use attendance_grid::config::AttendanceConfig;
use attendance_grid::error::{GridError, GridResult};
use attendance_grid::export::ExportFormat;
use attendance_grid::persistence::{
    find_sheet, JsonFileStore, MemoryStore, SheetDocument, SheetStore,
};
use attendance_grid::session::SheetSession;
use attendance_grid::types::{Sheet, SheetKind};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::sync::Arc;
use tempfile::TempDir;

fn march_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn new_session(store: Arc<dyn SheetStore>, title: &str) -> SheetSession {
    SheetSession::create(
        Sheet::new(title, "owner-1"),
        store,
        AttendanceConfig::default(),
        march_first(),
    )
    .unwrap()
}

/// Store whose saves start failing once `fail` is set
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail: std::sync::atomic::AtomicBool,
}

impl SheetStore for FlakyStore {
    fn load(&self, sheet_id: &str) -> GridResult<SheetDocument> {
        self.inner.load(sheet_id)
    }

    fn save(&self, document: &SheetDocument) -> GridResult<()> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(GridError::Persistence("disk full".to_string()));
        }
        self.inner.save(document)
    }

    fn delete(&self, sheet_id: &str) -> GridResult<bool> {
        self.inner.delete(sheet_id)
    }

    fn list(&self) -> GridResult<Vec<Sheet>> {
        self.inner.list()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// JSON FILE STORE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_json_store_saves_every_change() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SheetStore> = Arc::new(JsonFileStore::new(dir.path()));

    let mut session = new_session(Arc::clone(&store), "Math 101");
    session.grid_mut().add_date_column();
    session.grid_mut().set_text(0, 1, "Alice");
    session.grid_mut().set_present(0, 1, true);

    let file = dir.path().join(format!("{}.json", session.sheet_id()));
    assert!(file.exists());

    let stored = store.load(&session.sheet_id()).unwrap();
    assert_eq!(stored.grid, session.grid().snapshot());
    assert_eq!(stored.sheet.title, "Math 101");
    assert_eq!(session.persist_status().saves, 3);
    assert!(session.ensure_persisted().is_ok());
}

#[test]
fn test_reopened_session_continues_where_it_left_off() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SheetStore> = Arc::new(JsonFileStore::new(dir.path()));

    let id = {
        let mut session = new_session(Arc::clone(&store), "Morning Shift");
        session.grid_mut().add_date_column();
        session.grid_mut().add_row();
        session.grid_mut().set_text(0, 2, "Bob");
        session.grid_mut().set_present(0, 2, true);
        session.sheet_id()
    };

    let mut session = SheetSession::open(&id, Arc::clone(&store), AttendanceConfig::default()).unwrap();
    assert_eq!(session.grid().row_count(), 2);
    assert_eq!(session.grid().text(0, 2), "Bob");
    assert!(session.grid().is_present(0, 2));

    // New ids never collide with restored ones
    session.grid_mut().add_static_column("Email");
    session.grid_mut().set_text(3, 2, "bob@example.com");
    assert_eq!(session.grid().text(0, 2), "Bob");
    assert_eq!(session.grid().stored_cell_count(), 3);
}

#[test]
fn test_json_store_list_and_delete() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    let shared: Arc<dyn SheetStore> = Arc::new(store.clone());

    let mut first = new_session(Arc::clone(&shared), "Period 1");
    let second = new_session(Arc::clone(&shared), "Period 2");
    // Any change makes the first sheet the most recent again
    first.grid_mut().add_row();

    let titles: Vec<String> = store.list().unwrap().into_iter().map(|s| s.title).collect();
    assert_eq!(titles, vec!["Period 1", "Period 2"]);

    assert!(store.delete(&second.sheet_id()).unwrap());
    assert!(!store.delete(&second.sheet_id()).unwrap());
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_json_store_skips_unreadable_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
    let store: Arc<dyn SheetStore> = Arc::new(JsonFileStore::new(dir.path()));
    new_session(Arc::clone(&store), "Valid");

    let sheets = store.list().unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].title, "Valid");
}

#[test]
fn test_missing_sheet_is_reported() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SheetStore> = Arc::new(JsonFileStore::new(dir.path()));
    let result = SheetSession::open("no-such-sheet", store, AttendanceConfig::default());
    assert!(matches!(result, Err(GridError::SheetNotFound(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// LOOKUP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_find_sheet_by_id_or_title() {
    let store: Arc<dyn SheetStore> = Arc::new(MemoryStore::new());
    let session = new_session(Arc::clone(&store), "Math 101");
    new_session(Arc::clone(&store), "Twin");
    new_session(Arc::clone(&store), "Twin");

    assert_eq!(find_sheet(store.as_ref(), &session.sheet_id()).unwrap().title, "Math 101");
    assert_eq!(find_sheet(store.as_ref(), "Math 101").unwrap().id, session.sheet_id());
    assert!(matches!(
        find_sheet(store.as_ref(), "Twin"),
        Err(GridError::Persistence(_))
    ));
    assert!(matches!(
        find_sheet(store.as_ref(), "History"),
        Err(GridError::SheetNotFound(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// FAILURES AND SESSION BEHAVIOUR
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_failed_save_keeps_in_memory_grid() {
    let store = Arc::new(FlakyStore::default());
    let mut session = new_session(store.clone(), "Math 101");
    session.grid_mut().set_text(0, 1, "Alice");

    store.fail.store(true, std::sync::atomic::Ordering::SeqCst);
    session.grid_mut().set_text(0, 1, "Alicia");

    assert_eq!(session.grid().text(0, 1), "Alicia");
    let status = session.persist_status();
    assert_eq!(status.saves, 1);
    assert_eq!(status.failures, 1);
    assert!(status.last_error.unwrap().contains("disk full"));
    assert!(matches!(session.ensure_persisted(), Err(GridError::Persistence(_))));

    // The store still holds the last good write
    let stored = store.load(&session.sheet_id()).unwrap();
    assert_eq!(stored.grid.rows[0].fields[0], "Alice");
}

#[test]
fn test_rename_persists_title_and_export_uses_it() {
    let store: Arc<dyn SheetStore> = Arc::new(MemoryStore::new());
    let mut session = new_session(Arc::clone(&store), "Draft");
    session.grid_mut().set_text(0, 1, "Alice");
    session.rename("Biology 2").unwrap();

    assert_eq!(store.load(&session.sheet_id()).unwrap().sheet.title, "Biology 2");
    let artifact = session.export(ExportFormat::Pdf).unwrap();
    assert_eq!(artifact.file_name, "Biology 2.pdf");
}

#[test]
fn test_session_export_reports_no_data() {
    let store: Arc<dyn SheetStore> = Arc::new(MemoryStore::new());
    let session = new_session(store, "Empty");
    assert!(session.export(ExportFormat::Xlsx).unwrap_err().is_no_data());
}

#[test]
fn test_session_applies_config_headers_and_date_format() {
    let config = AttendanceConfig::from_yaml(
        "default_headers: [Employee, Badge]\ndate_format: \"%d.%m.%Y\"\n",
    )
    .unwrap();
    let store: Arc<dyn SheetStore> = Arc::new(MemoryStore::new());
    let mut session = SheetSession::create(
        Sheet::new("Night Shift", "mgr").with_kind(SheetKind::Employee),
        Arc::clone(&store),
        config.clone(),
        march_first(),
    )
    .unwrap();
    session.grid_mut().add_date_column();

    assert_eq!(session.grid().header_row(), vec!["Employee", "Badge", "01.03.2024"]);

    let reopened = SheetSession::open(&session.sheet_id(), store, config).unwrap();
    assert_eq!(reopened.grid().date_labels(), vec!["01.03.2024"]);
    assert_eq!(reopened.sheet().kind, SheetKind::Employee);
}

#[test]
fn test_summary_counts_included_rows_only() {
    let store: Arc<dyn SheetStore> = Arc::new(MemoryStore::new());
    let mut session = new_session(store, "Math 101");
    let grid = session.grid_mut();
    grid.add_date_column();
    grid.add_date_column();
    grid.add_row();
    grid.add_row();
    grid.set_text(0, 1, "Alice");
    grid.set_present(0, 1, true);
    grid.set_present(1, 1, true);
    grid.set_text(0, 3, "Carol");
    grid.set_present(0, 3, true);

    let summary = session.summary().unwrap();
    assert_eq!(summary.tracked_days, 2);
    assert_eq!(summary.members.len(), 2);
    assert_eq!(summary.members[0].rate, 1.0);
    assert_eq!(summary.members[1].row, 3);
    assert_eq!(summary.members[1].absent, 1);
    assert_eq!(summary.days[0].present, 2);
    assert_eq!(summary.overall_rate, 0.75);

    let low: Vec<&str> = summary.below(0.8).map(|m| m.label.as_str()).collect();
    assert_eq!(low, vec!["Carol"]);
}

#[test]
fn test_observer_counter_via_closure() {
    // Sessions leave room for additional observers
    let store: Arc<dyn SheetStore> = Arc::new(MemoryStore::new());
    let mut session = new_session(store, "Observers");
    let hits = std::rc::Rc::new(Cell::new(0));
    let counter = std::rc::Rc::clone(&hits);
    session
        .grid_mut()
        .subscribe(move |_: &attendance_grid::core::GridSnapshot| counter.set(counter.get() + 1));

    session.grid_mut().add_row();
    session.grid_mut().add_row();
    assert_eq!(hits.get(), 2);
    assert_eq!(session.persist_status().saves, 2);
}

#[test]
fn test_batched_changes_are_saved_once() {
    let store: Arc<dyn SheetStore> = Arc::new(MemoryStore::new());
    let mut session = new_session(Arc::clone(&store), "Month");
    session.grid_mut().batch(|grid| {
        for _ in 0..31 {
            grid.add_date_column();
        }
        for _ in 1..25 {
            grid.add_row();
        }
    });

    assert_eq!(session.persist_status().saves, 1);
    let stored = store.load(&session.sheet_id()).unwrap();
    assert_eq!(stored.grid.date_labels.len(), 31);
    assert_eq!(stored.grid.row_count, 25);
}

#[test]
fn test_members_are_saved_with_the_sheet() {
    let store: Arc<dyn SheetStore> = Arc::new(MemoryStore::new());
    let mut session = new_session(Arc::clone(&store), "Math 101");

    assert!(session.add_member("u-17").unwrap());
    assert!(!session.add_member("u-17").unwrap());
    assert!(session.add_member("u-18").unwrap());
    assert_eq!(store.load(&session.sheet_id()).unwrap().sheet.member_ids, vec!["u-17", "u-18"]);

    assert!(session.remove_member("u-17").unwrap());
    assert!(!session.remove_member("u-99").unwrap());
    let reopened = SheetSession::open(&session.sheet_id(), store, AttendanceConfig::default()).unwrap();
    assert_eq!(reopened.sheet().member_ids, vec!["u-18"]);
}
