use crate::config::AttendanceConfig;
use crate::core::{AttendanceSummary, Grid};
use crate::error::{GridError, GridResult};
use crate::export::ExportFormat;
use crate::persistence::{find_sheet, SheetStore};
use crate::session::SheetSession;
use crate::types::{Sheet, SheetKind, SheetView};
use chrono::NaiveDate;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Store and configuration shared by every command
pub struct Workspace {
    store: Arc<dyn SheetStore>,
    config: AttendanceConfig,
}

impl Workspace {
    pub fn new(store: Arc<dyn SheetStore>, config: AttendanceConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    /// Open a sheet by id or title
    fn open(&self, key: &str) -> GridResult<SheetSession> {
        let sheet = find_sheet(self.store.as_ref(), key)?;
        SheetSession::open(&sheet.id, Arc::clone(&self.store), self.config.clone())
    }
}

/// Options for `init`
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub title: String,
    pub owner: String,
    pub start: Option<NaiveDate>,
    pub kind: SheetKind,
    pub view: SheetView,
    pub days: usize,
    pub rows: usize,
}

//==============================================================================
// Position helpers (the CLI counts columns, days and rows from 1)
//==============================================================================

fn column_index(grid: &Grid, column: usize) -> GridResult<usize> {
    match column.checked_sub(1) {
        Some(idx) if idx < grid.static_column_count() => Ok(idx),
        _ => Err(GridError::OutOfRange(format!(
            "column {} (grid has {} static columns)",
            column,
            grid.static_column_count()
        ))),
    }
}

fn check_row(grid: &Grid, row: usize) -> GridResult<usize> {
    if row == 0 || row > grid.row_count() {
        return Err(GridError::OutOfRange(format!(
            "row {} (grid has {} rows)",
            row,
            grid.row_count()
        )));
    }
    Ok(row)
}

/// A day is either its 1-based column number or its calendar date
fn day_index(grid: &Grid, day: &str) -> GridResult<usize> {
    let index = if let Ok(n) = day.parse::<usize>() {
        n.checked_sub(1)
    } else if let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        usize::try_from((date - grid.start_date()).num_days()).ok()
    } else {
        return Err(GridError::OutOfRange(format!(
            "'{}' is neither a day number nor a YYYY-MM-DD date",
            day
        )));
    };

    match index {
        Some(idx) if idx < grid.date_column_count() => Ok(idx),
        _ => Err(GridError::OutOfRange(format!(
            "day {} (grid has {} date columns)",
            day,
            grid.date_column_count()
        ))),
    }
}

//==============================================================================
// Sheet lifecycle
//==============================================================================

/// Execute the init command
pub fn init(workspace: &Workspace, options: InitOptions) -> GridResult<()> {
    let sheet = Sheet::new(options.title, options.owner)
        .with_kind(options.kind)
        .with_view(options.view);
    let start = options
        .start
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut session = SheetSession::create(
        sheet,
        Arc::clone(&workspace.store),
        workspace.config.clone(),
        start,
    )?;
    session.grid_mut().batch(|grid| {
        for _ in 0..options.days {
            grid.add_date_column();
        }
        for _ in 1..options.rows {
            grid.add_row();
        }
    });
    session.ensure_persisted()?;

    let sheet = session.sheet();
    println!("{}", "📋 Attendance sheet created".bold().green());
    println!("   Title: {}", sheet.title.bright_blue().bold());
    println!("   Id:    {}", sheet.id);
    println!("   Start: {}", start);
    println!(
        "   Grid:  {} rows, {} date columns",
        session.grid().row_count(),
        session.grid().date_column_count()
    );
    Ok(())
}

/// Execute the list command
pub fn list(workspace: &Workspace) -> GridResult<()> {
    let sheets = workspace.store.list()?;
    if sheets.is_empty() {
        println!("{}", "No sheets yet. Create one with 'attendance init'.".yellow());
        return Ok(());
    }

    println!("{}", "📋 Sheets".bold().green());
    for sheet in sheets {
        println!(
            "   {}  {}  ({:?}, updated {})",
            sheet.id.dimmed(),
            sheet.title.bright_blue().bold(),
            sheet.kind,
            sheet.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Execute the show command - print the grid as a table
pub fn show(workspace: &Workspace, key: &str) -> GridResult<()> {
    let session = workspace.open(key)?;
    let snapshot = session.grid().snapshot();

    let sheet = session.sheet();
    println!("{}", format!("📋 {}", sheet.title).bold().green());
    if !sheet.member_ids.is_empty() {
        println!("   Members: {}", sheet.member_ids.join(", ").dimmed());
    }
    let header = snapshot.header_row().join(" | ");
    println!("   {}", header.bold());
    println!("   {}", "─".repeat(header.chars().count()));
    for (idx, row) in snapshot.rows.iter().enumerate() {
        let marks = row.attendance.iter().map(|p| if *p { "✓" } else { "·" });
        let line: Vec<&str> = row.fields.iter().map(String::as_str).chain(marks).collect();
        println!("{:>3} {}", idx + 1, line.join(" | "));
    }
    Ok(())
}

//==============================================================================
// Cell and structure edits
//==============================================================================

/// Execute the set command - write a static text cell
pub fn set(workspace: &Workspace, key: &str, column: usize, row: usize, text: String) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    let idx = column_index(session.grid(), column)?;
    let row = check_row(session.grid(), row)?;
    session.grid_mut().set_text(idx, row, text);
    session.ensure_persisted()?;

    let header = session.grid().header(idx).unwrap_or_default().to_string();
    println!(
        "{} {} row {} = {:?}",
        "✅".green(),
        header.bright_blue(),
        row,
        session.grid().text(idx, row)
    );
    Ok(())
}

/// Execute the mark command - tick or clear one day for one row
pub fn mark(workspace: &Workspace, key: &str, day: &str, row: usize, absent: bool) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    let idx = day_index(session.grid(), day)?;
    let row = check_row(session.grid(), row)?;
    session.grid_mut().set_present(idx, row, !absent);
    session.ensure_persisted()?;

    let label = session.grid().date_labels().swap_remove(idx);
    let status = if absent { "absent".red() } else { "present".green() };
    println!("{} {} row {}: {}", "✅".green(), label.bright_blue(), row, status);
    Ok(())
}

/// Execute the add-row command
pub fn add_row(workspace: &Workspace, key: &str) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    let rows = session.grid_mut().add_row();
    session.ensure_persisted()?;
    println!("{} Row {} added", "✅".green(), rows);
    Ok(())
}

/// Execute the add-date command
pub fn add_date(workspace: &Workspace, key: &str, count: usize) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    let dates: Vec<NaiveDate> = session
        .grid_mut()
        .batch(|grid| (0..count).map(|_| grid.add_date_column()).collect());
    session.ensure_persisted()?;
    for date in dates {
        println!("{} Date column {} added", "✅".green(), date);
    }
    Ok(())
}

/// Execute the add-column command
pub fn add_column(workspace: &Workspace, key: &str, label: String) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    let idx = session.grid_mut().add_static_column(label);
    session.ensure_persisted()?;
    println!(
        "{} Column {} '{}' added",
        "✅".green(),
        idx + 1,
        session.grid().header(idx).unwrap_or_default()
    );
    Ok(())
}

/// Execute the rename command - relabel a static column header
pub fn rename(workspace: &Workspace, key: &str, column: usize, label: String) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    let idx = column_index(session.grid(), column)?;
    session.grid_mut().rename_header(idx, label);
    session.ensure_persisted()?;
    println!(
        "{} Column {} is now '{}'",
        "✅".green(),
        column,
        session.grid().header(idx).unwrap_or_default()
    );
    Ok(())
}

/// Execute the retitle command - change the sheet title
pub fn retitle(workspace: &Workspace, key: &str, title: String) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    session.rename(title)?;
    println!("{} Sheet is now '{}'", "✅".green(), session.sheet().title);
    Ok(())
}

/// Execute the add-member command
pub fn add_member(workspace: &Workspace, key: &str, member: &str) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    if session.add_member(member)? {
        println!("{} Member {} added", "✅".green(), member.bright_blue());
    } else {
        println!("{}", format!("Member {} is already on the sheet", member).yellow());
    }
    Ok(())
}

/// Execute the remove-member command
pub fn remove_member(workspace: &Workspace, key: &str, member: &str) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    if session.remove_member(member)? {
        println!("{} Member {} removed", "✅".green(), member.bright_blue());
    } else {
        println!("{}", format!("Member {} is not on the sheet", member).yellow());
    }
    Ok(())
}

/// Execute the delete-row command
pub fn delete_row(workspace: &Workspace, key: &str, row: usize) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    let row = check_row(session.grid(), row)?;
    let only_row = session.grid().row_count() == 1;
    session.grid_mut().delete_row(row);
    session.ensure_persisted()?;

    if only_row {
        println!("{} Only row cleared", "✅".green());
    } else {
        println!("{} Row {} deleted", "✅".green(), row);
    }
    Ok(())
}

/// Execute the delete-column command
pub fn delete_column(workspace: &Workspace, key: &str, column: usize) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    let idx = column_index(session.grid(), column)?;
    let header = session.grid().header(idx).unwrap_or_default().to_string();
    session.grid_mut().delete_static_column(idx);
    session.ensure_persisted()?;
    println!("{} Column '{}' deleted", "✅".green(), header);
    Ok(())
}

/// Execute the delete-date command
pub fn delete_date(workspace: &Workspace, key: &str, day: &str) -> GridResult<()> {
    let mut session = workspace.open(key)?;
    let idx = day_index(session.grid(), day)?;
    session.grid_mut().delete_date_column(idx);
    session.ensure_persisted()?;
    println!(
        "{} Date column {} deleted; {} remain",
        "✅".green(),
        idx + 1,
        session.grid().date_column_count()
    );
    Ok(())
}

//==============================================================================
// Export and reporting
//==============================================================================

/// Execute the export command.
///
/// A grid without data is reported as a notice, not a failure.
pub fn export(
    workspace: &Workspace,
    key: &str,
    formats: Vec<ExportFormat>,
    output: PathBuf,
) -> GridResult<()> {
    let session = workspace.open(key)?;
    let formats = if formats.is_empty() {
        ExportFormat::ALL.to_vec()
    } else {
        formats
    };

    println!("{}", "📤 Attendance export".bold().green());
    println!("   Sheet:  {}", session.sheet().title.bright_blue().bold());
    println!("   Output: {}\n", output.display());

    fs::create_dir_all(&output)?;
    for format in formats {
        match session.export(format) {
            Ok(artifact) => {
                let path = artifact.write_to(&output)?;
                println!(
                    "   {} {} ({} rows, {} bytes)",
                    "✅".green(),
                    path.display(),
                    artifact.rows,
                    artifact.bytes.len()
                );
            }
            Err(e) if e.is_no_data() => {
                println!("{}", format!("⚠️  {}. Nothing was written.", e).yellow());
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
    println!();
    Ok(())
}

/// Execute the summary command
pub fn summary(workspace: &Workspace, key: &str, json: bool, threshold: Option<f64>) -> GridResult<()> {
    let session = workspace.open(key)?;
    let summary = session.summary()?;

    if json {
        println!("{}", summary.to_json()?);
        return Ok(());
    }

    println!("{}", format!("📊 {}", session.sheet().title).bold().green());
    print_summary(&summary);

    if let Some(threshold) = threshold {
        let low: Vec<_> = summary.below(threshold).collect();
        if !low.is_empty() {
            println!(
                "\n{}",
                format!("⚠️  Below {:.0}% attendance:", threshold * 100.0).yellow()
            );
            for member in low {
                println!("   {} ({:.0}%)", member.label.red(), member.rate * 100.0);
            }
        }
    }
    Ok(())
}

fn print_summary(summary: &AttendanceSummary) {
    println!("   Tracked days: {}", summary.tracked_days);
    println!("   Overall rate: {:.1}%\n", summary.overall_rate * 100.0);
    if summary.members.is_empty() {
        println!("   {}", "No rows with data".yellow());
        return;
    }
    for member in &summary.members {
        println!(
            "   {:>3} {:<24} {:>3} present {:>3} absent  {:>5.1}%",
            member.row,
            member.label.bright_blue(),
            member.present,
            member.absent,
            member.rate * 100.0
        );
    }
}

/// Execute the formats command
pub fn formats() -> GridResult<()> {
    println!("{}", "📤 Export formats".bold().green());
    for format in ExportFormat::ALL {
        println!("   {:<5} {}", format.extension().bright_blue(), format.mime_type());
    }
    Ok(())
}

/// Execute the config command - print the effective configuration
pub fn show_config(workspace: &Workspace, path: Option<&Path>) -> GridResult<()> {
    match path {
        Some(p) => println!("{}", format!("⚙️  Config: {}", p.display()).bold().green()),
        None => println!("{}", "⚙️  Config: built-in defaults".bold().green()),
    }
    print!("{}", serde_yaml::to_string(workspace.config())?);
    Ok(())
}
