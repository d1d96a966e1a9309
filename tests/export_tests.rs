//! Export engine tests across all six formats
//!
//! Workbooks are read back with calamine, CSV with the csv crate.

use attendance_grid::config::AttendanceConfig;
use attendance_grid::core::{Grid, GridSnapshot};
use attendance_grid::error::GridError;
use attendance_grid::export::{ExportEngine, ExportFormat, ExportTable};
use calamine::{Data, Ods, Reader, Xlsx};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::io::Cursor;
use tempfile::TempDir;

fn march_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// Name/Phone/ID, 2 days, 3 rows: Alice on row 1, row 2 empty, row 3 marked on day 1
fn scenario_grid() -> Grid {
    let mut grid = Grid::new(march_first());
    grid.add_date_column();
    grid.add_date_column();
    grid.add_row();
    grid.add_row();
    grid.set_text(0, 1, "Alice");
    grid.set_present(0, 3, true);
    grid
}

fn scenario() -> GridSnapshot {
    scenario_grid().snapshot()
}

fn export_text(snapshot: &GridSnapshot, format: ExportFormat) -> String {
    let artifact = ExportEngine::default()
        .export(snapshot, Some("Math 101"), format)
        .unwrap();
    String::from_utf8(artifact.bytes).unwrap()
}

/// PDF bytes carry a binary marker line, so read them lossily
fn export_text_lossy(snapshot: &GridSnapshot, format: ExportFormat) -> String {
    let artifact = ExportEngine::default()
        .export(snapshot, Some("Math 101"), format)
        .unwrap();
    String::from_utf8_lossy(&artifact.bytes).into_owned()
}

fn sheet_rows(range: &calamine::Range<Data>) -> Vec<Vec<String>> {
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::String(s) => s.clone(),
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

fn read_xlsx(bytes: Vec<u8>) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range("Attendance").unwrap();
    sheet_rows(&range)
}

fn read_ods(bytes: Vec<u8>) -> Vec<Vec<String>> {
    let mut workbook: Ods<_> = Ods::new(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range("Attendance").unwrap();
    sheet_rows(&range)
}

// ═══════════════════════════════════════════════════════════════════════════
// THE REFERENCE SCENARIO
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_scenario_csv() {
    let csv = export_text(&scenario(), ExportFormat::Csv);
    let lines: Vec<&str> = csv.split('\n').collect();

    assert_eq!(
        lines,
        vec![
            r#""Name","Phone","ID","2024-03-01","2024-03-02""#,
            r#""Alice","","","Absent","Absent""#,
            r#""","","","Present","Absent""#,
        ]
    );
}

#[test]
fn test_scenario_table_skips_empty_row() {
    let table = ExportTable::from_snapshot(&scenario()).unwrap();
    assert_eq!(table.column_count(), 5);
    assert_eq!(table.rows.len(), 2);
}

#[test]
fn test_no_data_produces_no_bytes() {
    let grid = Grid::new(march_first());
    let engine = ExportEngine::default();
    for format in ExportFormat::ALL {
        let result = engine.export(&grid.snapshot(), Some("Empty"), format);
        assert!(matches!(result, Err(GridError::NoData)), "{format}");
    }
}

#[test]
fn test_unchecked_days_alone_do_not_include_a_row() {
    let mut grid = Grid::new(march_first());
    grid.add_date_column();
    grid.set_present(0, 1, true);
    grid.set_present(0, 1, false);
    assert!(ExportEngine::default()
        .export(&grid.snapshot(), None, ExportFormat::Csv)
        .unwrap_err()
        .is_no_data());
}

// ═══════════════════════════════════════════════════════════════════════════
// EVERY FORMAT: HEADER LENGTH AND ROW INCLUSION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_tsv_header_and_rows() {
    let tsv = export_text(&scenario(), ExportFormat::Tsv);
    let lines: Vec<Vec<&str>> = tsv.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].len(), 5);
    assert_eq!(lines[1], vec!["Alice", "", "", "Absent", "Absent"]);
    assert_eq!(lines[2], vec!["", "", "", "Present", "Absent"]);
}

#[test]
fn test_html_header_and_rows() {
    let html = export_text(&scenario(), ExportFormat::Html);
    assert_eq!(html.matches("<th>").count(), 5);
    assert_eq!(html.matches("<tr>").count(), 3);
    assert!(html.contains("<td>Alice</td>"));
    assert!(html.contains("<td>Present</td>"));
    assert!(html.contains("Math 101"));
}

#[test]
fn test_xlsx_reads_back() {
    let artifact = ExportEngine::default()
        .export(&scenario(), Some("Math 101"), ExportFormat::Xlsx)
        .unwrap();
    assert_eq!(artifact.file_name, "Math 101.xlsx");

    let rows = read_xlsx(artifact.bytes);
    assert_eq!(
        rows,
        vec![
            vec!["Name", "Phone", "ID", "2024-03-01", "2024-03-02"],
            vec!["Alice", "", "", "Absent", "Absent"],
            vec!["", "", "", "Present", "Absent"],
        ]
    );
}

#[test]
fn test_ods_reads_back() {
    let artifact = ExportEngine::default()
        .export(&scenario(), Some("Math 101"), ExportFormat::Ods)
        .unwrap();
    assert_eq!(artifact.mime_type, "application/vnd.oasis.opendocument.spreadsheet");

    let rows = read_ods(artifact.bytes);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], vec!["Name", "Phone", "ID", "2024-03-01", "2024-03-02"]);
    assert_eq!(rows[1][0], "Alice");
    assert_eq!(rows[2][3], "Present");
    assert_eq!(rows[2][4], "Absent");
}

#[test]
fn test_pdf_contains_header_and_rows() {
    let artifact = ExportEngine::default()
        .export(&scenario(), Some("Math 101"), ExportFormat::Pdf)
        .unwrap();
    assert!(artifact.bytes.starts_with(b"%PDF-1.4"));
    let text = String::from_utf8_lossy(&artifact.bytes);
    assert!(text.contains("(Name)"));
    assert!(text.contains("(2024-03-02)"));
    assert!(text.contains("(Alice)"));
    assert!(text.contains("(Present)"));
    assert!(text.trim_end().ends_with("%%EOF"));
    assert_eq!(artifact.rows, 2);
}

#[test]
fn test_header_length_tracks_columns_in_every_format() {
    let mut grid = scenario_grid();
    grid.add_static_column("Email");
    grid.add_date_column();
    grid.delete_static_column(1);
    let snapshot = grid.snapshot();
    let expected = 3 + 3;

    let csv = export_text(&snapshot, ExportFormat::Csv);
    assert_eq!(csv.split('\n').next().unwrap().split("\",\"").count(), expected);

    let tsv = export_text(&snapshot, ExportFormat::Tsv);
    assert_eq!(tsv.split('\n').next().unwrap().split('\t').count(), expected);

    let html = export_text(&snapshot, ExportFormat::Html);
    assert_eq!(html.matches("<th>").count(), expected);

    let engine = ExportEngine::default();
    let xlsx = engine.export(&snapshot, None, ExportFormat::Xlsx).unwrap();
    assert_eq!(read_xlsx(xlsx.bytes)[0].len(), expected);

    let ods = engine.export(&snapshot, None, ExportFormat::Ods).unwrap();
    assert_eq!(read_ods(ods.bytes)[0].len(), expected);

    let pdf = export_text_lossy(&snapshot, ExportFormat::Pdf);
    for header in snapshot.header_row() {
        assert!(pdf.contains(&format!("({})", header)), "{header}");
    }
    assert_eq!(snapshot.header_row().len(), expected);
}

#[test]
fn test_pdf_repeats_header_on_every_page() {
    let mut grid = Grid::new(march_first());
    grid.add_date_column();
    for row in 1..=60 {
        if row > 1 {
            grid.add_row();
        }
        grid.set_text(0, row, format!("Member {}", row));
    }
    let pdf = export_text_lossy(&grid.snapshot(), ExportFormat::Pdf);

    // 29 data rows fit under the header on an A4 landscape page
    assert!(pdf.contains("/Count 3"));
    for page in 1..=3 {
        assert!(pdf.contains(&format!("(Page {} of 3)", page)));
    }
    let pages: Vec<&str> = pdf.split("/Type /Page ").skip(1).collect();
    assert_eq!(pages.len(), 3);
    for page in &pages {
        assert_eq!(page.matches("/F2 9 Tf").count(), 4, "one bold cell per header");
        assert_eq!(page.matches("(Name)").count(), 1);
    }
    assert!(pdf.contains("(Member 29)"));
    assert!(pdf.contains("(Member 30)"));
    assert!(pdf.contains("(Member 60)"));
}

#[test]
fn test_pdf_month_of_dates_keeps_full_headers() {
    let mut grid = scenario_grid();
    for _ in 2..31 {
        grid.add_date_column();
    }
    grid.set_text(1, 1, "555-0100");
    let snapshot = grid.snapshot();
    assert_eq!(snapshot.date_labels.len(), 31);

    let pdf = export_text_lossy(&snapshot, ExportFormat::Pdf);
    for day in 1..=31 {
        assert!(pdf.contains(&format!("(2024-03-{:02})", day)), "day {day}");
    }
    assert!(pdf.contains("(Phone)"));
    assert!(pdf.contains("(555-0100)"));
    assert!(!pdf.contains("(2...)"));
    assert!(!pdf.contains("(P...)"));

    // Static columns come back on every band
    let bands = pdf.matches("(Name)").count();
    assert!(bands > 1);
    assert!(pdf.contains(&format!("/Count {}", bands)));
    assert_eq!(pdf.matches("(Alice)").count(), bands);
}

#[test]
fn test_only_rows_with_data_appear_in_workbooks() {
    let mut grid = Grid::new(march_first());
    grid.add_date_column();
    for _ in 0..4 {
        grid.add_row();
    }
    grid.set_text(0, 2, "Bob");
    grid.set_present(0, 5, true);

    let engine = ExportEngine::default();
    let snapshot = grid.snapshot();
    let xlsx = read_xlsx(engine.export(&snapshot, None, ExportFormat::Xlsx).unwrap().bytes);
    let ods = read_ods(engine.export(&snapshot, None, ExportFormat::Ods).unwrap().bytes);
    assert_eq!(xlsx.len(), 3);
    assert_eq!(ods.len(), 3);
    assert_eq!(xlsx[1][0], "Bob");
    assert_eq!(xlsx[2][3], "Present");
}

// ═══════════════════════════════════════════════════════════════════════════
// ESCAPING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_csv_special_characters_round_trip() {
    let tricky = [
        "O'Neil, Pat",
        "say \"hi\"",
        "line one\nline two",
        "plain",
    ];
    let mut grid = Grid::new(march_first());
    for _ in 1..tricky.len() {
        grid.add_row();
    }
    for (i, value) in tricky.iter().enumerate() {
        grid.set_text(0, i + 1, *value);
    }

    let csv = export_text(&grid.snapshot(), ExportFormat::Csv);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());
    let names: Vec<String> = reader
        .records()
        .map(|r| r.unwrap().get(0).unwrap().to_string())
        .collect();
    assert_eq!(names, tricky.to_vec());
}

#[test]
fn test_tsv_flattens_tabs_and_newlines() {
    let mut grid = Grid::new(march_first());
    grid.set_text(0, 1, "a\tb\nc");
    let tsv = export_text(&grid.snapshot(), ExportFormat::Tsv);
    assert_eq!(tsv.lines().nth(1), Some("a b c\t\t"));
}

#[test]
fn test_html_escapes_by_default() {
    let mut grid = Grid::new(march_first());
    grid.set_text(0, 1, "<b>Eve</b> & co");
    let html = export_text(&grid.snapshot(), ExportFormat::Html);
    assert!(html.contains("&lt;b&gt;Eve&lt;/b&gt; &amp; co"));
    assert!(!html.contains("<b>Eve</b>"));
}

#[test]
fn test_html_raw_mode_is_configurable() {
    let mut grid = Grid::new(march_first());
    grid.set_text(0, 1, "<b>Eve</b>");
    let config = AttendanceConfig {
        escape_html: false,
        ..AttendanceConfig::default()
    };
    let artifact = ExportEngine::new(config)
        .export(&grid.snapshot(), None, ExportFormat::Html)
        .unwrap();
    let html = String::from_utf8(artifact.bytes).unwrap();
    assert!(html.contains("<td><b>Eve</b></td>"));
}

// ═══════════════════════════════════════════════════════════════════════════
// ARTIFACTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_artifact_file_names_use_title_or_default() {
    let engine = ExportEngine::default();
    let snapshot = scenario();
    for format in ExportFormat::ALL {
        let titled = engine.export(&snapshot, Some("Math 101"), format).unwrap();
        assert_eq!(titled.file_name, format!("Math 101.{}", format.extension()));
        let untitled = engine.export(&snapshot, Some("  "), format).unwrap();
        assert_eq!(untitled.file_name, format!("Attendance.{}", format.extension()));
        assert_eq!(untitled.mime_type, format.mime_type());
    }
}

#[test]
fn test_artifact_writes_into_directory() {
    let dir = TempDir::new().unwrap();
    let artifact = ExportEngine::default()
        .export(&scenario(), Some("Period 1/2"), ExportFormat::Csv)
        .unwrap();
    let path = artifact.write_to(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("Period 1_2.csv"));
    assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
}

#[test]
fn test_custom_worksheet_name() {
    let config = AttendanceConfig {
        worksheet_name: "Week 1".to_string(),
        ..AttendanceConfig::default()
    };
    let artifact = ExportEngine::new(config)
        .export(&scenario(), None, ExportFormat::Xlsx)
        .unwrap();
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(artifact.bytes)).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Week 1".to_string()]);
    assert!(workbook.worksheet_range("Week 1").is_ok());
}
