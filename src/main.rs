use anyhow::Context;
use attendance_grid::cli::{self, InitOptions, Workspace};
use attendance_grid::config::AttendanceConfig;
use attendance_grid::export::ExportFormat;
use attendance_grid::persistence::JsonFileStore;
use attendance_grid::types::{SheetKind, SheetView};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "attendance")]
#[command(about = "Attendance sheets: a name/phone/id grid with one checkbox column per day")]
#[command(long_about = "Attendance - keep attendance sheets and export them

Each sheet is a grid of static text columns (Name, Phone, ID by default)
followed by one present/absent column per calendar day. Sheets are stored
as JSON documents in the store directory and saved after every change.

POSITIONS:
  Columns, days and rows are counted from 1. A day can also be given as
  its date (YYYY-MM-DD).

EXPORT FORMATS:
  csv, tsv, html, pdf, xlsx, ods
  Rows with no data are skipped. A sheet with no data exports nothing.

EXAMPLES:
  attendance init \"Math 101\" --start 2024-03-01 --days 5 --rows 20
  attendance set \"Math 101\" 1 1 \"Alice\"
  attendance mark \"Math 101\" 2024-03-01 1
  attendance export \"Math 101\" --format pdf,xlsx -o out/
  attendance summary \"Math 101\" --json")]
#[command(version)]
struct Cli {
    /// Directory holding the sheet documents
    #[arg(long, global = true, env = "ATTENDANCE_STORE", default_value = ".")]
    store: PathBuf,

    /// YAML configuration file
    #[arg(long, global = true, env = "ATTENDANCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new sheet
    Init {
        /// Sheet title, also used for export file names
        title: String,

        /// Date of the first date column (defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Creator recorded on the sheet
        #[arg(long, default_value = "local")]
        owner: String,

        #[arg(long, value_enum, default_value_t = SheetKind::Student)]
        kind: SheetKind,

        #[arg(long, value_enum, default_value_t = SheetView::Daily)]
        view: SheetView,

        /// Date columns to create up front
        #[arg(long, default_value_t = 0)]
        days: usize,

        /// Rows to create up front (at least one row always exists)
        #[arg(long, default_value_t = 1)]
        rows: usize,
    },

    /// List stored sheets, most recently updated first
    List,

    /// Print a sheet's grid
    Show {
        /// Sheet id or title
        sheet: String,
    },

    /// Write a text cell
    Set {
        /// Sheet id or title
        sheet: String,
        /// Static column number
        column: usize,
        /// Row number
        row: usize,
        /// New text (empty clears the cell)
        text: String,
    },

    /// Mark a row present (or absent) on a day
    Mark {
        /// Sheet id or title
        sheet: String,
        /// Day number or YYYY-MM-DD date
        day: String,
        /// Row number
        row: usize,
        /// Clear the mark instead of setting it
        #[arg(long)]
        absent: bool,
    },

    /// Append an empty row
    AddRow {
        /// Sheet id or title
        sheet: String,
    },

    /// Append the next day as a date column
    AddDate {
        /// Sheet id or title
        sheet: String,
        /// Number of days to append
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Append a static text column
    AddColumn {
        /// Sheet id or title
        sheet: String,
        /// Header label
        label: String,
    },

    /// Relabel a static column header
    Rename {
        /// Sheet id or title
        sheet: String,
        /// Static column number
        column: usize,
        /// New header label
        label: String,
    },

    /// Change a sheet's title
    Retitle {
        /// Sheet id or title
        sheet: String,
        /// New title
        title: String,
    },

    /// Record a member id on a sheet
    AddMember {
        /// Sheet id or title
        sheet: String,
        /// Member id
        member: String,
    },

    /// Remove a member id from a sheet
    RemoveMember {
        /// Sheet id or title
        sheet: String,
        /// Member id
        member: String,
    },

    /// Delete a row (the last remaining row is cleared instead)
    DeleteRow {
        /// Sheet id or title
        sheet: String,
        /// Row number
        row: usize,
    },

    /// Delete a static column and its data
    DeleteColumn {
        /// Sheet id or title
        sheet: String,
        /// Static column number
        column: usize,
    },

    /// Delete a date column; later days shift one date earlier
    DeleteDate {
        /// Sheet id or title
        sheet: String,
        /// Day number or YYYY-MM-DD date
        day: String,
    },

    #[command(long_about = "Export a sheet to one or more file formats.

Files are named after the sheet title ({title}.{ext}) and written to the
output directory. Without --format every supported format is written.

Rows with no text and no marks are skipped. When no row holds data, a
notice is printed and no file is written.")]
    /// Export a sheet to files
    Export {
        /// Sheet id or title
        sheet: String,

        /// Formats to write (comma separated); all when omitted
        #[arg(short, long, value_enum, value_delimiter = ',')]
        format: Vec<ExportFormat>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Attendance statistics per member and per day
    Summary {
        /// Sheet id or title
        sheet: String,

        /// Print the JSON payload instead of a table
        #[arg(long)]
        json: bool,

        /// Flag members whose rate is below this fraction (0.0 - 1.0)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// List supported export formats
    Formats,

    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attendance_grid=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AttendanceConfig::load(cli.config.as_deref()).with_context(|| {
        format!(
            "Failed to load configuration{}",
            cli.config
                .as_ref()
                .map(|p| format!(" from {}", p.display()))
                .unwrap_or_default()
        )
    })?;
    let workspace = Workspace::new(Arc::new(JsonFileStore::new(&cli.store)), config);

    match cli.command {
        Commands::Init {
            title,
            start,
            owner,
            kind,
            view,
            days,
            rows,
        } => cli::init(
            &workspace,
            InitOptions {
                title,
                owner,
                start,
                kind,
                view,
                days,
                rows,
            },
        )?,

        Commands::List => cli::list(&workspace)?,

        Commands::Show { sheet } => cli::show(&workspace, &sheet)?,

        Commands::Set {
            sheet,
            column,
            row,
            text,
        } => cli::set(&workspace, &sheet, column, row, text)?,

        Commands::Mark {
            sheet,
            day,
            row,
            absent,
        } => cli::mark(&workspace, &sheet, &day, row, absent)?,

        Commands::AddRow { sheet } => cli::add_row(&workspace, &sheet)?,

        Commands::AddDate { sheet, count } => cli::add_date(&workspace, &sheet, count)?,

        Commands::AddColumn { sheet, label } => cli::add_column(&workspace, &sheet, label)?,

        Commands::Rename {
            sheet,
            column,
            label,
        } => cli::rename(&workspace, &sheet, column, label)?,

        Commands::Retitle { sheet, title } => cli::retitle(&workspace, &sheet, title)?,

        Commands::AddMember { sheet, member } => cli::add_member(&workspace, &sheet, &member)?,

        Commands::RemoveMember { sheet, member } => {
            cli::remove_member(&workspace, &sheet, &member)?
        }

        Commands::DeleteRow { sheet, row } => cli::delete_row(&workspace, &sheet, row)?,

        Commands::DeleteColumn { sheet, column } => {
            cli::delete_column(&workspace, &sheet, column)?
        }

        Commands::DeleteDate { sheet, day } => cli::delete_date(&workspace, &sheet, &day)?,

        Commands::Export {
            sheet,
            format,
            output,
        } => cli::export(&workspace, &sheet, format, output)?,

        Commands::Summary {
            sheet,
            json,
            threshold,
        } => cli::summary(&workspace, &sheet, json, threshold)?,

        Commands::Formats => cli::formats()?,

        Commands::Config => cli::show_config(&workspace, cli.config.as_deref())?,
    }

    Ok(())
}
