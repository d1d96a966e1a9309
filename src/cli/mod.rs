//! CLI command handlers

pub mod commands;

pub use commands::{
    add_column, add_date, add_member, add_row, delete_column, delete_date, delete_row, export,
    formats, init, list, mark, remove_member, rename, retitle, set, show, show_config, summary,
    InitOptions, Workspace,
};
