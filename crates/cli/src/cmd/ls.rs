//! `luabox ls`: list a directory of the sandbox filesystem.

use chrono::Local;
use color_eyre::eyre::{Result, WrapErr};
use luabox_core::fs::{FileInfo, Filesystem};
use luabox_core::localenv::build_vfs;
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Size")]
    size: u64,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "ETag")]
    etag: String,
}

impl From<&FileInfo> for EntryRow {
    fn from(info: &FileInfo) -> Self {
        let name = if info.is_dir { format!("{}/", info.name) } else { info.name.clone() };
        Self {
            name,
            size: info.size,
            modified: info
                .last_modified
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            etag: info.etag.clone(),
        }
    }
}

pub fn run(config: Option<&Path>, profile: Option<&str>, path: &str) -> Result<()> {
    let cfg = super::load(config, profile)?;
    let vfs = build_vfs(&cfg)?;

    let entries = vfs.list(path).wrap_err_with(|| format!("cannot list {path}"))?;
    if entries.is_empty() {
        println!("(empty)");
        return Ok(());
    }

    let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!("\nTotal: {} entries", rows.len());
    Ok(())
}
