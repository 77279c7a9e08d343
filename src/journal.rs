//! Append-only completion journal for mutating runs.
//!
//! One JSON line is written and flushed for every finished table family so an interrupted run
//! can be audited. Re-running the same replacement resumes safely because already replaced rows
//! no longer match.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::mapping::TableFamily;

#[derive(Debug, Serialize)]
pub struct JournalRecord<'a> {
    pub timestamp: String,
    pub entity_type: &'a str,
    pub field: &'a str,
    pub table: &'a str,
    pub family: TableFamily,
    pub rows: usize,
    pub search: &'a str,
    pub replace: &'a str,
}

#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Opening journal {path:?}"))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Journal path used when none is given: next to the database file.
    pub fn default_path(database: &Path) -> PathBuf {
        let mut name = database
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".replace-journal.jsonl");
        database.with_file_name(name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line and syncs it to disk before returning.
    pub fn record(&mut self, record: &JournalRecord<'_>) -> io::Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.file, "{line}")?;
        self.file.flush()?;
        self.file.sync_data()
    }
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
