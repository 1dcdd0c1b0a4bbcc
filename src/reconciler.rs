use rusqlite::Connection;

use crate::db::{count_movements, sample_movements};
use crate::error::Result;
use crate::importer::{FieldWarning, SourceFile};
use crate::models::StoredMovement;

pub const SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowErrorKind {
    /// The CSV reader could not decode the line.
    Unreadable,
    /// The row does not fit the header layout.
    Mapping,
    /// The store rejected the INSERT.
    Insert,
}

impl RowErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unreadable => "unreadable",
            Self::Mapping => "mapping",
            Self::Insert => "insert",
        }
    }
}

/// A row that was not written.
#[derive(Debug, Clone)]
pub struct RowError {
    pub row: usize,
    pub kind: RowErrorKind,
    pub message: String,
    pub data: String,
}

/// Before/after comparison for one import run.
pub struct ImportReport {
    pub delimiter: char,
    pub headers: Vec<String>,
    pub rows_read: usize,
    pub initial_count: i64,
    pub inserted: usize,
    pub skipped: usize,
    pub final_count: i64,
    pub warnings: Vec<FieldWarning>,
    pub errors: Vec<RowError>,
    pub sample: Vec<StoredMovement>,
}

impl ImportReport {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Growth of the table matches what this run inserted.
    ///
    /// Read-after-write only: another writer during the run would break it.
    pub fn is_consistent(&self) -> bool {
        self.final_count - self.initial_count == self.inserted as i64
            && self.rows_read == self.inserted + self.skipped + self.failed()
    }
}

#[allow(clippy::too_many_arguments)]
pub fn build_report(
    conn: &Connection,
    source: &SourceFile,
    initial_count: i64,
    rows_read: usize,
    inserted: usize,
    skipped: usize,
    warnings: Vec<FieldWarning>,
    errors: Vec<RowError>,
) -> Result<ImportReport> {
    let final_count = count_movements(conn)?;
    let sample = sample_movements(conn, SAMPLE_ROWS)?;
    Ok(ImportReport {
        delimiter: source.delimiter_char(),
        headers: source.layout.labels.clone(),
        rows_read,
        initial_count,
        inserted,
        skipped,
        final_count,
        warnings,
        errors,
        sample,
    })
}
