use super::gate::Row;
use crate::error::Error;
use rusqlite::types::Value;

/// A `name`/`value` pair from the ScanParameter table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanParameter {
    pub name: String,
    pub value: String,
}

/// A folder under the scanned root. `path` is root-relative and normalized.
#[derive(Debug, Clone)]
pub struct Folder {
    pub id: i64,
    pub path: String,
    pub scan_time: Option<String>,
}

/// A file discovered during a create-image pass.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub id: i64,
    pub folder_id: i64,
    pub name: String,
    pub size: i64,
    pub create_time: String,
    pub write_time: String,
}

/// Stored checksum of a file, one-to-one with [`FileEntry`].
#[derive(Debug, Clone)]
pub struct FileHash {
    pub file_id: i64,
    pub hash: String,
    pub calc_time: String,
}

/// A file selected for the hash pass, joined with its folder path.
#[derive(Debug, Clone)]
pub struct HashCandidate {
    pub file_id: i64,
    pub size: i64,
    pub name: String,
    pub folder_path: String,
}

/// One row of the append-only `History` table.
#[derive(Debug, Clone)]
pub struct HistoryEvent {
    pub timestamp: String,
    pub event: String,
    pub message: String,
}

pub(crate) fn int_at(row: &Row, index: usize) -> Result<i64, Error> {
    match row.get(index) {
        Some(Value::Integer(v)) => Ok(*v),
        other => Err(Error::Other(format!(
            "expected integer in column {}, got {:?}",
            index, other
        ))),
    }
}

pub(crate) fn text_at(row: &Row, index: usize) -> Result<String, Error> {
    match row.get(index) {
        Some(Value::Text(v)) => Ok(v.clone()),
        Some(Value::Integer(v)) => Ok(v.to_string()),
        other => Err(Error::Other(format!(
            "expected text in column {}, got {:?}",
            index, other
        ))),
    }
}

pub(crate) fn opt_text_at(row: &Row, index: usize) -> Result<Option<String>, Error> {
    match row.get(index) {
        Some(Value::Null) => Ok(None),
        _ => text_at(row, index).map(Some),
    }
}

impl ScanParameter {
    pub(crate) fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(ScanParameter {
            name: text_at(row, 0)?,
            value: text_at(row, 1)?,
        })
    }
}

impl Folder {
    pub(crate) fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Folder {
            id: int_at(row, 0)?,
            path: text_at(row, 1)?,
            scan_time: opt_text_at(row, 2)?,
        })
    }
}

impl FileEntry {
    pub(crate) fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(FileEntry {
            id: int_at(row, 0)?,
            folder_id: int_at(row, 1)?,
            name: text_at(row, 2)?,
            size: int_at(row, 3)?,
            create_time: text_at(row, 4)?,
            write_time: text_at(row, 5)?,
        })
    }
}

impl FileHash {
    pub(crate) fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(FileHash {
            file_id: int_at(row, 0)?,
            hash: text_at(row, 1)?,
            calc_time: text_at(row, 2)?,
        })
    }
}

impl HashCandidate {
    pub(crate) fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(HashCandidate {
            file_id: int_at(row, 0)?,
            size: int_at(row, 1)?,
            name: text_at(row, 2)?,
            folder_path: text_at(row, 3)?,
        })
    }
}

impl HistoryEvent {
    pub(crate) fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(HistoryEvent {
            timestamp: text_at(row, 0)?,
            event: text_at(row, 1)?,
            message: text_at(row, 2)?,
        })
    }
}
