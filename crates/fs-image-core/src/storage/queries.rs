use super::filter::FileFilter;
use super::gate::{Row, StorageGate};
use super::models::*;
use super::schema::{FILE_ENTRY, FOLDER, SCAN_PARAMETER};
use crate::error::Error;
use ahash::AHashMap;
use rusqlite::types::{ToSql, Value};

/// A file row produced by the walker, not yet stored.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub size: i64,
    pub create_time: String,
    pub write_time: String,
}

impl StorageGate {
    // ── Scan Parameters ──────────────────────────────────────────

    pub fn insert_parameter(&self, name: &str, value: &str) -> Result<(), Error> {
        self.execute(
            "insert into ScanParameter (name, value) values (?1, ?2)",
            &[&name, &value],
        )?;
        Ok(())
    }

    pub fn parameter_values(&self, name: &str) -> Result<Vec<String>, Error> {
        self.execute("select value from ScanParameter where name = ?1", &[&name])?
            .iter()
            .map(|row| text_at(row, 0))
            .collect()
    }

    /// Values of every parameter whose name starts with `prefix`.
    pub fn parameter_values_with_prefix(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let pattern = format!("{}%", prefix);
        let rows = self.execute(
            "select value from ScanParameter where name like ?1",
            &[&pattern],
        )?;
        rows.iter().map(|row| text_at(row, 0)).collect()
    }

    pub fn parameters(&self) -> Result<Vec<ScanParameter>, Error> {
        self.execute(
            &format!("select name, value from {} order by rowid", SCAN_PARAMETER),
            &[],
        )?
        .iter()
        .map(ScanParameter::from_row)
        .collect()
    }

    pub fn count_rows(&self, table: &str) -> Result<i64, Error> {
        let rows = self.execute(&format!("select count(1) from {}", table), &[])?;
        match rows.first() {
            Some(row) => int_at(row, 0),
            None => Err(Error::Other(format!("count of {} returned no rows", table))),
        }
    }

    // ── Folders ──────────────────────────────────────────────────

    pub fn insert_folder_if_missing(&self, path: &str) -> Result<(), Error> {
        self.execute("insert or ignore into Folder (path) values (?1)", &[&path])?;
        Ok(())
    }

    /// Id of the folder at a root-relative path. More than one match is
    /// reported as not found, same as none.
    pub fn folder_id(&self, path: &str) -> Result<Option<i64>, Error> {
        let rows = self.execute("select id from Folder where path = ?1", &[&path])?;
        match rows.as_slice() {
            [row] => Ok(Some(int_at(row, 0)?)),
            _ => Ok(None),
        }
    }

    pub fn touch_folder(&self, folder_id: i64, scan_time: &str) -> Result<(), Error> {
        self.execute(
            "update Folder set scanTime = ?1 where id = ?2",
            &[&scan_time, &folder_id],
        )?;
        Ok(())
    }

    pub fn insert_folders(&self, paths: &[String]) -> Result<usize, Error> {
        let rows: Vec<Row> = paths.iter().map(|p| vec![Value::Text(p.clone())]).collect();
        self.insert_rows(FOLDER, &["path"], &rows)
    }

    pub fn folders(&self) -> Result<Vec<Folder>, Error> {
        self.execute("select id, path, scanTime from Folder order by id", &[])?
            .iter()
            .map(Folder::from_row)
            .collect()
    }

    // ── Files ────────────────────────────────────────────────────

    pub fn insert_files(&self, folder_id: i64, files: &[NewFile]) -> Result<usize, Error> {
        let rows: Vec<Row> = files
            .iter()
            .map(|f| {
                vec![
                    Value::Integer(folder_id),
                    Value::Text(f.name.clone()),
                    Value::Integer(f.size),
                    Value::Text(f.create_time.clone()),
                    Value::Text(f.write_time.clone()),
                ]
            })
            .collect();
        self.insert_rows(
            FILE_ENTRY,
            &["folderId", "name", "size", "createTime", "writeTime"],
            &rows,
        )
    }

    pub fn files(&self) -> Result<Vec<FileEntry>, Error> {
        self.execute(
            "select id, folderId, name, size, createTime, writeTime from FileEntry order by id",
            &[],
        )?
        .iter()
        .map(FileEntry::from_row)
        .collect()
    }

    pub fn update_file_size(&self, file_id: i64, size: i64) -> Result<(), Error> {
        self.execute(
            "update FileEntry set size = ?1 where id = ?2",
            &[&size, &file_id],
        )?;
        Ok(())
    }

    /// Files matching `filter`, joined with their folder path.
    pub fn hash_candidates(&self, filter: &FileFilter) -> Result<Vec<HashCandidate>, Error> {
        let (condition, values) = filter.where_clause();
        let sql = format!(
            "select ff.id, ff.size, ff.name, fo.path \
             from FileEntry ff join Folder fo on ff.folderId = fo.id \
             where {} order by ff.id",
            condition
        );
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
        let rows = self.execute(&sql, &params)?;
        rows.iter().map(HashCandidate::from_row).collect()
    }

    // ── Hashes ───────────────────────────────────────────────────

    /// `fileId → calcTime` of every stored hash.
    pub fn hash_times(&self) -> Result<AHashMap<i64, String>, Error> {
        self.execute("select fileId, calcTime from FileHash", &[])?
            .iter()
            .map(|row| -> Result<(i64, String), Error> { Ok((int_at(row, 0)?, text_at(row, 1)?)) })
            .collect()
    }

    pub fn upsert_file_hash(&self, file_id: i64, hash: &str, calc_time: &str) -> Result<(), Error> {
        self.execute(
            "insert into FileHash (fileId, hash, calcTime) values (?1, ?2, ?3) \
             on conflict(fileId) do update set hash = excluded.hash, calcTime = excluded.calcTime",
            &[&file_id, &hash, &calc_time],
        )?;
        Ok(())
    }

    pub fn file_hashes(&self) -> Result<Vec<FileHash>, Error> {
        self.execute(
            "select fileId, hash, calcTime from FileHash order by fileId",
            &[],
        )?
        .iter()
        .map(FileHash::from_row)
        .collect()
    }
}
