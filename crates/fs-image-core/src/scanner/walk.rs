use super::params::ScanParameters;
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::storage::models::ScanParameter;
use crate::storage::{schema, NewFile, StorageGate};
use crate::utils::path::{file_size_or_trace, file_times, now_local, relative_to_root};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;
use walkdir::WalkDir;

/// Counters reported at the end of a create-image pass.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Directories visited by the walk.
    pub dirs_scanned: usize,
    /// Directories discovered, the root included.
    pub dirs_found: usize,
    pub files_found: usize,
    /// Subdirectories pruned by an exclude pattern, not recorded.
    pub dirs_ignored: usize,
    pub duration: Duration,
}

#[derive(Debug)]
struct ChildDir {
    name: String,
    is_symlink: bool,
}

/// Immediate children of one directory, sorted by name.
#[derive(Debug, Default)]
struct Listing {
    dirs: Vec<ChildDir>,
    files: Vec<String>,
}

/// Walks the root tree and records every folder and file into the store.
pub struct Scanner {
    gate: StorageGate,
    params: ScanParameters,
}

impl Scanner {
    pub fn new(gate: StorageGate) -> Self {
        Scanner {
            gate,
            params: ScanParameters::default(),
        }
    }

    pub fn gate(&self) -> &StorageGate {
        &self.gate
    }

    /// Hand the store over, e.g. to a hash pass on the same in-memory image.
    pub fn into_gate(self) -> StorageGate {
        self.gate
    }

    pub fn params(&self) -> &ScanParameters {
        &self.params
    }

    /// Create a new image of the root directory, without checksums.
    ///
    /// The store must be empty: an existing image is never overwritten.
    pub fn create_image(
        &mut self,
        scan_params: &[ScanParameter],
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanSummary, Error> {
        schema::declare_image_tables(&mut self.gate, true);
        self.gate.open()?;

        for table in self.gate.required_tables().to_vec() {
            let count = self.gate.count_rows(&table).map_err(|e| {
                self.gate.trace("error", "createImage, tables empty validate failed");
                e
            })?;
            if count > 0 {
                self.gate.trace(
                    "error",
                    &format!("createImage, table [{}] is not empty", table),
                );
                return Err(Error::NotEmpty(table));
            }
        }

        for param in scan_params {
            self.gate
                .insert_parameter(&param.name, &param.value)
                .map_err(|e| {
                    self.gate
                        .trace("error", "createImage, save scanParams to database failed");
                    e
                })?;
        }

        self.params = ScanParameters::load(&self.gate)?;

        self.gate.trace(
            "create-image-start",
            &format!(
                "root=[{}], ignore={:?}",
                self.params.root, self.params.excludes
            ),
        );
        reporter.on_scan_start(&self.params.root);

        let summary = self.walk(reporter)?;

        self.gate.trace(
            "create-image-done",
            &format!(
                "dirs={}, files={}, dirs-scanned={}, dirs-ignored={}",
                summary.dirs_found, summary.files_found, summary.dirs_scanned, summary.dirs_ignored
            ),
        );
        reporter.on_scan_complete(summary.files_found, summary.duration.as_secs_f64());

        Ok(summary)
    }

    /// Top-down walk with an explicit stack of pending directories. Excluded
    /// subdirectories are neither recorded nor entered; symlinked ones are
    /// recorded but never entered.
    fn walk(&self, reporter: &dyn ProgressReporter) -> Result<ScanSummary, Error> {
        let start = Instant::now();
        let mut summary = ScanSummary {
            dirs_found: 1, // it's the root
            ..Default::default()
        };

        let mut pending = vec![self.params.root.clone()];
        while let Some(cur_dir) = pending.pop() {
            let Some((cur_dir_id, cur_path)) = self.begin_folder(&cur_dir)? else {
                continue;
            };

            let listing = match list_dir(&cur_dir) {
                Ok(listing) => listing,
                Err(e) if cur_dir == self.params.root => {
                    self.gate
                        .trace("error", &format!("read rootDir \"{}\" failed: {}", cur_dir, e));
                    return Err(Error::Io(e));
                }
                Err(e) => {
                    self.gate
                        .trace("error", &format!("read dir \"{}\" failed: {}", cur_dir, e));
                    continue;
                }
            };

            let mut kept = Vec::with_capacity(listing.dirs.len());
            for dir in &listing.dirs {
                // cur_dir is normalized, so appending keeps it under the root
                let dir_full = format!("{}{}/", cur_dir, dir.name);
                if self.params.is_excluded(&dir_full.to_lowercase()) {
                    self.gate.trace("dir-ignored", &format!("[{}]", dir_full));
                    summary.dirs_ignored += 1;
                    continue;
                }
                kept.push((dir, dir_full));
            }

            let dir_names: Vec<&str> = kept.iter().map(|(d, _)| d.name.as_str()).collect();
            if let Err(e) = self.add_folders(&cur_path, &dir_names) {
                self.gate.trace(
                    "error",
                    &format!(
                        "addFolders for path \"{}\" (id = {}) failed",
                        cur_path, cur_dir_id
                    ),
                );
                return Err(e);
            }

            if let Err(e) = self.add_files(cur_dir_id, &cur_dir, &listing.files) {
                self.gate.trace(
                    "error",
                    &format!(
                        "addFiles for path \"{}\" (id = {}) failed",
                        cur_path, cur_dir_id
                    ),
                );
                return Err(e);
            }

            summary.dirs_scanned += 1;
            summary.dirs_found += kept.len();
            summary.files_found += listing.files.len();
            reporter.on_folder_scanned(summary.dirs_scanned, summary.files_found, &cur_path);

            let mut descend = Vec::with_capacity(kept.len());
            for (dir, dir_full) in kept {
                if dir.is_symlink {
                    debug!("Not descending into symlinked dir {}", dir_full);
                    continue;
                }
                descend.push(dir_full);
            }
            // reversed so the stack pops them in name order
            pending.extend(descend.into_iter().rev());
        }

        summary.duration = start.elapsed();
        Ok(summary)
    }

    /// Resolve the folder id of `cur_dir` and stamp its scan time. `Ok(None)`
    /// means the directory lies outside the root and is skipped.
    fn begin_folder(&self, cur_dir: &str) -> Result<Option<(i64, String)>, Error> {
        let time_str = now_local();

        let Some(cur_path) = relative_to_root(&self.params.root, cur_dir) else {
            self.gate.trace(
                "error",
                &format!("curDir \"{}\" must begin with rootDir, skipped", cur_dir),
            );
            return Ok(None);
        };

        if cur_path == "/" && self.gate.insert_folder_if_missing("/").is_err() {
            self.gate.trace("error", "insert rootDir failed");
        }

        let cur_dir_id = match self.gate.folder_id(&cur_path) {
            Ok(Some(id)) => id,
            _ => {
                self.gate
                    .trace("error", &format!("path \"{}\" not found in Folder", cur_path));
                return Err(Error::FolderNotFound(cur_path));
            }
        };

        if self.gate.touch_folder(cur_dir_id, &time_str).is_err() {
            self.gate.trace(
                "warning",
                &format!(
                    "update Folder for path \"{}\" (id = {}) failed",
                    cur_path, cur_dir_id
                ),
            );
        }

        Ok(Some((cur_dir_id, cur_path)))
    }

    fn add_folders(&self, cur_path: &str, dirs: &[&str]) -> Result<usize, Error> {
        let paths: Vec<String> = dirs
            .iter()
            .map(|name| format!("{}{}/", cur_path, name))
            .collect();
        self.gate.insert_folders(&paths)
    }

    fn add_files(&self, cur_dir_id: i64, cur_dir: &str, files: &[String]) -> Result<usize, Error> {
        let rows: Vec<NewFile> = files
            .iter()
            .map(|name| {
                let full_name = format!("{}{}", cur_dir, name);
                let path = Path::new(&full_name);

                let size = file_size_or_trace(&self.gate, &full_name);
                let (create_time, write_time) = file_times(path);
                NewFile {
                    name: name.clone(),
                    size,
                    create_time,
                    write_time,
                }
            })
            .collect();
        self.gate.insert_files(cur_dir_id, &rows)
    }
}

/// List the immediate children of `dir` without following symlinks. A
/// symlink pointing at a directory is listed as a directory.
fn list_dir(dir: &str) -> io::Result<Listing> {
    let mut listing = Listing::default();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(err) => {
                debug!("Skipping unreadable entry in {}: {}", dir, err);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_dir() {
            listing.dirs.push(ChildDir {
                name,
                is_symlink: false,
            });
        } else if entry.path_is_symlink() && entry.path().is_dir() {
            listing.dirs.push(ChildDir {
                name,
                is_symlink: true,
            });
        } else {
            listing.files.push(name);
        }
    }

    Ok(listing)
}
