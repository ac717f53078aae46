/// Trait for reporting scan and hash progress.
///
/// The CLI implements it with indicatif bars. All methods have default no-op
/// implementations.
pub trait ProgressReporter {
    fn on_scan_start(&self, _root: &str) {}
    fn on_folder_scanned(&self, _dirs_scanned: usize, _files_found: usize, _current_path: &str) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_hash_start(&self, _total_files: usize) {}
    fn on_hash_progress(&self, _files_done: usize, _total_files: usize) {}
    fn on_hash_complete(&self, _files_hashed: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
