use crate::error::Error;
use crate::hasher::{self, HashAlgorithm};
use crate::progress::ProgressReporter;
use crate::scanner::ScanParameters;
use crate::storage::{schema, FileFilter, StorageGate};
use crate::utils::path::{file_size_or_trace, normalize_path, now_local};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

/// Counters reported at the end of a hash pass.
#[derive(Debug, Clone, Default)]
pub struct HashSummary {
    /// Files matched by the filter.
    pub files: usize,
    /// Matched files that already had a stored hash.
    pub has_hash: usize,
    /// Files whose hash was computed in this pass.
    pub calculated: usize,
    pub bytes: u64,
    pub duration: Duration,
}

impl HashSummary {
    /// Throughput in MiB per second of wall time.
    pub fn rate_mib_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes as f64 / (1024.0 * 1024.0) / secs
    }
}

/// Computes and refreshes content checksums for files of an existing image.
pub struct HashEngine {
    gate: StorageGate,
    algorithm: HashAlgorithm,
}

impl HashEngine {
    pub fn new(gate: StorageGate) -> Self {
        Self {
            gate,
            algorithm: HashAlgorithm::default(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn gate(&self) -> &StorageGate {
        &self.gate
    }

    pub fn into_gate(self) -> StorageGate {
        self.gate
    }

    /// Hash every file matched by `filter`.
    ///
    /// With `add_only`, a file that already has a hash is skipped unless its
    /// on-disk size no longer matches the stored size. Per-file failures are
    /// traced as warnings and the pass moves on.
    pub fn calc_hashes_for_files(
        &mut self,
        filter: &FileFilter,
        add_only: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<HashSummary, Error> {
        schema::declare_image_tables(&mut self.gate, false);
        self.gate.open()?;

        let params = ScanParameters::load(&self.gate)?;

        self.gate.trace(
            "calc-hash-start",
            &format!(
                "where=[{}], add-only={}, algorithm={}",
                filter, add_only, self.algorithm
            ),
        );

        let hash_times = self.gate.hash_times().map_err(|e| {
            self.gate.trace("error", "select hash timestamps failed");
            e
        })?;

        let candidates = self.gate.hash_candidates(filter).map_err(|e| {
            self.gate.trace("error", "select files for hash calc failed");
            e
        })?;

        let mut summary = HashSummary {
            files: candidates.len(),
            ..Default::default()
        };
        reporter.on_hash_start(summary.files);
        let start = Instant::now();

        for (done, file) in candidates.iter().enumerate() {
            let full_name = format!(
                "{}{}",
                normalize_path(&format!("{}{}", params.root, file.folder_path)),
                file.name
            );
            let path = Path::new(&full_name);

            let has_hash = hash_times.contains_key(&file.file_id);
            if has_hash {
                summary.has_hash += 1;
            }

            let disk_size = file_size_or_trace(&self.gate, &full_name);
            let size_changed = disk_size != file.size;

            if has_hash && add_only && !size_changed {
                reporter.on_hash_progress(done + 1, summary.files);
                continue;
            }

            if size_changed {
                self.gate.trace(
                    "fsize-changed",
                    &format!("[{}], {} => {}", full_name, file.size, disk_size),
                );
                if self.gate.update_file_size(file.file_id, disk_size).is_err() {
                    self.gate
                        .trace("warning", &format!("fsize for \"{}\" not updated", full_name));
                }
            }

            let hash = if disk_size > 0 {
                hasher::hash_file(path, self.algorithm)
            } else {
                hasher::empty_digest(self.algorithm)
            };

            debug!("{:5} {:8}   {}   {}", file.file_id, disk_size, hash, full_name);

            if self
                .gate
                .upsert_file_hash(file.file_id, &hash, &now_local())
                .is_err()
            {
                self.gate
                    .trace("warning", &format!("hash for \"{}\" not saved", full_name));
            }

            summary.calculated += 1;
            summary.bytes += disk_size as u64;
            reporter.on_hash_progress(done + 1, summary.files);
        }

        summary.duration = start.elapsed();

        self.gate.trace(
            "calc-hash-done",
            &format!(
                "files={}, has-hash={}, calc-hash={}, rate={:.1}MiB/s",
                summary.files,
                summary.has_hash,
                summary.calculated,
                summary.rate_mib_per_sec()
            ),
        );
        reporter.on_hash_complete(summary.calculated, summary.duration.as_secs_f64());

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_for_zero_duration() {
        let summary = HashSummary {
            bytes: 1024,
            ..Default::default()
        };
        assert_eq!(summary.rate_mib_per_sec(), 0.0);
    }

    #[test]
    fn test_rate_in_mib() {
        let summary = HashSummary {
            bytes: 4 * 1024 * 1024,
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert!((summary.rate_mib_per_sec() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hash_pass_needs_existing_image() {
        let mut engine = HashEngine::new(StorageGate::in_memory());
        let result = engine.calc_hashes_for_files(
            &FileFilter::all(),
            true,
            &crate::progress::SilentReporter,
        );
        assert!(matches!(result, Err(Error::UndefinedTable(_))));
    }
}
