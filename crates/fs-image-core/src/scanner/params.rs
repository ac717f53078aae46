use crate::error::Error;
use crate::platform;
use crate::storage::StorageGate;
use crate::utils::path::normalize_path;
use std::env;
use std::path::Path;

pub const STORAGE_NAME_KEY: &str = "StorageName";
pub const EXCLUDE_PATH_PREFIX: &str = "ExcludePath";

/// Scan parameters as read back from the `ScanParameter` table.
#[derive(Debug, Clone, Default)]
pub struct ScanParameters {
    /// Normalized root directory, always with a trailing slash.
    pub root: String,
    /// Lower-cased, forward-slash exclude substrings.
    pub excludes: Vec<String>,
}

impl ScanParameters {
    /// Load the platform root and the exclude list from the store.
    pub fn load(gate: &StorageGate) -> Result<Self, Error> {
        let key = platform::root_parameter_key();
        let roots = gate.parameter_values(key).map_err(|e| {
            gate.trace("error", &format!("load param [{}] failed", key));
            e
        })?;
        if roots.len() != 1 {
            let msg = format!("load param [{}] failed, {} values found", key, roots.len());
            gate.trace("error", &msg);
            return Err(Error::Parameter(msg));
        }

        let root = absolute_root(&roots[0]).map_err(|e| {
            gate.trace(
                "error",
                &format!("resolve rootDir \"{}\" failed: {}", roots[0], e),
            );
            e
        })?;

        let excludes = gate
            .parameter_values_with_prefix(EXCLUDE_PATH_PREFIX)
            .map_err(|e| {
                gate.trace("error", &format!("load params [{}] failed", EXCLUDE_PATH_PREFIX));
                e
            })?
            .into_iter()
            .map(|p| normalize_exclude(&p))
            .collect();

        Ok(ScanParameters { root, excludes })
    }

    /// True when the lower-cased full directory path contains any exclude
    /// substring.
    pub fn is_excluded(&self, dir_full_lower: &str) -> bool {
        self.excludes.iter().any(|e| dir_full_lower.contains(e.as_str()))
    }
}

/// Normalized absolute form of `root`. A relative root is taken against the
/// current directory, so child paths keep the root as their prefix.
fn absolute_root(root: &str) -> Result<String, Error> {
    let path = Path::new(root);
    if path.is_absolute() {
        return Ok(normalize_path(root));
    }
    let joined = env::current_dir()?.join(path);
    Ok(normalize_path(&joined.to_string_lossy()))
}

fn normalize_exclude(pattern: &str) -> String {
    pattern.replace('\\', "/").to_lowercase()
}
