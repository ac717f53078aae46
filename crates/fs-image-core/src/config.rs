use crate::hasher::HashAlgorithm;
use crate::platform::{ROOT_KEY_LINUX, ROOT_KEY_WIN32};
use crate::scanner::params::{EXCLUDE_PATH_PREFIX, STORAGE_NAME_KEY};
use crate::storage::models::ScanParameter;
use crate::storage::DEFAULT_BATCH_SIZE;
use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Placeholder in `db_name` replaced by the current date (`YYYY.MM.DD`).
pub const DATE_PLACEHOLDER: &str = "%date%";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory the image databases are written to.
    #[serde(default = "default_save_dir")]
    pub save_dir: String,
    /// Rows per compound insert statement.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    #[serde(default)]
    pub scans: Vec<ScanJob>,
}

/// One configured storage device to image.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanJob {
    pub name: String,
    pub db_name: String,
    #[serde(default)]
    pub storage_name: Option<String>,
    #[serde(default)]
    pub root_win32: Option<String>,
    #[serde(default)]
    pub root_linux: Option<String>,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

fn default_save_dir() -> String {
    ".".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl AppConfig {
    pub fn job(&self, name: &str) -> Option<&ScanJob> {
        self.scans.iter().find(|j| j.name == name)
    }
}

impl ScanJob {
    /// Parameters persisted into the `ScanParameter` table, in order.
    pub fn scan_params(&self) -> Vec<ScanParameter> {
        let mut params = Vec::new();
        let mut push = |name: &str, value: &str| {
            params.push(ScanParameter {
                name: name.to_string(),
                value: value.to_string(),
            })
        };

        if let Some(root) = &self.root_win32 {
            push(ROOT_KEY_WIN32, root);
        }
        if let Some(root) = &self.root_linux {
            push(ROOT_KEY_LINUX, root);
        }
        if let Some(storage) = &self.storage_name {
            push(STORAGE_NAME_KEY, storage);
        }
        for (i, exclude) in self.exclude_paths.iter().enumerate() {
            push(&format!("{}{}", EXCLUDE_PATH_PREFIX, i + 1), exclude);
        }
        params
    }

    /// Database file for this job under `save_dir`, with the date filled in.
    pub fn db_path(&self, save_dir: &Path, date: NaiveDate) -> PathBuf {
        let stamp = date.format("%Y.%m.%d").to_string();
        save_dir.join(self.db_name.replace(DATE_PLACEHOLDER, &stamp))
    }
}

/// Load `Config.toml` (or the file named by `FS_IMAGE_CONFIG`), overlaid with
/// `FS_IMAGE_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let name = env::var("FS_IMAGE_CONFIG").unwrap_or_else(|_| "Config".to_string());
    load_configuration_from(&name)
}

pub fn load_configuration_from(name: &str) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(name).required(false))
        .add_source(Environment::with_prefix("FS_IMAGE").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ScanJob {
        ScanJob {
            name: "data".to_string(),
            db_name: "asus2data-%date%.sqlite".to_string(),
            storage_name: Some("ASUS-sda5".to_string()),
            root_win32: Some("D:/".to_string()),
            root_linux: Some("/media/DATA/".to_string()),
            exclude_paths: vec!["/RECYCLER/".to_string(), "/.svn/".to_string()],
        }
    }

    #[test]
    fn test_scan_params_order_and_keys() {
        let names: Vec<String> = job().scan_params().into_iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "RootDirWin32",
                "RootDirLinux",
                "StorageName",
                "ExcludePath1",
                "ExcludePath2"
            ]
        );
    }

    #[test]
    fn test_db_path_replaces_date() {
        let date = NaiveDate::from_ymd_opt(2011, 6, 2).unwrap();
        let path = job().db_path(Path::new("/tmp/list-files"), date);
        assert_eq!(
            path,
            PathBuf::from("/tmp/list-files/asus2data-2011.06.02.sqlite")
        );
    }

    #[test]
    fn test_load_configuration_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Scans.toml");
        std::fs::write(
            &file,
            r#"
save_dir = "/media/DATA/list-files"
hash_algorithm = "xxh64"

[[scans]]
name = "flash"
db_name = "flash4gb-%date%.sqlite"
storage_name = "FLASH4GB"
root_linux = "/media/FLASH4GB/"
exclude_paths = ["/RECYCLER/", "/$RECYCLE.BIN/"]
"#,
        )
        .unwrap();

        let config = load_configuration_from(file.with_extension("").to_str().unwrap()).unwrap();
        assert_eq!(config.save_dir, "/media/DATA/list-files");
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Xxh64);

        let job = config.job("flash").unwrap();
        assert_eq!(job.exclude_paths.len(), 2);
        assert!(job.root_win32.is_none());
        assert!(config.job("missing").is_none());
    }
}
