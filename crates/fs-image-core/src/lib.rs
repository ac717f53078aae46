pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod platform;
pub mod progress;
pub mod scanner;
pub mod storage;
pub mod utils;

pub use config::{AppConfig, ScanJob};
pub use engine::{HashEngine, HashSummary};
pub use error::Error;
pub use hasher::HashAlgorithm;
pub use progress::{ProgressReporter, SilentReporter};
pub use scanner::{ScanParameters, ScanSummary, Scanner};
pub use storage::{FileFilter, StorageGate};
