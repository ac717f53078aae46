pub mod checksum;

use serde::Deserialize;
use std::fmt;

pub use checksum::{empty_digest, hash_file, hash_reader};

/// Content checksum algorithm used by the hash pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Xxh64,
    /// Interchangeable with images written by older tooling.
    Md5,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Blake3 => write!(f, "blake3"),
            HashAlgorithm::Xxh64 => write!(f, "xxh64"),
            HashAlgorithm::Md5 => write!(f, "md5"),
        }
    }
}
