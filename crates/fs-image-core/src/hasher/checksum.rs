use super::HashAlgorithm;
use md5::{Digest as _, Md5};
use std::fs::File;
use std::hash::Hasher as _;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;
use twox_hash::XxHash64;

const CHUNK_SIZE: usize = 128 * 1024; // 128KB

enum Digest {
    Blake3(Box<blake3::Hasher>),
    Xxh64(XxHash64),
    Md5(Md5),
}

impl Digest {
    fn new(algo: HashAlgorithm) -> Self {
        match algo {
            HashAlgorithm::Blake3 => Digest::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Xxh64 => Digest::Xxh64(XxHash64::with_seed(0)),
            HashAlgorithm::Md5 => Digest::Md5(Md5::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Digest::Blake3(h) => {
                h.update(data);
            }
            Digest::Xxh64(h) => h.write(data),
            Digest::Md5(h) => h.update(data),
        }
    }

    fn finish(self) -> String {
        match self {
            Digest::Blake3(h) => h.finalize().to_hex().to_uppercase(),
            Digest::Xxh64(h) => format!("{:016X}", h.finish()),
            Digest::Md5(h) => h.finalize().iter().map(|b| format!("{:02X}", b)).collect(),
        }
    }
}

/// Stream `reader` through the hasher in fixed-size chunks and return the
/// digest as uppercase hex. Memory use does not depend on input size.
pub fn hash_reader<R: Read>(mut reader: R, algo: HashAlgorithm) -> io::Result<String> {
    let mut digest = Digest::new(algo);
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        digest.update(&buffer[..n]);
    }
    Ok(digest.finish())
}

/// Digest of zero bytes of input.
pub fn empty_digest(algo: HashAlgorithm) -> String {
    Digest::new(algo).finish()
}

/// Checksum of a file's content. A file that cannot be opened or read hashes
/// as empty input.
pub fn hash_file(path: &Path, algo: HashAlgorithm) -> String {
    match File::open(path).and_then(|f| hash_reader(f, algo)) {
        Ok(hash) => hash,
        Err(e) => {
            debug!("Reading {} for checksum failed: {}", path.display(), e);
            empty_digest(algo)
        }
    }
}
