use std::fmt;
use std::fs::File;
use std::io::Read;
use std::str::FromStr;

use camino::Utf8Path;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ResolvError;

const CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha256,
}

impl Default for ChecksumAlgorithm {
    fn default() -> Self {
        ChecksumAlgorithm::Sha256
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumAlgorithm::Md5 => write!(f, "md5"),
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ResolvError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            other => Err(ResolvError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

pub fn compute_checksum(
    path: &Utf8Path,
    algorithm: ChecksumAlgorithm,
) -> Result<String, ResolvError> {
    if !path.as_std_path().is_file() {
        return Err(ResolvError::NotFound(path.to_path_buf()));
    }
    let mut file = File::open(path.as_std_path())
        .map_err(|err| ResolvError::Filesystem(format!("open {path}: {err}")))?;

    match algorithm {
        ChecksumAlgorithm::Md5 => {
            let mut hasher = Md5::new();
            read_chunks(&mut file, path, |chunk| hasher.update(chunk))?;
            Ok(format!("{:x}", hasher.finalize()))
        }
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            read_chunks(&mut file, path, |chunk| hasher.update(chunk))?;
            Ok(format!("{:x}", hasher.finalize()))
        }
    }
}

pub fn validate_checksum(
    path: &Utf8Path,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<bool, ResolvError> {
    let computed = compute_checksum(path, algorithm)?;
    tracing::debug!("expected checksum: {expected}, computed checksum: {computed}");
    Ok(computed.eq_ignore_ascii_case(expected))
}

pub fn ensure_checksum(
    path: &Utf8Path,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<(), ResolvError> {
    let computed = compute_checksum(path, algorithm)?;
    if !computed.eq_ignore_ascii_case(expected) {
        return Err(ResolvError::ChecksumMismatch {
            path: path.to_path_buf(),
            algorithm,
            expected: expected.to_string(),
            computed,
        });
    }
    Ok(())
}

fn read_chunks(
    reader: &mut impl Read,
    path: &Utf8Path,
    mut update: impl FnMut(&[u8]),
) -> Result<(), ResolvError> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|err| ResolvError::Filesystem(format!("read {path}: {err}")))?;
        if read == 0 {
            return Ok(());
        }
        update(&buffer[..read]);
    }
}
