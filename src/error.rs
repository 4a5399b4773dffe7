use std::path::PathBuf;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::checksum::ChecksumAlgorithm;

#[derive(Debug, Error, Diagnostic)]
pub enum ResolvError {
    #[error("invalid mode `{mode}` for dataset {dataset}: valid modes are {valid:?}")]
    InvalidMode {
        dataset: String,
        mode: String,
        valid: Vec<String>,
    },

    #[error("exactly one source must be declared as the main one, found {0}")]
    InvalidSourceSet(usize),

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("{url} returned status {status}")]
    TransferStatus { url: String, status: u16 },

    #[error("{algorithm} checksum mismatch for {path}: expected {expected}, computed {computed}")]
    ChecksumMismatch {
        path: Utf8PathBuf,
        algorithm: ChecksumAlgorithm,
        expected: String,
        computed: String,
    },

    #[error("unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("unexpected archive layout: {0}")]
    ArchiveLayout(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("duplicate entry id in index: {0}")]
    DuplicateEntry(String),

    #[error("unknown dataset: {0}")]
    DatasetNotFound(String),

    #[error("file not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("invalid dataset metadata: {0}")]
    Metadata(String),

    #[error("missing config file resolv-data.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
