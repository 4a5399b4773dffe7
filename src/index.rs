use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::checksum::{self, ChecksumAlgorithm};
use crate::error::ResolvError;
use crate::fs_util;

pub const INDEX_FILE_NAME: &str = "index.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetIndex {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub entries: Vec<DatasetEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<String, EntryFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFile {
    pub path: String,
    pub checksum: String,
    pub checksum_algorithm: ChecksumAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
}

impl EntryFile {
    /// Builds the record for a file under `root_dir`, rendering its path
    /// against `path_prefix` so the index stays portable across machines.
    pub fn for_file(
        root_dir: &Utf8Path,
        file: &Utf8Path,
        path_prefix: &str,
        algorithm: ChecksumAlgorithm,
    ) -> Result<Self, ResolvError> {
        let relative = file.strip_prefix(root_dir).map_err(|_| {
            ResolvError::Filesystem(format!("{file} is not under root directory {root_dir}"))
        })?;
        Ok(Self {
            path: format!("{path_prefix}/{relative}"),
            checksum: checksum::compute_checksum(file, algorithm)?,
            checksum_algorithm: algorithm,
            attributes: None,
        })
    }

    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

impl DatasetEntry {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            metadata: None,
            split: None,
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, role: &str, file: EntryFile) -> Self {
        self.files.insert(role.to_string(), file);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_split(mut self, split: &str) -> Self {
        self.split = Some(split.to_string());
        self
    }
}

impl DatasetIndex {
    pub fn index_path(root_dir: &Utf8Path) -> Utf8PathBuf {
        root_dir.join(INDEX_FILE_NAME)
    }

    pub fn write_to(&self, root_dir: &Utf8Path) -> Result<Utf8PathBuf, ResolvError> {
        let path = Self::index_path(root_dir);
        let content = serde_json::to_vec_pretty(self)
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
        fs_util::write_bytes_atomic(&path, &content)?;
        Ok(path)
    }

    pub fn read_from(root_dir: &Utf8Path) -> Result<Self, ResolvError> {
        let path = Self::index_path(root_dir);
        let content = std::fs::read_to_string(path.as_std_path())
            .map_err(|err| ResolvError::Filesystem(format!("read {path}: {err}")))?;
        serde_json::from_str(&content).map_err(|err| ResolvError::Metadata(err.to_string()))
    }
}
