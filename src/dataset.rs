use std::collections::BTreeMap;

use camino::Utf8Path;

use crate::checksum::ChecksumAlgorithm;
use crate::error::ResolvError;
use crate::index::DatasetEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub homepage: String,
    pub license_info: String,
    pub citation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    pub filename: String,
    pub url: String,
    pub checksum: String,
    pub checksum_algorithm: ChecksumAlgorithm,
    pub is_main: bool,
    pub is_archive: bool,
    pub has_archived_root: bool,
}

impl RemoteSource {
    pub fn new(filename: &str, url: &str, checksum: &str) -> Self {
        Self {
            filename: filename.to_string(),
            url: url.to_string(),
            checksum: checksum.to_string(),
            checksum_algorithm: ChecksumAlgorithm::default(),
            is_main: false,
            is_archive: false,
            has_archived_root: false,
        }
    }

    pub fn main_archive(filename: &str, url: &str, checksum: &str) -> Self {
        Self {
            is_main: true,
            is_archive: true,
            ..Self::new(filename, url, checksum)
        }
    }
}

pub trait DatasetDescriptor: std::fmt::Debug {
    fn info(&self) -> DatasetInfo;

    fn version(&self) -> &str;

    fn remote_sources(&self) -> BTreeMap<String, Vec<RemoteSource>>;

    /// Enumerates the manifest entries for an established root directory.
    /// Recorded file paths must be rendered against `path_prefix`, never
    /// against the local root.
    fn build_entries(
        &self,
        root_dir: &Utf8Path,
        mode: &str,
        path_prefix: &str,
    ) -> Result<Vec<DatasetEntry>, ResolvError>;
}

impl<T: DatasetDescriptor + ?Sized> DatasetDescriptor for Box<T> {
    fn info(&self) -> DatasetInfo {
        (**self).info()
    }

    fn version(&self) -> &str {
        (**self).version()
    }

    fn remote_sources(&self) -> BTreeMap<String, Vec<RemoteSource>> {
        (**self).remote_sources()
    }

    fn build_entries(
        &self,
        root_dir: &Utf8Path,
        mode: &str,
        path_prefix: &str,
    ) -> Result<Vec<DatasetEntry>, ResolvError> {
        (**self).build_entries(root_dir, mode, path_prefix)
    }
}

/// A descriptor bound to one validated mode, not yet acquired.
#[derive(Debug, Clone)]
pub struct Dataset<D: DatasetDescriptor> {
    descriptor: D,
    mode: String,
}

impl<D: DatasetDescriptor> Dataset<D> {
    pub fn new(descriptor: D, mode: &str) -> Result<Self, ResolvError> {
        let sources = descriptor.remote_sources();
        if !sources.contains_key(mode) {
            return Err(ResolvError::InvalidMode {
                dataset: descriptor.info().name,
                mode: mode.to_string(),
                valid: sources.keys().cloned().collect(),
            });
        }
        Ok(Self {
            descriptor,
            mode: mode.to_string(),
        })
    }

    pub fn descriptor(&self) -> &D {
        &self.descriptor
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn mode_sources(&self) -> Vec<RemoteSource> {
        self.descriptor
            .remote_sources()
            .remove(&self.mode)
            .unwrap_or_default()
    }

    pub fn root_dir_name(&self) -> String {
        let name = self.descriptor.info().name.replace(' ', "_").to_lowercase();
        format!("{name}-v{}-{}", self.descriptor.version(), self.mode)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[derive(Debug)]
    struct Sample;

    impl DatasetDescriptor for Sample {
        fn info(&self) -> DatasetInfo {
            DatasetInfo {
                name: "Sample Set".to_string(),
                version: "1.0.0".to_string(),
                description: String::new(),
                homepage: String::new(),
                license_info: String::new(),
                citation: String::new(),
            }
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn remote_sources(&self) -> BTreeMap<String, Vec<RemoteSource>> {
            BTreeMap::from([(
                "full".to_string(),
                vec![RemoteSource::main_archive(
                    "sample.zip",
                    "https://example.com/sample.zip",
                    "00",
                )],
            )])
        }

        fn build_entries(
            &self,
            _root_dir: &Utf8Path,
            _mode: &str,
            _path_prefix: &str,
        ) -> Result<Vec<DatasetEntry>, ResolvError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn mode_is_validated_at_construction() {
        assert!(Dataset::new(Sample, "full").is_ok());
        let err = Dataset::new(Sample, "matched").unwrap_err();
        assert_matches!(err, ResolvError::InvalidMode { mode, .. } if mode == "matched");
    }

    #[test]
    fn root_dir_name_normalizes_name() {
        let dataset = Dataset::new(Sample, "full").unwrap();
        assert_eq!(dataset.root_dir_name(), "sample_set-v1.0.0-full");
    }

    #[test]
    fn boxed_descriptors_satisfy_the_contract() {
        let boxed: Box<dyn DatasetDescriptor> = Box::new(Sample);
        let dataset = Dataset::new(boxed, "full").unwrap();
        assert_eq!(dataset.mode_sources().len(), 1);
    }
}
