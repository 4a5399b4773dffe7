use std::collections::HashSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::archive::{self, ExtractOptions};
use crate::dataset::{Dataset, DatasetDescriptor, RemoteSource};
use crate::error::ResolvError;
use crate::fetch::{FetchRequest, SourceFetcher};
use crate::index::DatasetIndex;

#[derive(Debug, Clone)]
pub struct AcquireOptions {
    pub output_path: Option<Utf8PathBuf>,
    pub ephemeral_root: bool,
    pub overwrite: bool,
    pub cleanup_archives: bool,
    pub allow_invalid_checksum: bool,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            output_path: None,
            ephemeral_root: false,
            overwrite: false,
            cleanup_archives: true,
            allow_invalid_checksum: false,
        }
    }
}

/// A dataset whose root directory has been established on disk.
#[derive(Debug, Clone)]
pub struct AcquiredDataset<D: DatasetDescriptor> {
    dataset: Dataset<D>,
    root_dir: Utf8PathBuf,
}

pub fn default_datasets_root() -> Result<Utf8PathBuf, ResolvError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join(".resolv").join("datasets")).ok()
        })
        .ok_or_else(|| ResolvError::Filesystem("unable to resolve datasets directory".to_string()))
}

impl<D: DatasetDescriptor> Dataset<D> {
    /// Fetches every declared source for the bound mode, normalizes the
    /// on-disk layout and returns a handle to the established root.
    pub fn acquire<F: SourceFetcher>(
        self,
        fetcher: &F,
        options: &AcquireOptions,
    ) -> Result<AcquiredDataset<D>, ResolvError> {
        let sources = self.mode_sources();
        let main_count = sources.iter().filter(|source| source.is_main).count();
        if main_count != 1 {
            return Err(ResolvError::InvalidSourceSet(main_count));
        }

        let base_output = if options.ephemeral_root {
            if let Some(path) = &options.output_path {
                tracing::warn!(
                    "the given output path {path} is ignored for an ephemeral acquisition"
                );
            }
            if options.overwrite {
                tracing::warn!("the overwrite flag is ignored for an ephemeral acquisition");
            }
            None
        } else {
            let base = match &options.output_path {
                Some(path) => path.clone(),
                None => default_datasets_root()?,
            };
            let root_dir_path = base.join(self.root_dir_name());
            if root_dir_path.as_std_path().is_dir() {
                if options.overwrite {
                    fs::remove_dir_all(root_dir_path.as_std_path())
                        .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
                } else {
                    tracing::warn!(
                        "dataset already has root directory {root_dir_path}; skipping download \
                         (acquire with overwrite to replace it)"
                    );
                    return Ok(AcquiredDataset {
                        dataset: self,
                        root_dir: root_dir_path,
                    });
                }
            }
            Some(base)
        };

        // Main source first, so auxiliary targets can resolve against the root.
        let mut sources = sources;
        sources.sort_by_key(|source| !source.is_main);

        let mut root_dir: Option<Utf8PathBuf> = None;
        for source in &sources {
            let resolved = self.process_source(
                source,
                fetcher,
                options,
                base_output.as_deref(),
                root_dir.as_deref(),
            )?;
            if source.is_main {
                let resolved = resolved.ok_or_else(|| {
                    ResolvError::Precondition(
                        "the main source did not establish a root directory".to_string(),
                    )
                })?;
                tracing::info!("setting dataset root directory to {resolved}");
                root_dir = Some(resolved);
            }
        }

        let root_dir = root_dir.ok_or_else(|| {
            ResolvError::Precondition("no main source established a root directory".to_string())
        })?;
        Ok(AcquiredDataset {
            dataset: self,
            root_dir,
        })
    }

    fn process_source<F: SourceFetcher>(
        &self,
        source: &RemoteSource,
        fetcher: &F,
        options: &AcquireOptions,
        base_output: Option<&Utf8Path>,
        root_dir: Option<&Utf8Path>,
    ) -> Result<Option<Utf8PathBuf>, ResolvError> {
        let target_path = if source.is_main {
            base_output.map(|base| base.join(&source.filename))
        } else {
            let root = root_dir.ok_or_else(|| {
                ResolvError::Precondition(format!(
                    "auxiliary source {} processed before a root directory was established",
                    source.filename
                ))
            })?;
            Some(root.join(&source.filename))
        };

        let request = FetchRequest {
            url: source.url.clone(),
            target_path,
            ephemeral: options.ephemeral_root && source.is_main,
            ephemeral_suffix: Some(source.filename.clone()),
            checksum: Some(source.checksum.clone()),
            checksum_algorithm: source.checksum_algorithm,
            force_overwrite: options.overwrite,
            allow_invalid_checksum: options.allow_invalid_checksum,
        };
        let fetched = fetcher.fetch(&request)?;

        if source.is_archive {
            let extraction_dir_name = if source.is_main {
                self.root_dir_name()
            } else {
                file_stem(&source.filename).to_string()
            };
            let output = parent_of(&fetched)?.join(extraction_dir_name);
            let extracted = archive::extract_archive(
                &fetched,
                Some(&output),
                &ExtractOptions {
                    kind: None,
                    flatten_root: source.has_archived_root,
                    cleanup_source: options.cleanup_archives,
                },
            )?;
            return Ok(Some(extracted));
        }

        if source.is_main {
            // A bare main file still gets a root directory wrapped around it.
            let root_path = parent_of(&fetched)?.join(self.root_dir_name());
            fs::create_dir_all(root_path.as_std_path())
                .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
            fs::rename(
                fetched.as_std_path(),
                root_path.join(&source.filename).as_std_path(),
            )
            .map_err(|err| ResolvError::Filesystem(err.to_string()))?;
            return Ok(Some(root_path));
        }

        Ok(None)
    }
}

impl<D: DatasetDescriptor> AcquiredDataset<D> {
    pub fn root_dir(&self) -> &Utf8Path {
        &self.root_dir
    }

    pub fn descriptor(&self) -> &D {
        self.dataset.descriptor()
    }

    pub fn mode(&self) -> &str {
        self.dataset.mode()
    }

    /// Builds the dataset index from the established root and persists it as
    /// `index.json` inside that root, replacing any prior one.
    pub fn compute_index(&self, path_prefix: Option<&str>) -> Result<DatasetIndex, ResolvError> {
        if !self.root_dir.as_std_path().is_dir() {
            return Err(ResolvError::Precondition(format!(
                "root directory {} does not exist; acquire the dataset first",
                self.root_dir
            )));
        }

        let default_prefix = self.root_dir.to_string();
        let prefix = path_prefix.unwrap_or(&default_prefix);
        let entries =
            self.dataset
                .descriptor()
                .build_entries(&self.root_dir, self.dataset.mode(), prefix)?;

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(ResolvError::DuplicateEntry(entry.id.clone()));
            }
        }

        let index = DatasetIndex {
            id: self.dataset.root_dir_name(),
            version: self.dataset.descriptor().version().to_string(),
            entries,
        };
        index.write_to(&self.root_dir)?;
        Ok(index)
    }
}

fn parent_of(path: &Utf8Path) -> Result<&Utf8Path, ResolvError> {
    path.parent()
        .ok_or_else(|| ResolvError::Filesystem(format!("path {path} has no parent directory")))
}

fn file_stem(filename: &str) -> &str {
    filename.split('.').next().unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_strips_every_extension() {
        assert_eq!(file_stem("msd_h5_metadata.tar.gz"), "msd_h5_metadata");
        assert_eq!(file_stem("match_scores.json"), "match_scores");
        assert_eq!(file_stem("plain"), "plain");
    }
}
