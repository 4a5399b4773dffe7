use camino::Utf8PathBuf;

use crate::acquire::AcquireOptions;
use crate::dataset::{Dataset, DatasetDescriptor};
use crate::datasets::{JsbChoralesDataset, LakhMidiDataset, MaestroDataset};
use crate::error::ResolvError;
use crate::fetch::SourceFetcher;
use crate::index::DatasetIndex;

pub const DATASET_NAMES: &[&str] = &[
    "jsb-chorales-v1",
    "lakh-midi-v1",
    "maestro-v1",
    "maestro-v2",
    "maestro-v3",
];

pub fn lookup(name: &str) -> Result<Box<dyn DatasetDescriptor + Send + Sync>, ResolvError> {
    match name {
        "jsb-chorales-v1" => Ok(Box::new(JsbChoralesDataset)),
        "lakh-midi-v1" => Ok(Box::new(LakhMidiDataset)),
        "maestro-v1" => Ok(Box::new(MaestroDataset::v1())),
        "maestro-v2" => Ok(Box::new(MaestroDataset::v2())),
        "maestro-v3" => Ok(Box::new(MaestroDataset::v3())),
        other => Err(ResolvError::DatasetNotFound(other.to_string())),
    }
}

pub fn root_dir_name(name: &str, mode: &str) -> Result<String, ResolvError> {
    let dataset = Dataset::new(lookup(name)?, mode)?;
    Ok(dataset.root_dir_name())
}

/// Acquires a registered dataset and indexes it in one step, returning the
/// established root directory together with the computed index.
pub fn import_dataset<F: SourceFetcher>(
    name: &str,
    mode: &str,
    fetcher: &F,
    options: &AcquireOptions,
    index_path_prefix: Option<&str>,
) -> Result<(Utf8PathBuf, DatasetIndex), ResolvError> {
    let dataset = Dataset::new(lookup(name)?, mode)?;
    let acquired = dataset.acquire(fetcher, options)?;
    let index = acquired.compute_index(index_path_prefix)?;
    Ok((acquired.root_dir().to_path_buf(), index))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn every_registered_name_resolves() {
        for name in DATASET_NAMES {
            assert!(lookup(name).is_ok(), "dataset {name}");
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = lookup("nsynth-v1").unwrap_err();
        assert_matches!(err, ResolvError::DatasetNotFound(_));
    }

    #[test]
    fn root_dir_names_are_deterministic() {
        assert_eq!(
            root_dir_name("jsb-chorales-v1", "full").unwrap(),
            "jsb_chorales-v1.0.0-full"
        );
        assert_eq!(
            root_dir_name("maestro-v3", "midi").unwrap(),
            "maestro-v3.0.0-midi"
        );
    }

    #[test]
    fn every_mode_of_every_dataset_declares_one_main_source() {
        for name in DATASET_NAMES {
            let descriptor = lookup(name).unwrap();
            for (mode, sources) in descriptor.remote_sources() {
                let mains = sources.iter().filter(|source| source.is_main).count();
                assert_eq!(mains, 1, "dataset {name} mode {mode}");
            }
        }
    }
}
