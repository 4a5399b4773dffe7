use std::collections::BTreeMap;

use camino::Utf8Path;

use crate::checksum::ChecksumAlgorithm;
use crate::dataset::{DatasetDescriptor, DatasetInfo, RemoteSource};
use crate::error::ResolvError;
use crate::fs_util;
use crate::index::{DatasetEntry, EntryFile};

const NAME: &str = "JSB Chorales";

const VERSION: &str = "1.0.0";

const DESCRIPTION: &str = "The JSB Chorales Dataset is a collection of 382 four-part chorales \
by Johann Sebastian Bach. This dataset is used in the paper \"Modeling Temporal Dependencies \
in High-Dimensional Sequences: Application to Polyphonic Music Generation and Transcription\" \
in ICML 2012. It comes with train, test and validation split used in the paper \"Harmonising \
Chorales by Probabilistic Inference\" in NIPS 2005.";

const HOMEPAGE: &str = "https://arxiv.org/pdf/2107.10388v4.pdf";

const CITATION: &str = "@inproceedings{boulangerlewandowski2012modeling,
  author={Nicolas Boulanger-Lewandowski and Yoshua Bengio and Pascal Vincent},
  title={Modeling Temporal Dependencies in High-Dimensional Sequences: Application to Polyphonic Music Generation and Transcription},
  booktitle={Proceedings of the 29th International Conference on Machine Learning (ICML)},
  year=2012
}";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsbChoralesDataset;

impl DatasetDescriptor for JsbChoralesDataset {
    fn info(&self) -> DatasetInfo {
        DatasetInfo {
            name: NAME.to_string(),
            version: VERSION.to_string(),
            description: DESCRIPTION.to_string(),
            homepage: HOMEPAGE.to_string(),
            license_info: String::new(),
            citation: CITATION.to_string(),
        }
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn remote_sources(&self) -> BTreeMap<String, Vec<RemoteSource>> {
        BTreeMap::from([(
            "full".to_string(),
            vec![RemoteSource {
                has_archived_root: true,
                ..RemoteSource::main_archive(
                    "jsb_chorales.zip",
                    "https://drive.google.com/uc?id=1ryA77ynWH1eiUTn7tNfuvhGWmo88B1Zf&export=download",
                    "6425acfc5a1191d11482ed50eb5f5edc0c9c24555a10cd3f81f6d54925c9d2a7",
                )
            }],
        )])
    }

    fn build_entries(
        &self,
        root_dir: &Utf8Path,
        _mode: &str,
        path_prefix: &str,
    ) -> Result<Vec<DatasetEntry>, ResolvError> {
        let musicxml_files = fs_util::walk_files(root_dir, &[".mxml", ".mxl"])?;
        musicxml_files
            .iter()
            .map(|file| {
                let id = file.file_stem().unwrap_or(file.as_str());
                let entry_file =
                    EntryFile::for_file(root_dir, file, path_prefix, ChecksumAlgorithm::Md5)?;
                Ok(DatasetEntry::new(id).with_file("mxml", entry_file))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn declares_one_main_source_for_the_full_mode() {
        let sources = JsbChoralesDataset.remote_sources();
        let full = &sources["full"];
        assert_eq!(full.iter().filter(|source| source.is_main).count(), 1);
        assert!(full[0].is_archive);
        assert!(full[0].has_archived_root);
    }

    #[test]
    fn entries_are_keyed_by_file_stem_with_prefixed_paths() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join("train").as_std_path()).unwrap();
        std::fs::write(root.join("train/chorale_001.mxml").as_std_path(), b"<score/>").unwrap();
        std::fs::write(root.join("chorale_002.mxl").as_std_path(), b"<score/>").unwrap();
        std::fs::write(root.join("readme.txt").as_std_path(), b"ignored").unwrap();

        let entries = JsbChoralesDataset
            .build_entries(&root, "full", "data/jsb_chorales")
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "chorale_002");
        assert_eq!(entries[1].id, "chorale_001");
        let file = &entries[1].files["mxml"];
        assert_eq!(file.path, "data/jsb_chorales/train/chorale_001.mxml");
        assert_eq!(file.checksum_algorithm, ChecksumAlgorithm::Md5);
    }
}
