use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use serde_json::json;

use crate::checksum::ChecksumAlgorithm;
use crate::dataset::{DatasetDescriptor, DatasetInfo, RemoteSource};
use crate::error::ResolvError;
use crate::index::{DatasetEntry, EntryFile};

const NAME: &str = "MAESTRO";

const DESCRIPTION: &str = "MAESTRO (MIDI and Audio Edited for Synchronous TRacks and \
Organization) is a dataset composed of over 200 hours of virtuosic piano performances \
captured with fine alignment (~3 ms) between note labels and audio waveforms.";

const HOMEPAGE: &str = "https://magenta.tensorflow.org/datasets/maestro";

const LICENSE_INFO: &str =
    "Creative Commons Attribution Non-Commercial Share-Alike 4.0 (CC BY-NC-SA 4.0).";

const CITATION: &str = "@inproceedings{hawthorne2018enabling,
  title={Enabling Factorized Piano Music Modeling and Generation with the {MAESTRO} Dataset},
  author={Curtis Hawthorne and Andriy Stasyuk and Adam Roberts and Ian Simon and Cheng-Zhi Anna Huang and Sander Dieleman and Erich Elsen and Jesse Engel and Douglas Eck},
  booktitle={Proceedings of the 7th International Conference on Learning Representations (ICLR)},
  year=2019,
  url={https://openreview.net/forum?id=r1lYRjC9F7}
}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaestroVersion {
    V1,
    V2,
    V3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaestroDataset {
    version: MaestroVersion,
}

impl MaestroDataset {
    pub fn v1() -> Self {
        Self {
            version: MaestroVersion::V1,
        }
    }

    pub fn v2() -> Self {
        Self {
            version: MaestroVersion::V2,
        }
    }

    pub fn v3() -> Self {
        Self {
            version: MaestroVersion::V3,
        }
    }

    fn metadata_path(&self, root_dir: &Utf8Path) -> Utf8PathBuf {
        root_dir.join(format!("maestro-v{}.json", self.version()))
    }

    fn read_metadata(&self, root_dir: &Utf8Path) -> Result<String, ResolvError> {
        let path = self.metadata_path(root_dir);
        fs::read_to_string(path.as_std_path())
            .map_err(|err| ResolvError::Metadata(format!("read {path}: {err}")))
    }

    fn build_entry(
        &self,
        root_dir: &Utf8Path,
        mode: &str,
        path_prefix: &str,
        row: &MaestroRow,
    ) -> Result<DatasetEntry, ResolvError> {
        let id = row
            .midi_filename
            .split('.')
            .next()
            .unwrap_or(&row.midi_filename);
        let midi_file = EntryFile::for_file(
            root_dir,
            &root_dir.join(&row.midi_filename),
            path_prefix,
            ChecksumAlgorithm::Md5,
        )?;
        let mut entry = DatasetEntry::new(id)
            .with_metadata(json!({
                "composer": row.canonical_composer,
                "title": row.canonical_title,
                "year": row.year,
                "duration": row.duration,
            }))
            .with_split(&row.split)
            .with_file("midi", midi_file);

        // Audio waveforms ship only with the full variant.
        if mode == "full" {
            let audio_filename = row.audio_filename.as_deref().ok_or_else(|| {
                ResolvError::Metadata(format!("track {id} has no audio filename"))
            })?;
            let audio_file = EntryFile::for_file(
                root_dir,
                &root_dir.join(audio_filename),
                path_prefix,
                ChecksumAlgorithm::Md5,
            )?;
            entry = entry.with_file("audio", audio_file);
        }
        Ok(entry)
    }
}

impl DatasetDescriptor for MaestroDataset {
    fn info(&self) -> DatasetInfo {
        DatasetInfo {
            name: NAME.to_string(),
            version: self.version().to_string(),
            description: DESCRIPTION.to_string(),
            homepage: HOMEPAGE.to_string(),
            license_info: LICENSE_INFO.to_string(),
            citation: CITATION.to_string(),
        }
    }

    fn version(&self) -> &str {
        match self.version {
            MaestroVersion::V1 => "1.0.0",
            MaestroVersion::V2 => "2.0.0",
            MaestroVersion::V3 => "3.0.0",
        }
    }

    fn remote_sources(&self) -> BTreeMap<String, Vec<RemoteSource>> {
        let (full_checksum, midi_checksum) = match self.version {
            MaestroVersion::V1 => (
                "97471232457147d5bffa72db8c4897166ba52afd4a64197004b806c2ec85ad27",
                "f620f9e1eceaab8beea10617599add2e9c83234199b550382a2f603098ae7135",
            ),
            MaestroVersion::V2 => (
                "572c6054e8d2c7219aa4df9a29357da0f9789524c11fa38cef7d4bd8542c93f0",
                "ec2cc9d94886c6b376db1eaa2b8ad1ce62ff9f0a28b3744782b13163295dadf3",
            ),
            MaestroVersion::V3 => (
                "6680fea5be2339ea15091a249fbd70e49551246ddbd5ca50f1b2352c08c95291",
                "70470ee253295c8d2c71e6d9d4a815189e35c89624b76d22fce5a019d5dde12c",
            ),
        };
        let version = self.version();
        let base_url = format!(
            "https://storage.googleapis.com/magentadata/datasets/maestro/v{version}"
        );
        let archive = |filename: &str, checksum: &str| RemoteSource {
            has_archived_root: true,
            ..RemoteSource::main_archive(
                filename,
                &format!("{base_url}/{filename}"),
                checksum,
            )
        };
        BTreeMap::from([
            (
                "full".to_string(),
                vec![archive(&format!("maestro-v{version}.zip"), full_checksum)],
            ),
            (
                "midi".to_string(),
                vec![archive(&format!("maestro-v{version}-midi.zip"), midi_checksum)],
            ),
        ])
    }

    fn build_entries(
        &self,
        root_dir: &Utf8Path,
        mode: &str,
        path_prefix: &str,
    ) -> Result<Vec<DatasetEntry>, ResolvError> {
        let content = self.read_metadata(root_dir)?;
        let rows = match self.version {
            // v1/v2 metadata is row-oriented, v3 is column-oriented.
            MaestroVersion::V1 | MaestroVersion::V2 => {
                serde_json::from_str::<Vec<MaestroRow>>(&content)
                    .map_err(|err| ResolvError::Metadata(err.to_string()))?
            }
            MaestroVersion::V3 => {
                let columns = serde_json::from_str::<MaestroColumns>(&content)
                    .map_err(|err| ResolvError::Metadata(err.to_string()))?;
                columns.into_rows()?
            }
        };
        rows.iter()
            .map(|row| self.build_entry(root_dir, mode, path_prefix, row))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct MaestroRow {
    canonical_composer: String,
    canonical_title: String,
    split: String,
    year: i64,
    duration: f64,
    midi_filename: String,
    #[serde(default)]
    audio_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MaestroColumns {
    canonical_composer: BTreeMap<String, String>,
    canonical_title: BTreeMap<String, String>,
    split: BTreeMap<String, String>,
    year: BTreeMap<String, i64>,
    duration: BTreeMap<String, f64>,
    midi_filename: BTreeMap<String, String>,
    #[serde(default)]
    audio_filename: BTreeMap<String, String>,
}

impl MaestroColumns {
    fn into_rows(self) -> Result<Vec<MaestroRow>, ResolvError> {
        let mut rows = Vec::with_capacity(self.midi_filename.len());
        for index in 0..self.midi_filename.len() {
            let key = index.to_string();
            let column = |name: &str, values: &BTreeMap<String, String>| {
                values.get(&key).cloned().ok_or_else(|| {
                    ResolvError::Metadata(format!("column {name} has no value for track {key}"))
                })
            };
            rows.push(MaestroRow {
                canonical_composer: column("canonical_composer", &self.canonical_composer)?,
                canonical_title: column("canonical_title", &self.canonical_title)?,
                split: column("split", &self.split)?,
                year: *self.year.get(&key).ok_or_else(|| {
                    ResolvError::Metadata(format!("column year has no value for track {key}"))
                })?,
                duration: *self.duration.get(&key).ok_or_else(|| {
                    ResolvError::Metadata(format!("column duration has no value for track {key}"))
                })?,
                midi_filename: column("midi_filename", &self.midi_filename)?,
                audio_filename: self.audio_filename.get(&key).cloned(),
            });
        }
        Ok(rows)
    }
}
