use std::collections::BTreeMap;
use std::fs;

use camino::Utf8Path;
use serde_json::json;

use crate::checksum::ChecksumAlgorithm;
use crate::dataset::{DatasetDescriptor, DatasetInfo, RemoteSource};
use crate::error::ResolvError;
use crate::fs_util;
use crate::index::{DatasetEntry, EntryFile};

const NAME: &str = "Lakh MIDI";

const VERSION: &str = "1.0.0";

const DESCRIPTION: &str = "The Lakh MIDI dataset is a collection of 176,581 unique MIDI \
files, 45,129 of which have been matched and aligned to entries in the Million Song \
Dataset. Its goal is to facilitate large-scale music information retrieval, both symbolic \
(using the MIDI files alone) and audio content-based (using information extracted from the \
MIDI files as annotations for the matched audio files).";

const HOMEPAGE: &str = "https://colinraffel.com/projects/lmd/";

const LICENSE_INFO: &str = "Creative Commons Attribution 4.0 International License (CC-By 4.0)";

const CITATION: &str = "@phdthesis{raffel2016learning,
  author={Colin Raffel},
  title={Learning-Based Methods for Comparing Sequences, with Applications to Audio-to-{MIDI} Alignment and Matching},
  year=2016
}";

const BASE_URL: &str = "http://hog.ee.columbia.edu/craffel/lmd";

#[derive(Debug, Clone, Copy, Default)]
pub struct LakhMidiDataset;

impl LakhMidiDataset {
    fn midi_filenames(&self, root_dir: &Utf8Path) -> Result<MidiFilenames, ResolvError> {
        read_json(&root_dir.join("md5_to_paths.json"))
    }

    fn match_scores(&self, root_dir: &Utf8Path) -> Result<MatchScores, ResolvError> {
        read_json(&root_dir.join("match_scores.json"))
    }

    fn build_full_entries(
        &self,
        root_dir: &Utf8Path,
        path_prefix: &str,
    ) -> Result<Vec<DatasetEntry>, ResolvError> {
        let midi_filenames = self.midi_filenames(root_dir)?;
        fs_util::walk_files(root_dir, &[".mid"])?
            .iter()
            .map(|file| {
                let md5 = file.file_stem().unwrap_or(file.as_str());
                let id = midi_filenames
                    .get(md5)
                    .and_then(|paths| paths.first())
                    .ok_or_else(|| {
                        ResolvError::Metadata(format!("no known path for MIDI file {md5}"))
                    })?;
                let entry_file =
                    EntryFile::for_file(root_dir, file, path_prefix, ChecksumAlgorithm::Md5)?;
                Ok(DatasetEntry::new(id).with_file("midi", entry_file))
            })
            .collect()
    }

    fn build_clean_entries(
        &self,
        root_dir: &Utf8Path,
        path_prefix: &str,
    ) -> Result<Vec<DatasetEntry>, ResolvError> {
        fs_util::walk_files(root_dir, &[".mid"])?
            .iter()
            .map(|file| {
                let composer = parent_name(file)?;
                let title = file.file_name().unwrap_or(file.as_str());
                let id = format!("{}/{}", normalize(composer), normalize(title));
                let entry_file =
                    EntryFile::for_file(root_dir, file, path_prefix, ChecksumAlgorithm::Md5)?;
                Ok(DatasetEntry::new(&id)
                    .with_metadata(json!({ "composer": composer, "title": title }))
                    .with_file("midi", entry_file))
            })
            .collect()
    }

    fn build_matched_entries(
        &self,
        root_dir: &Utf8Path,
        path_prefix: &str,
    ) -> Result<Vec<DatasetEntry>, ResolvError> {
        let match_scores = self.match_scores(root_dir)?;
        fs_util::walk_files(root_dir, &[".mid"])?
            .iter()
            .map(|file| {
                let msd_id = parent_name(file)?;
                let md5 = file.file_stem().unwrap_or(file.as_str());
                let score = match_scores
                    .get(msd_id)
                    .and_then(|scores| scores.get(md5))
                    .ok_or_else(|| {
                        ResolvError::Metadata(format!("no match score for {msd_id}/{md5}"))
                    })?;
                let entry_file =
                    EntryFile::for_file(root_dir, file, path_prefix, ChecksumAlgorithm::Md5)?
                        .with_attributes(json!({ "match_score": score }));
                // One MSD track can match several MIDI files, so the id is
                // the MSD id composed with the file's md5 stem.
                Ok(DatasetEntry::new(&format!("{msd_id}/{md5}")).with_file("midi", entry_file))
            })
            .collect()
    }
}

impl DatasetDescriptor for LakhMidiDataset {
    fn info(&self) -> DatasetInfo {
        DatasetInfo {
            name: NAME.to_string(),
            version: VERSION.to_string(),
            description: DESCRIPTION.to_string(),
            homepage: HOMEPAGE.to_string(),
            license_info: LICENSE_INFO.to_string(),
            citation: CITATION.to_string(),
        }
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn remote_sources(&self) -> BTreeMap<String, Vec<RemoteSource>> {
        let matched_archive = RemoteSource {
            has_archived_root: true,
            ..RemoteSource::main_archive(
                "lmd_matched.tar.gz",
                &format!("{BASE_URL}/lmd_matched.tar.gz"),
                "621ff830aed771f469e5bfa13dc12a33c6ed69090adeda63d0b5c47783af0191",
            )
        };
        let match_scores = RemoteSource::new(
            "match_scores.json",
            &format!("{BASE_URL}/match_scores.json"),
            "267bc606dfa21f0ad0601a4a080972cd4ae8088fe4003b9bb2811b5be060a102",
        );
        BTreeMap::from([
            (
                "full".to_string(),
                vec![
                    RemoteSource {
                        has_archived_root: true,
                        ..RemoteSource::main_archive(
                            "lmd_full.tar.gz",
                            &format!("{BASE_URL}/lmd_full.tar.gz"),
                            "6fcfe2ac49ca08f3f214cec86ab138d4fc4dabcd7f27f491a838dae6db45a12b",
                        )
                    },
                    RemoteSource::new(
                        "md5_to_paths.json",
                        &format!("{BASE_URL}/md5_to_paths.json"),
                        "9002b7723f3edeca779e91688802fdd283b8df0c278162a4040f95bde5895805",
                    ),
                ],
            ),
            (
                "matched".to_string(),
                vec![matched_archive.clone(), match_scores.clone()],
            ),
            (
                "matched_with_msd_metadata".to_string(),
                vec![
                    matched_archive,
                    match_scores.clone(),
                    RemoteSource {
                        is_archive: true,
                        has_archived_root: true,
                        ..RemoteSource::new(
                            "msd_h5_metadata.tar.gz",
                            &format!("{BASE_URL}/lmd_matched_h5.tar.gz"),
                            "049c62c0d90c7fd2a29352a1c745d12fb53019dcf2e74a3b29953f046aef3d1b",
                        )
                    },
                ],
            ),
            (
                "aligned".to_string(),
                vec![
                    RemoteSource {
                        has_archived_root: true,
                        ..RemoteSource::main_archive(
                            "lmd_aligned.tar.gz",
                            &format!("{BASE_URL}/lmd_aligned.tar.gz"),
                            "2bf5400e82eba73204644946515489b68811e1e656b0cfd854efc14377f6e53b",
                        )
                    },
                    match_scores,
                ],
            ),
            (
                "clean".to_string(),
                vec![RemoteSource {
                    has_archived_root: true,
                    ..RemoteSource::main_archive(
                        "lmd_clean_midi.tar.gz",
                        &format!("{BASE_URL}/clean_midi.tar.gz"),
                        "de1bb64cbc0cf35545a05b5c3e786aa6890cfa144edffc4b827ff41bf8c33dc5",
                    )
                }],
            ),
        ])
    }

    fn build_entries(
        &self,
        root_dir: &Utf8Path,
        mode: &str,
        path_prefix: &str,
    ) -> Result<Vec<DatasetEntry>, ResolvError> {
        match mode {
            "full" => self.build_full_entries(root_dir, path_prefix),
            "clean" => self.build_clean_entries(root_dir, path_prefix),
            _ => self.build_matched_entries(root_dir, path_prefix),
        }
    }
}

type MidiFilenames = BTreeMap<String, Vec<String>>;
type MatchScores = BTreeMap<String, BTreeMap<String, f64>>;

fn read_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T, ResolvError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| ResolvError::Metadata(format!("read {path}: {err}")))?;
    serde_json::from_str(&content).map_err(|err| ResolvError::Metadata(err.to_string()))
}

fn parent_name(file: &Utf8Path) -> Result<&str, ResolvError> {
    file.parent()
        .and_then(|parent| parent.file_name())
        .ok_or_else(|| ResolvError::Metadata(format!("{file} has no parent directory")))
}

fn normalize(value: &str) -> String {
    value.replace(' ', "_").to_lowercase()
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn every_mode_declares_exactly_one_main_source() {
        for (mode, sources) in LakhMidiDataset.remote_sources() {
            let mains = sources.iter().filter(|source| source.is_main).count();
            assert_eq!(mains, 1, "mode {mode}");
        }
    }

    #[test]
    fn clean_mode_ids_are_normalized_composer_and_title() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("Frank Sinatra").as_std_path()).unwrap();
        fs::write(
            root.join("Frank Sinatra/Fly Me To The Moon.mid").as_std_path(),
            b"midi",
        )
        .unwrap();

        let entries = LakhMidiDataset
            .build_entries(&root, "clean", "data/lakh")
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "frank_sinatra/fly_me_to_the_moon.mid");
        assert_eq!(
            entries[0].metadata.as_ref().unwrap()["composer"],
            "Frank Sinatra"
        );
        assert_eq!(
            entries[0].files["midi"].path,
            "data/lakh/Frank Sinatra/Fly Me To The Moon.mid"
        );
    }

    #[test]
    fn matched_mode_attaches_match_scores() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("A/B/C/TRABCD12345678").as_std_path()).unwrap();
        fs::write(
            root.join("A/B/C/TRABCD12345678/0a1b2c.mid").as_std_path(),
            b"midi",
        )
        .unwrap();
        fs::write(
            root.join("match_scores.json").as_std_path(),
            br#"{"TRABCD12345678": {"0a1b2c": 0.72}}"#,
        )
        .unwrap();

        let entries = LakhMidiDataset
            .build_entries(&root, "matched", "data/lakh")
            .unwrap();

        assert_eq!(entries[0].id, "TRABCD12345678/0a1b2c");
        assert_eq!(
            entries[0].files["midi"].attributes.as_ref().unwrap()["match_score"],
            0.72
        );
    }

    #[test]
    fn full_mode_resolves_ids_through_the_path_listing() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("0").as_std_path()).unwrap();
        fs::write(root.join("0/0a1b2c.mid").as_std_path(), b"midi").unwrap();
        fs::write(
            root.join("md5_to_paths.json").as_std_path(),
            br#"{"0a1b2c": ["some/original/path.mid"]}"#,
        )
        .unwrap();

        let entries = LakhMidiDataset
            .build_entries(&root, "full", "data/lakh")
            .unwrap();
        assert_eq!(entries[0].id, "some/original/path.mid");
    }
}
