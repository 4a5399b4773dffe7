use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::ResolvError;
use crate::registry;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DatasetEntry {
    Shorthand(String),
    Detailed(DatasetEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DatasetEntryObject {
    pub name: String,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub name: String,
    pub mode: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub datasets: Vec<ImportRequest>,
}

pub const DEFAULT_MODE: &str = "full";

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ResolvError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("resolv-data.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(ResolvError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ResolvError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ResolvError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ResolvError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let datasets = config
            .datasets
            .into_iter()
            .map(|entry| {
                let request = match entry {
                    DatasetEntry::Shorthand(value) => parse_shorthand(&value),
                    DatasetEntry::Detailed(obj) => ImportRequest {
                        name: obj.name,
                        mode: obj.mode.unwrap_or_else(|| DEFAULT_MODE.to_string()),
                    },
                };
                // Fail fast on unknown names and invalid modes.
                Dataset::new(registry::lookup(&request.name)?, &request.mode)?;
                Ok(request)
            })
            .collect::<Result<Vec<_>, ResolvError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            datasets,
        })
    }
}

fn parse_shorthand(value: &str) -> ImportRequest {
    match value.split_once(':') {
        Some((name, mode)) => ImportRequest {
            name: name.trim().to_string(),
            mode: mode.trim().to_string(),
        },
        None => ImportRequest {
            name: value.trim().to_string(),
            mode: DEFAULT_MODE.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_config_shorthand() {
        let config = Config {
            schema_version: None,
            datasets: vec![
                DatasetEntry::Shorthand("jsb-chorales-v1".to_string()),
                DatasetEntry::Shorthand("lakh-midi-v1:clean".to_string()),
            ],
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(
            resolved.datasets,
            vec![
                ImportRequest {
                    name: "jsb-chorales-v1".to_string(),
                    mode: "full".to_string(),
                },
                ImportRequest {
                    name: "lakh-midi-v1".to_string(),
                    mode: "clean".to_string(),
                },
            ]
        );
    }

    #[test]
    fn parse_config_detailed() {
        let config = Config {
            schema_version: Some(1),
            datasets: vec![DatasetEntry::Detailed(DatasetEntryObject {
                name: "maestro-v3".to_string(),
                mode: Some("midi".to_string()),
            })],
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.datasets[0].mode, "midi");
    }

    #[test]
    fn unknown_dataset_fails_resolution() {
        let config = Config {
            schema_version: None,
            datasets: vec![DatasetEntry::Shorthand("nsynth-v1:full".to_string())],
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, ResolvError::DatasetNotFound(_));
    }

    #[test]
    fn invalid_mode_fails_resolution() {
        let config = Config {
            schema_version: None,
            datasets: vec![DatasetEntry::Shorthand("jsb-chorales-v1:matched".to_string())],
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, ResolvError::InvalidMode { .. });
    }
}
