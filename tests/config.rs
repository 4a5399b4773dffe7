use assert_matches::assert_matches;

use resolv_data::config::{Config, ConfigLoader, DatasetEntry, DatasetEntryObject, ImportRequest};
use resolv_data::error::ResolvError;

#[test]
fn parse_config_shorthand() {
    let config = Config {
        schema_version: None,
        datasets: vec![
            DatasetEntry::Shorthand("jsb-chorales-v1".to_string()),
            DatasetEntry::Shorthand("maestro-v2:midi".to_string()),
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
                name: "maestro-v2".to_string(),
                mode: "midi".to_string(),
            },
        ]
    );
}

#[test]
fn parse_config_detailed_defaults_to_full_mode() {
    let config = Config {
        schema_version: Some(1),
        datasets: vec![DatasetEntry::Detailed(DatasetEntryObject {
            name: "lakh-midi-v1".to_string(),
            mode: None,
        })],
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.datasets[0].mode, "full");
}

#[test]
fn config_validation_fails_fast_on_invalid_modes() {
    let config = Config {
        schema_version: None,
        datasets: vec![DatasetEntry::Shorthand("maestro-v1:matched".to_string())],
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, ResolvError::InvalidMode { mode, .. } if mode == "matched");
}
