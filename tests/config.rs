use assert_matches::assert_matches;

use offline_dict::config::{Config, ConfigLoader, resolve_dataset_url};
use offline_dict::error::DictError;

#[test]
fn parse_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("offline-dict.json");
    std::fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "base_url": "https://dict.example.org/static/",
            "data_dir": "/var/lib/offline-dict",
            "timeout_secs": 120
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(
        resolved.dataset_url.as_str(),
        "https://dict.example.org/static/wordnetFull.db"
    );
    assert_eq!(resolved.data_dir.as_str(), "/var/lib/offline-dict");
    assert_eq!(resolved.timeout, Some(std::time::Duration::from_secs(120)));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/offline-dict.json")).unwrap_err();
    assert_matches!(err, DictError::ConfigRead(_));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("offline-dict.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, DictError::ConfigParse(_));
}

#[test]
fn unknown_schema_version_is_rejected() {
    let config = Config {
        schema_version: Some(2),
        data_dir: Some("/tmp/offline-dict".to_string()),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, DictError::ConfigParse(_));
}

#[test]
fn dataset_path_is_relative_to_base() {
    let url = resolve_dataset_url("https://example.org/app/index.html", "wordnetFull.db").unwrap();
    assert_eq!(url.as_str(), "https://example.org/app/wordnetFull.db");

    let err = resolve_dataset_url("not a url", "wordnetFull.db").unwrap_err();
    assert_matches!(err, DictError::InvalidUrl(_));
}
