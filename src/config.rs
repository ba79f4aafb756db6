use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::DictError;
use crate::store::default_data_dir;

pub const CONFIG_FILE: &str = "offline-dict.json";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/";
pub const DEFAULT_DATASET_PATH: &str = "wordnetFull.db";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub dataset_path: Option<String>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub dataset_url: Url,
    pub data_dir: Utf8PathBuf,
    pub timeout: Option<Duration>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `offline-dict.json` in the current directory when no
    /// path is given. Only an explicitly named file is required to exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, DictError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DictError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| DictError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, DictError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(DictError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let dataset_path = config.dataset_path.as_deref().unwrap_or(DEFAULT_DATASET_PATH);
        let dataset_url = resolve_dataset_url(base_url, dataset_path)?;

        let data_dir = match config.data_dir {
            Some(dir) => Utf8PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(ResolvedConfig {
            schema_version,
            dataset_url,
            data_dir,
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Joins the dataset's relative path onto the base URL.
pub fn resolve_dataset_url(base_url: &str, dataset_path: &str) -> Result<Url, DictError> {
    let base =
        Url::parse(base_url).map_err(|err| DictError::InvalidUrl(format!("{base_url}: {err}")))?;
    base.join(dataset_path)
        .map_err(|err| DictError::InvalidUrl(format!("{dataset_path}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_relative_dataset() {
        let config = Config {
            data_dir: Some("/tmp/offline-dict".to_string()),
            ..Config::default()
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(
            resolved.dataset_url.as_str(),
            "http://127.0.0.1:8080/wordnetFull.db"
        );
        assert_eq!(resolved.timeout, None);
    }
}
