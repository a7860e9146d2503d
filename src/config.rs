use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CanonError;
use crate::expected::{
    EXPECTED_DATASETS_AGUA, EXPECTED_DATASETS_AIRE, ExpectedCatalog, owned_titles,
};

pub const DEFAULT_CONFIG_FILE: &str = "csv-canon.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub default_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub expected: ExpectedLists,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ExpectedLists {
    #[serde(default)]
    pub aire: Option<Vec<String>>,
    #[serde(default)]
    pub agua: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub default_dir: Option<Utf8PathBuf>,
    pub catalog: ExpectedCatalog,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `csv-canon.json` from the working directory when it
    /// exists. Without either, the built-in lists are used.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CanonError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            debug!("no config file, using built-in dataset lists");
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CanonError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CanonError::ConfigParse(err.to_string()))?;

        debug!(path = %config_path.display(), "loaded config");
        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let schema_version = config.schema_version.unwrap_or(1);
        let aire = config
            .expected
            .aire
            .unwrap_or_else(|| owned_titles(EXPECTED_DATASETS_AIRE));
        let agua = config
            .expected
            .agua
            .unwrap_or_else(|| owned_titles(EXPECTED_DATASETS_AGUA));

        ResolvedConfig {
            schema_version,
            default_dir: config.default_dir,
            catalog: ExpectedCatalog::new(aire, agua),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expected::Scope;

    #[test]
    fn empty_config_uses_built_in_lists() {
        let resolved = ConfigLoader::resolve_config(Config::default());
        assert_eq!(resolved.schema_version, 1);
        assert!(resolved.default_dir.is_none());
        assert_eq!(resolved.catalog, ExpectedCatalog::default());
    }

    #[test]
    fn partial_lists_fall_back_per_scope() {
        let config: Config = serde_json::from_str(
            r#"{ "schema_version": 2, "expected": { "aire": ["Temperatura media"] } }"#,
        )
        .unwrap();

        let resolved = ConfigLoader::resolve_config(config);
        assert_eq!(resolved.schema_version, 2);
        assert_eq!(resolved.catalog.datasets(Scope::Aire), ["Temperatura media"]);
        assert_eq!(
            resolved.catalog.datasets(Scope::Agua).len(),
            EXPECTED_DATASETS_AGUA.len()
        );
    }
}
