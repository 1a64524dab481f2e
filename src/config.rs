use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Settings read from `RESDEP_*` environment variables.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResdepConfig {
    pub catalog_path: Option<PathBuf>,
    pub max_visits: Option<usize>,
}

impl ResdepConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;

        Ok(Self {
            catalog_path: raw_config.catalog.path,
            max_visits: raw_config.limits.visits,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    catalog: CatalogConfig,
    #[serde(default)]
    limits: LimitsConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct CatalogConfig {
    path: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct LimitsConfig {
    visits: Option<usize>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("RESDEP")
                    .separator("_")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_empty() {
        let env = HashMap::from([]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                catalog: CatalogConfig { path: None },
                limits: LimitsConfig { visits: None }
            }
        )
    }

    #[test]
    fn load_environment() {
        let env = HashMap::from([
            (
                "RESDEP_CATALOG_PATH".to_owned(),
                "/etc/resources.yaml".to_owned(),
            ),
            ("RESDEP_LIMITS_VISITS".to_owned(), "100000".to_owned()),
        ]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                catalog: CatalogConfig {
                    path: Some("/etc/resources.yaml".into())
                },
                limits: LimitsConfig {
                    visits: Some(100000)
                }
            }
        )
    }

    #[test]
    fn reject_malformed_visits() {
        let env = HashMap::from([("RESDEP_LIMITS_VISITS".to_owned(), "many".to_owned())]);
        assert!(RawConfig::load(Some(env)).is_err());
    }
}
