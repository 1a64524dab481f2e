use std::{env, error::Error, path::PathBuf};

use log::debug;

use crate::{config::ResdepConfig, Resdep};

const DEFAULT_CATALOG_PATH: &str = "doc/resource_dependencies.yaml";

#[derive(Default)]
pub struct ResdepBuilder {
    // All other paths are relative to `root`
    root: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    max_visits: Option<usize>,
}

impl ResdepBuilder {
    /// Project root directory.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Resource catalog file.
    ///
    /// Defaults to `RESDEP_CATALOG_PATH`, then `doc/resource_dependencies.yaml`.
    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Visit allowance of every traversal.
    ///
    /// Defaults to `RESDEP_LIMITS_VISITS`, then a value derived from the catalog size.
    pub fn max_visits(mut self, max_visits: usize) -> Self {
        self.max_visits = Some(max_visits);
        self
    }

    pub fn try_build(self) -> Result<Resdep, Box<dyn Error>> {
        let Self {
            root,
            catalog_path,
            max_visits,
        } = self;
        let config = ResdepConfig::load()?;

        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let catalog_path = root.join(
            catalog_path
                .or(config.catalog_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
        );
        debug!("Using resource catalog {}", catalog_path.display());

        Ok(Resdep {
            root,
            catalog_path,
            max_visits: max_visits.or(config.max_visits),
        })
    }
}
