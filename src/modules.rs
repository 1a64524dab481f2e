//! Terraform module names of a project, grouped the way the FQRN generator expects.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use regex_lite::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

const MODULE_PATTERN: &str = r#"module\s+"([^"]+)""#;
const SHARED_PREFIX: &str = "infra_";
const SKIPPED_PREFIXES: [&str; 2] = ["infra_", "terraform_"];
const VAR_NAME_SUFFIX: &str = "_fqrns";

#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid module pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
    #[error("Could not serialize module index: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A module declared in an `infra_*.tf` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedModule {
    pub name: String,
    /// Variable carrying the module's FQRNs, `<name>_fqrns`.
    pub var_name: String,
    pub for_each: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppModule {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleIndex {
    pub shared_modules: Vec<SharedModule>,
    /// Application prefix to its modules, in the order of the first file of each prefix.
    #[serde(serialize_with = "ordered_map")]
    pub apps: Vec<(String, Vec<AppModule>)>,
}

impl ModuleIndex {
    pub fn to_yaml(&self) -> Result<String, ModuleError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Scans the `.tf` files directly inside `root`.
///
/// `infra_*.tf` files contribute shared modules. Any other `<prefix>_*.tf` file, except
/// `terraform_*.tf`, contributes the modules whose name starts with `<prefix>_`.
pub fn extract_modules(root: &Path) -> Result<ModuleIndex, ModuleError> {
    let pattern = Regex::new(MODULE_PATTERN)?;
    let files = terraform_files(root)?;
    let mut index = ModuleIndex::default();

    for (file_name, path) in &files {
        if !file_name.starts_with(SHARED_PREFIX) {
            continue;
        }
        let content = read(path)?;
        for name in module_names(&pattern, &content) {
            let for_each = module_block(&content, name).contains("for_each");
            index.shared_modules.push(SharedModule {
                name: name.to_string(),
                var_name: format!("{name}{VAR_NAME_SUFFIX}"),
                for_each,
            });
        }
    }

    let mut app_files: Vec<(&str, Vec<&Path>)> = Vec::new();
    for (file_name, path) in &files {
        if SKIPPED_PREFIXES
            .iter()
            .any(|prefix| file_name.starts_with(prefix))
        {
            continue;
        }
        let stem = file_name.trim_end_matches(".tf");
        let Some((prefix, _)) = stem.split_once('_') else {
            continue;
        };
        match app_files.iter().position(|(known, _)| *known == prefix) {
            Some(at) => app_files[at].1.push(path.as_path()),
            None => app_files.push((prefix, vec![path.as_path()])),
        }
    }

    for (prefix, paths) in app_files {
        let module_prefix = format!("{prefix}_");
        let mut modules = Vec::new();
        for path in paths {
            let content = read(path)?;
            modules.extend(
                module_names(&pattern, &content)
                    .filter(|name| name.starts_with(&module_prefix))
                    .map(|name| AppModule {
                        name: name.to_string(),
                    }),
            );
        }
        if modules.is_empty() {
            debug!("No {module_prefix}* modules found, skipping {prefix}");
            continue;
        }
        index.apps.push((prefix.to_string(), modules));
    }

    info!(
        "Found {} shared modules and {} applications in {}",
        index.shared_modules.len(),
        index.apps.len(),
        root.display()
    );
    Ok(index)
}

fn ordered_map<S>(apps: &[(String, Vec<AppModule>)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(apps.iter().map(|(prefix, modules)| (prefix, modules)))
}

/// `(file name, path)` of every `*.tf` file in `root`, sorted by name.
fn terraform_files(root: &Path) -> Result<Vec<(String, PathBuf)>, ModuleError> {
    let io_error = |source| ModuleError::Io {
        path: root.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(root).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_terraform = path.extension().is_some_and(|extension| extension == "tf");
        if !path.is_file() || !is_terraform {
            continue;
        }
        if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
            files.push((file_name.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}

fn read(path: &Path) -> Result<String, ModuleError> {
    fs::read_to_string(path).map_err(|source| ModuleError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn module_names<'c>(pattern: &'c Regex, content: &'c str) -> impl Iterator<Item = &'c str> {
    pattern
        .captures_iter(content)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Text from `module "<name>"` up to the next closing brace.
fn module_block<'c>(content: &'c str, name: &str) -> &'c str {
    let declaration = format!("module \"{name}\"");
    let Some(start) = content.find(&declaration) else {
        return "";
    };
    let rest = &content[start..];
    match rest.find('}') {
        Some(end) => &rest[..end],
        None => rest,
    }
}
