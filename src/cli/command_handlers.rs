use std::{error::Error, io::Write, path::Path};

use log::debug;

use crate::{
    model::{Catalog, ResourceName},
    modules::extract_modules,
    resolver::Limits,
    tree::{self, ResolveError, ResolveOptions},
};

/// Handler to tree command
/// Resolves `resource` against the catalog and writes the rendered tree
pub fn do_tree(
    catalog_path: &Path,
    resource: &str,
    options: &ResolveOptions,
    max_visits: Option<usize>,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let catalog = load_catalog(catalog_path)?;

    let mut options = options.clone();
    if let Some(max_visits) = max_visits {
        debug!("Limiting traversals to {max_visits} visits");
        options.limits = Some(Limits::for_catalog(&catalog).with_max_visits(max_visits));
    }

    let resolution = tree::resolve(&catalog, resource, &options).map_err(|error| {
        let ResolveError::UnknownResource { available, .. } = &error;
        format!("{error}\n\nAvailable resources: {}", join(available))
    })?;

    debug!(
        "Rendering {} resources for {}",
        resolution.tree().len(),
        resolution.target()
    );
    for line in resolution.lines() {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Handler to list command
pub fn do_list(catalog_path: &Path, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let catalog = load_catalog(catalog_path)?;
    for name in catalog.names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

/// Handler to modules command
/// Writes the module index of `directory` as YAML
pub fn do_modules(directory: &Path, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let index = extract_modules(directory)?;
    write!(out, "{}", index.to_yaml()?)?;
    Ok(())
}

fn load_catalog(catalog_path: &Path) -> Result<Catalog, Box<dyn Error>> {
    if !catalog_path.exists() {
        return Err(format!("{} not found", catalog_path.display()).into());
    }
    Catalog::from_file(catalog_path).map_err(|err| {
        format!(
            "Could not load resource catalog {}: {err}",
            catalog_path.display()
        )
        .into()
    })
}

fn join(names: &[ResourceName]) -> String {
    names
        .iter()
        .map(ResourceName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use pretty_assertions::assert_eq;

    const CATALOG: &str = r#"
resources:
  vcn: {}
  subnet:
    requires:
      mandatory: [vcn]
"#;

    fn catalog_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("resource_dependencies.yaml");
        fs::write(&path, CATALOG).unwrap();
        path
    }

    #[test]
    fn tree_writes_rendered_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_file(dir.path());
        let mut out = Vec::<u8>::new();
        do_tree(&path, "subnet", &ResolveOptions::default(), None, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with(&"═".repeat(70)));
        assert!(out.contains("└── ✅ vcn\n    └── ✅ subnet\n"));
        assert!(out.ends_with("Mandatory (1): vcn\nOptional (0): none\n"));
    }

    #[test]
    fn tree_of_unknown_resource_lists_available_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_file(dir.path());
        let mut out = Vec::<u8>::new();
        let error = do_tree(&path, "router", &ResolveOptions::default(), Some(10), &mut out)
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Resource 'router' not found in dependencies file\n\nAvailable resources: subnet, vcn"
        );
        assert!(out.is_empty());
    }

    #[test]
    fn list_writes_names_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog_file(dir.path());
        let mut out = Vec::<u8>::new();
        do_list(&path, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "subnet\nvcn\n");
    }

    #[test]
    fn missing_catalog_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let error = do_list(&path, &mut Vec::<u8>::new()).unwrap_err();
        assert!(error.to_string().ends_with("missing.yaml not found"));
    }

    #[test]
    fn malformed_catalog_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "resources: [vcn").unwrap();
        let error = do_list(&path, &mut Vec::<u8>::new()).unwrap_err();
        let message = error.to_string();
        assert!(message.starts_with("Could not load resource catalog "));
        assert!(message.contains("broken.yaml: YAML parsing error"));
    }

    #[test]
    fn modules_write_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("infra_main.tf"), "module \"vcn\" {\n}\n").unwrap();
        let mut out = Vec::<u8>::new();
        do_modules(dir.path(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "shared_modules:\n- name: vcn\n  var_name: vcn_fqrns\n  for_each: false\napps: {}\n"
        );
    }
}
