use std::{
    error::Error,
    io,
    path::{Path, PathBuf},
};

use crate::{
    cli::command_handlers::{do_list, do_modules, do_tree},
    tree::ResolveOptions,
};

mod builder;

pub use builder::ResdepBuilder;

pub struct Resdep {
    root: PathBuf,
    catalog_path: PathBuf,
    max_visits: Option<usize>,
}

impl Resdep {
    pub fn builder() -> ResdepBuilder {
        ResdepBuilder::default()
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// Prints the dependency tree of `resource` to stdout
    pub fn tree(&self, resource: &str, options: &ResolveOptions) -> Result<(), Box<dyn Error>> {
        do_tree(
            &self.catalog_path,
            resource,
            options,
            self.max_visits,
            &mut io::stdout().lock(),
        )
    }

    /// Prints the catalog's resource names, one per line
    pub fn list(&self) -> Result<(), Box<dyn Error>> {
        do_list(&self.catalog_path, &mut io::stdout().lock())
    }

    /// Prints the Terraform module index of `directory`, relative to the root
    pub fn modules(&self, directory: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
        do_modules(&self.root.join(directory), &mut io::stdout().lock())
    }
}
