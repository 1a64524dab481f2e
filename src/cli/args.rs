use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Dependency trees for infrastructure resource catalogs.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Resource catalog file (YAML or TOML).
    /// Defaults to RESDEP_CATALOG_PATH, then doc/resource_dependencies.yaml
    #[clap(short, long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    ///Prints what must exist before a resource can exist, as a tree
    Tree {
        resource: String,
        ///Shows resource descriptions
        #[clap(short = 'd', long)]
        with_descriptions: bool,
        ///Annotates resources that are only reached through a provider
        #[clap(long)]
        source: bool,
        ///Includes resources that depend on the target
        #[clap(long)]
        siblings: bool,
        ///Shows resource kinds, e.g. oci://resource
        #[clap(long)]
        kind: bool,
        ///Shows resource types, e.g. bin/terraform
        #[clap(long = "type")]
        show_type: bool,
    },
    ///Lists the resources of the catalog
    List,
    ///Prints the Terraform modules of a directory as YAML
    Modules {
        #[clap(default_value = ".")]
        directory: String,
    },
}
