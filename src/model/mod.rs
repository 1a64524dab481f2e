use thiserror::Error;

pub mod catalog;

pub use catalog::{Catalog, Requirement, Requires, Resource, ResourceName};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading resource catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
