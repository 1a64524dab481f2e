pub mod cli;
pub mod config;
pub mod model;
pub mod modules;
pub mod resolver;
pub mod tree;

mod api;

pub use api::{Resdep, ResdepBuilder};
