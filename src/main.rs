use std::error::Error;

use clap::Parser;
use env_logger::Env;
use resdep::{
    cli::args::{CliArgs, Command},
    tree::ResolveOptions,
    Resdep,
};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = CliArgs::parse();

    let mut builder = Resdep::builder();
    if let Some(catalog) = cli_args.catalog {
        builder = builder.catalog_path(catalog);
    }
    let resdep = builder.try_build()?;

    match cli_args.cmd {
        Command::Tree {
            resource,
            with_descriptions,
            source,
            siblings,
            kind,
            show_type,
        } => {
            let options = ResolveOptions {
                show_descriptions: with_descriptions,
                direct_only: source,
                include_dependents: siblings,
                show_kind: kind,
                show_type,
                limits: None,
            };
            resdep.tree(&resource, &options)
        }
        Command::List => resdep.list(),
        Command::Modules { directory } => resdep.modules(directory),
    }
}
