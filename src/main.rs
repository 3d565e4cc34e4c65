mod args;
mod rollcall;

use clap::Parser;
use log::{debug, error};
use std::error::Error;

use crate::args::Args;

fn main() {
    // A .env file may provide the geometry paths.
    let dotenv_res = dotenvy::dotenv();

    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    match dotenv_res {
        Ok(p) => debug!("Loaded environment from {:?}", p),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
    debug!("args: {:?}", args);

    if let Err(e) = rollcall::run_map(&args) {
        error!("{}", e);
        let mut source = e.source();
        while let Some(s) = source {
            error!("  caused by: {}", s);
            source = s.source();
        }
        std::process::exit(1);
    }
}
