mod args;
mod tva;

use clap::Parser;
use log::{error, info};
use std::error::Error;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    info!("args: {:?}", args);

    if let Err(e) = tva::run(&args) {
        error!("An error occured: {}", e);
        let mut source = e.source();
        while let Some(s) = source {
            error!("caused by: {}", s);
            source = s.source();
        }
        std::process::exit(1);
    }
}
