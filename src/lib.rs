pub mod catalog;
pub mod cli;
pub mod error;
pub mod executor;
pub mod journal;
pub mod mapping;
pub mod planner;
pub mod replace;
pub mod report;
pub mod request;
pub mod scope;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::Cli;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("field_replace", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed arguments: {:?}", cli.replace);
    replace::execute(&cli.replace)
}
