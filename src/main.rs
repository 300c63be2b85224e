mod analyze;
mod bench;
mod bits;
mod cli;
mod config;
mod error;
mod generators;
mod logging;
mod mixer;
mod nist;
mod output;
mod report;
mod stats;

use std::path::Path;
use std::process;

use clap::Parser;

use cli::{Cli, Command};
use config::Config;

/// Load the config file, falling back to defaults with a warning.
fn load_or_default(config_file: Option<&Path>) -> Config {
    match config::load_config(config_file) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{}", e);
            Config::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Command::Analyze(args)) => {
            logging::init(&args.log);
            let mut config = load_or_default(args.config_file.as_deref());
            let plan = &mut config.bench;
            if let Some(v) = args.bins {
                plan.bins = v;
            }
            if let Some(v) = args.block_size {
                plan.block_size = v;
            }
            if let Some(v) = args.range {
                plan.range = v;
            }
            plan.validate();
            analyze::run(args, plan)
        }
        Some(Command::Dump(args)) => {
            logging::init(&args.log);
            let config = load_or_default(args.config_file.as_deref());
            output::run_dump(args, &config.seeds)
        }
        None => {
            logging::init(&cli.log);
            let mut config = load_or_default(cli.config_file.as_deref());
            bench::apply_overrides(&mut config, &cli.bench);
            bench::run(&cli.bench, &config)
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        process::exit(1);
    }
}
