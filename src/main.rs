//! stamp's command-line entry point.
//! Loads configuration, merges command-line flags over it, and renders.

use anyhow::Context;
use std::path::Path;

use stamp::{
    cli::{get_args, Args},
    config::Config,
    constants::CONFIG_FILE,
    error::default_error_handler,
    gather::Streams,
    logger::init_logger,
    metrics::Metrics,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    };

    let mut streams = Streams::stdio();
    let mut metrics = Metrics::new();
    let result = stamp::run(&cfg, &mut streams, &mut metrics);
    log::debug!("{metrics:?}");

    if let Err(err) = result {
        default_error_handler(err);
    }
}

/// Builds the effective configuration from the config file and the flags.
///
/// # Flow
/// 1. Reads `--config`, or `.stamp.yaml` when it exists
/// 2. Applies command-line flags on top
/// 3. Fills in defaults and validates the result
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None if Path::new(CONFIG_FILE).is_file() => {
            Config::load(CONFIG_FILE).with_context(|| format!("failed to load {CONFIG_FILE}"))?
        }
        None => Config::default(),
    };
    args.apply_to(&mut cfg)?;
    cfg.apply_defaults();
    cfg.validate()?;
    Ok(cfg)
}
