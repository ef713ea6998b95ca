use clap::Parser;

use sceneplay::config::{AppConfig, Args};

fn main() {
    let config = AppConfig::from(Args::parse());

    if let Err(e) = sceneplay::logging::init(config.verbose) {
        eprintln!("failed to initialize logging: {e}");
    }

    if let Err(e) = sceneplay::run(config) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
