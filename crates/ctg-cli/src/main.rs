use clap::Parser;
use ctg_cli::{load_config, Cli};
use tracing::{error, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    // The config may set the log level, so it is read before logging exists.
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };
    let config_level = config.log_level();
    let level = cli
        .log_level
        .or_else(|| config_level.as_ref().ok().copied())
        .unwrap_or(Level::INFO);

    // Logs go to stderr; stdout carries reports.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }
    if let Err(err) = &config_level {
        warn!("{err}; using {level}");
    }

    if let Err(err) = commands::dispatch(&cli.command, &config) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
