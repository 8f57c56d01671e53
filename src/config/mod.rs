use args::{Args, CARGO_PKG_NAME};
use clap::Parser;
use connection_config::ConnectionConfig;

pub(crate) mod args;
pub(crate) mod connection_config;
mod meta;

pub(crate) struct Config {
    pub(crate) args: Args,
    pub(crate) connection: ConnectionConfig,
}

impl Config {
    pub(crate) fn new(connection_config_location: &str) -> Config {
        let connection = match confy::load::<ConnectionConfig>(
            CARGO_PKG_NAME,
            connection_config_location,
        ) {
            Ok(config) if config.metadata.is_current() => config,
            Ok(_) => {
                log::debug!("Stored connection config is from another version, using defaults");
                ConnectionConfig::default()
            }
            Err(err) => {
                log::warn!("Failed to load connection config, using defaults: {err}");
                ConnectionConfig::default()
            }
        };
        Config {
            args: Args::parse(),
            connection,
        }
    }
}
