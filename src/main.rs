use std::process::ExitCode;

use config::{args::LONG, connection_config::CONNECTION_CONFIG_LOCATION, Config};
use env_logger::Env;

mod artifacts;
mod codec;
mod config;
mod construct;
mod govc;
mod messenger;
mod poller;
mod runner;
mod utils;
mod validate;
mod winrm;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = Config::new(CONNECTION_CONFIG_LOCATION);
    log::info!("{LONG}");
    log::debug!("Connection config {:?}", config.connection);

    match runner::construct_vm(&config) {
        Ok(()) => {
            log::info!("VM {} is ready for packaging", config.args.vm_inventory_path);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
