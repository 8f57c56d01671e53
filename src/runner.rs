use std::{error::Error, io};

use crate::{
    artifacts::locate_artifact_directory,
    config::Config,
    construct::{GuestSession, StaticVersion, VmConstruct},
    govc::GovcClient,
    messenger::Messenger,
    poller::IntervalPoller,
    validate::validate_source_parameters,
    winrm::{GuestWinRmEnabler, WinRmClient, WinRmConnectionValidator, BOSH_PS_MODULES},
};

pub(crate) fn construct_vm(config: &Config) -> Result<(), Box<dyn Error>> {
    let args = &config.args;
    let connection = &config.connection;

    let artifact_directory = locate_artifact_directory(&args.artifact_directories, args.depth)?;
    log::info!("Using artifacts from {}", artifact_directory.display());
    let ps_modules = artifact_directory.join(BOSH_PS_MODULES);
    if !ps_modules.is_file() {
        return Err(format!(
            "Could not find {BOSH_PS_MODULES} next to the other artifacts in {}",
            artifact_directory.display()
        )
        .into());
    }

    let govc = GovcClient::new(
        args.govc_binary.clone(),
        args.vcenter_url.clone(),
        &args.vcenter_username,
        &args.vcenter_password,
        connection.insecure,
    )?;
    log::info!("Validating vCenter connection to {}", args.vcenter_url);
    validate_source_parameters(
        &args.vcenter_url,
        connection.insecure,
        &govc,
        &args.vm_inventory_path,
    )?;

    let session = GuestSession {
        vm_inventory_path: args.vm_inventory_path.clone(),
        username: args.vm_username.clone(),
        password: args.vm_password.clone(),
        artifact_directory,
    };
    let winrm = WinRmClient {
        binary: args.winrm_binary.clone(),
        host: args.vm_ip,
        port: connection.winrm_port,
        https: connection.winrm_https,
        insecure: connection.insecure,
        username: args.vm_username.clone(),
        password: args.vm_password.clone(),
        reach_timeout: connection.reach_timeout(),
    };
    let winrm_enabler = GuestWinRmEnabler {
        client: &govc,
        session: session.clone(),
        ps_modules,
    };
    let connection_validator = WinRmConnectionValidator { client: &winrm };
    let messenger = Messenger::new(io::stdout());
    let version = StaticVersion(args.stembuild_version.clone());

    VmConstruct {
        session,
        client: &govc,
        winrm_enabler: &winrm_enabler,
        connection_validator: &connection_validator,
        extractor: &winrm,
        executor: &winrm,
        messenger: &messenger,
        poller: &IntervalPoller,
        version_getter: &version,
    }
    .prepare_vm()?;
    Ok(())
}
