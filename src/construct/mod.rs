//! Sequencing of the guest preparation run.
//!
//! `VmConstruct::prepare_vm` drives the guest through a fixed series of
//! steps: stage the automation archives, enable WinRM, check that we can log
//! in, unpack the archives, log out interactive users, run the sysprep setup
//! script and finally wait for the guest to power itself off. The first
//! failing step ends the run; nothing is retried or rolled back here.

use std::time::Duration;

use crate::{codec::encode_powershell_command, messenger::ConstructMessenger, poller::Poller};

mod capabilities;
mod error;
#[cfg(test)]
mod fakes;

pub(crate) use capabilities::{
    ArchiveExtractor, CommandExecutor, GuestProcess, GuestSession, IaasClient, StaticVersion,
    VersionGetter, VmConnectionValidator, WinRmEnabler,
};
pub(crate) use error::ConstructError;

pub(crate) const PROVISION_DIR: &str = "C:\\provision\\";
pub(crate) const LGPO_NAME: &str = "LGPO.zip";
pub(crate) const STEMCELL_AUTOMATION_NAME: &str = "StemcellAutomation.zip";
pub(crate) const LGPO_DEST: &str = "C:\\provision\\LGPO.zip";
pub(crate) const STEMCELL_AUTOMATION_DEST: &str = "C:\\provision\\StemcellAutomation.zip";
pub(crate) const STEMCELL_AUTOMATION_SCRIPT: &str = "C:\\provision\\Setup.ps1";
pub(crate) const POWERSHELL: &str = "C:\\Windows\\System32\\WindowsPowerShell\\V1.0\\powershell.exe";
pub(crate) const LOGOFF_COMMAND: &str = "$(Get-WmiObject win32_operatingsystem).Win32Shutdown(0)";
pub(crate) const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub(crate) struct VmConstruct<'a> {
    pub(crate) session: GuestSession,
    pub(crate) client: &'a dyn IaasClient,
    pub(crate) winrm_enabler: &'a dyn WinRmEnabler,
    pub(crate) connection_validator: &'a dyn VmConnectionValidator,
    pub(crate) extractor: &'a dyn ArchiveExtractor,
    pub(crate) executor: &'a dyn CommandExecutor,
    pub(crate) messenger: &'a dyn ConstructMessenger,
    pub(crate) poller: &'a dyn Poller,
    pub(crate) version_getter: &'a dyn VersionGetter,
}

impl VmConstruct<'_> {
    pub(crate) fn prepare_vm(&self) -> Result<(), ConstructError> {
        log::info!("Preparing VM {}", self.session.vm_inventory_path);

        self.create_provision_directory()?;

        self.messenger.upload_artifacts_started();
        self.upload_artifacts()?;
        self.messenger.upload_artifacts_succeeded();

        log::info!("Enabling WinRM");
        self.messenger.enable_winrm_started();
        self.winrm_enabler
            .enable()
            .map_err(ConstructError::EnableWinRm)?;
        self.messenger.enable_winrm_succeeded();

        log::info!("Validating VM connection");
        self.messenger.validate_vm_connection_started();
        self.connection_validator
            .validate()
            .map_err(ConstructError::ValidateConnection)?;
        self.messenger.validate_vm_connection_succeeded();

        log::info!("Extracting artifacts");
        self.messenger.extract_artifacts_started();
        self.extractor
            .extract_archive(STEMCELL_AUTOMATION_DEST, PROVISION_DIR)
            .map_err(ConstructError::ExtractArchive)?;
        self.messenger.extract_artifacts_succeeded();

        log::info!("Logging out remote users");
        self.messenger.log_out_users_started();
        self.log_out_users().map_err(ConstructError::LogOutUsers)?;
        self.messenger.log_out_users_succeeded();

        log::info!("Executing setup script");
        self.messenger.execute_script_started();
        self.execute_setup_script()
            .map_err(ConstructError::ExecuteScript)?;
        self.messenger.execute_script_succeeded();
        self.messenger.winrm_disconnected_for_reboot();

        log::info!("Waiting for the VM to shut down");
        self.wait_for_shutdown(SHUTDOWN_POLL_INTERVAL)
            .map_err(ConstructError::AwaitShutdown)?;
        self.messenger.shutdown_completed();
        Ok(())
    }

    fn create_provision_directory(&self) -> Result<(), ConstructError> {
        log::info!("Creating provision directory {PROVISION_DIR}");
        self.messenger.create_provision_dir_started();
        self.client
            .make_directory(&self.session, PROVISION_DIR)
            .map_err(ConstructError::CreateProvisionDir)?;
        self.messenger.create_provision_dir_succeeded();
        Ok(())
    }

    fn upload_artifacts(&self) -> Result<(), ConstructError> {
        let uploads = [
            ("LGPO", LGPO_NAME, LGPO_DEST),
            (
                "stemcell preparation artifacts",
                STEMCELL_AUTOMATION_NAME,
                STEMCELL_AUTOMATION_DEST,
            ),
        ];
        for (label, name, destination) in uploads {
            let artifact = self.session.artifact_directory.join(name);
            log::info!("Uploading {} to {destination}", artifact.display());
            self.messenger.upload_file_started(label);
            self.client
                .upload_artifact(&self.session, &artifact.to_string_lossy(), destination)
                .map_err(ConstructError::UploadArtifact)?;
            self.messenger.upload_file_succeeded();
        }
        Ok(())
    }

    fn log_out_users(&self) -> Result<(), String> {
        let logoff_command = encode_powershell_command(LOGOFF_COMMAND);
        let process = self
            .client
            .start(
                &self.session,
                POWERSHELL,
                &["-EncodedCommand", logoff_command.as_str()],
            )
            .map_err(|err| err.to_string())?;
        log::debug!("Logout process started with pid {}", process.pid());
        let exit_code = self
            .client
            .wait_for_exit(&self.session, process)
            .map_err(|err| err.to_string())?;
        if exit_code != 0 {
            return Err(format!(
                "WinRM process on guest VM exited with code {exit_code}"
            ));
        }
        Ok(())
    }

    fn execute_setup_script(&self) -> Result<(), Box<dyn std::error::Error>> {
        let version = self.version_getter.version();
        self.executor.execute_command(&format!(
            "powershell.exe {STEMCELL_AUTOMATION_SCRIPT} -Version {version}"
        ))
    }

    fn wait_for_shutdown(&self, interval: Duration) -> Result<(), Box<dyn std::error::Error>> {
        self.poller.poll(interval, &mut || {
            let powered_off = self.client.is_powered_off(&self.session)?;
            if !powered_off {
                self.messenger.restart_in_progress();
            }
            Ok(powered_off)
        })
    }
}
