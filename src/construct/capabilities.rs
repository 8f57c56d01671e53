use std::{error::Error, path::PathBuf};

/// Identity of the guest being provisioned, fixed for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GuestSession {
    pub(crate) vm_inventory_path: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) artifact_directory: PathBuf,
}

/// Handle of a program started in the guest. `IaasClient::wait_for_exit`
/// consumes it, so every start is waited on exactly once.
#[derive(Debug, PartialEq)]
pub(crate) struct GuestProcess(String);

impl GuestProcess {
    pub(crate) fn new(pid: impl Into<String>) -> Self {
        Self(pid.into())
    }

    pub(crate) fn pid(&self) -> &str {
        &self.0
    }
}

/// Guest file, process and power operations offered by the hypervisor.
pub(crate) trait IaasClient {
    fn make_directory(&self, session: &GuestSession, path: &str) -> Result<(), Box<dyn Error>>;
    fn upload_artifact(
        &self,
        session: &GuestSession,
        artifact: &str,
        destination: &str,
    ) -> Result<(), Box<dyn Error>>;
    fn start(
        &self,
        session: &GuestSession,
        command: &str,
        args: &[&str],
    ) -> Result<GuestProcess, Box<dyn Error>>;
    fn wait_for_exit(
        &self,
        session: &GuestSession,
        process: GuestProcess,
    ) -> Result<i32, Box<dyn Error>>;
    fn is_powered_off(&self, session: &GuestSession) -> Result<bool, Box<dyn Error>>;
}

pub(crate) trait WinRmEnabler {
    fn enable(&self) -> Result<(), Box<dyn Error>>;
}

pub(crate) trait VmConnectionValidator {
    fn validate(&self) -> Result<(), Box<dyn Error>>;
}

pub(crate) trait ArchiveExtractor {
    fn extract_archive(&self, source: &str, destination: &str) -> Result<(), Box<dyn Error>>;
}

/// Runs a command on the guest over the remote shell and blocks until it ends.
pub(crate) trait CommandExecutor {
    fn execute_command(&self, command: &str) -> Result<(), Box<dyn Error>>;
}

pub(crate) trait VersionGetter {
    fn version(&self) -> String;
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StaticVersion(pub(crate) String);

impl VersionGetter for StaticVersion {
    fn version(&self) -> String {
        self.0.clone()
    }
}
