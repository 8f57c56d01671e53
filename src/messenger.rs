use std::{cell::RefCell, io::Write};

/// Progress notifications emitted by the construct sequence. A `*_started`
/// call always precedes the operation, a `*_succeeded` call only follows a
/// confirmed success.
pub(crate) trait ConstructMessenger {
    fn create_provision_dir_started(&self);
    fn create_provision_dir_succeeded(&self);
    fn upload_artifacts_started(&self);
    fn upload_artifacts_succeeded(&self);
    fn upload_file_started(&self, artifact: &str);
    fn upload_file_succeeded(&self);
    fn enable_winrm_started(&self);
    fn enable_winrm_succeeded(&self);
    fn validate_vm_connection_started(&self);
    fn validate_vm_connection_succeeded(&self);
    fn extract_artifacts_started(&self);
    fn extract_artifacts_succeeded(&self);
    fn log_out_users_started(&self);
    fn log_out_users_succeeded(&self);
    fn execute_script_started(&self);
    fn execute_script_succeeded(&self);
    fn winrm_disconnected_for_reboot(&self);
    fn restart_in_progress(&self);
    fn shutdown_completed(&self);
}

/// Writes human readable progress to `out`. Started and succeeded messages
/// for short steps share a line.
pub(crate) struct Messenger<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> Messenger<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn say(&self, message: &str) {
        let mut out = self.out.borrow_mut();
        if let Err(err) = out.write_all(message.as_bytes()).and_then(|_| out.flush()) {
            log::warn!("Failed to write progress message {message:?}, with error {err}");
        }
    }
}

impl<W: Write> ConstructMessenger for Messenger<W> {
    fn create_provision_dir_started(&self) {
        self.say("\nCreating provision dir on target VM...");
    }

    fn create_provision_dir_succeeded(&self) {
        self.say("succeeded.\n");
    }

    fn upload_artifacts_started(&self) {
        self.say("\nTransferring ~20 MB to the Windows VM. Depending on your connection, the transfer may take 15-45 minutes\n");
    }

    fn upload_artifacts_succeeded(&self) {
        self.say("\nAll files have been uploaded.\n");
    }

    fn upload_file_started(&self, artifact: &str) {
        self.say(&format!("\tUploading {artifact} to target VM..."));
    }

    fn upload_file_succeeded(&self) {
        self.say("succeeded.\n");
    }

    fn enable_winrm_started(&self) {
        self.say("\nAttempting to enable WinRM on the guest vm...");
    }

    fn enable_winrm_succeeded(&self) {
        self.say("WinRm enabled on the guest VM\n");
    }

    fn validate_vm_connection_started(&self) {
        self.say("\nValidating connection to vm...");
    }

    fn validate_vm_connection_succeeded(&self) {
        self.say("succeeded.\n");
    }

    fn extract_artifacts_started(&self) {
        self.say("\nExtracting artifacts...");
    }

    fn extract_artifacts_succeeded(&self) {
        self.say("succeeded.\n");
    }

    fn log_out_users_started(&self) {
        self.say("\nAttempting to logout any remote users...");
    }

    fn log_out_users_succeeded(&self) {
        self.say("Logged out remote users\n");
    }

    fn execute_script_started(&self) {
        self.say("\nExecuting setup script...\n");
    }

    fn execute_script_succeeded(&self) {
        self.say("\nFinished executing setup script.\n");
    }

    fn winrm_disconnected_for_reboot(&self) {
        self.say("\nWinRM has been disconnected so the VM can reboot. Preparing VM...\n");
    }

    fn restart_in_progress(&self) {
        self.say("\nStill preparing VM...\n");
    }

    fn shutdown_completed(&self) {
        self.say("\nVM has now been shut down and is ready to be exported to a stemcell.\n");
    }
}
