use std::{
    error::Error,
    fmt,
    net::{IpAddr, SocketAddr, TcpStream},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    artifacts::read_zip_entry,
    codec::encode_powershell_command,
    construct::{
        ArchiveExtractor, CommandExecutor, GuestSession, IaasClient, VmConnectionValidator,
        WinRmEnabler, POWERSHELL,
    },
    utils::run_tool,
};

pub(crate) const BOSH_PS_MODULES: &str = "bosh-psmodules.zip";
pub(crate) const WINRM_PS_MODULE: &str = "BOSH.WinRM.psm1";

/// Remote shell on the guest through the `winrm` command line tool.
#[derive(Clone)]
pub(crate) struct WinRmClient {
    pub(crate) binary: PathBuf,
    pub(crate) host: IpAddr,
    pub(crate) port: u16,
    pub(crate) https: bool,
    pub(crate) insecure: bool,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) reach_timeout: Duration,
}

impl fmt::Debug for WinRmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WinRmClient")
            .field("binary", &self.binary)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("https", &self.https)
            .field("insecure", &self.insecure)
            .field("username", &self.username)
            .field("password", &"REDACTED")
            .field("reach_timeout", &self.reach_timeout)
            .finish()
    }
}

impl WinRmClient {
    fn command_args(&self, command: &str) -> Vec<String> {
        let mut args = vec![
            "-hostname".to_string(),
            self.host.to_string(),
            "-port".to_string(),
            self.port.to_string(),
            "-username".to_string(),
            self.username.clone(),
            "-password".to_string(),
            self.password.clone(),
        ];
        if self.https {
            args.push("-https".to_string());
        }
        if self.insecure {
            args.push("-insecure".to_string());
        }
        args.push(command.to_string());
        args
    }

    pub(crate) fn can_reach_vm(&self) -> Result<(), Box<dyn Error>> {
        let address = SocketAddr::new(self.host, self.port);
        TcpStream::connect_timeout(&address, self.reach_timeout)?;
        Ok(())
    }

    pub(crate) fn can_login_vm(&self) -> Result<(), Box<dyn Error>> {
        self.execute_command("hostname")
    }
}

impl CommandExecutor for WinRmClient {
    fn execute_command(&self, command: &str) -> Result<(), Box<dyn Error>> {
        let output = run_tool(&self.binary, "remote command", self.command_args(command))?;
        if output.success() {
            log::debug!("{}", output.stdout.trim());
            return Ok(());
        }
        let status = match output.code {
            Some(code) => format!("command '{command}' exited with code {code}"),
            None => format!("command '{command}' was terminated"),
        };
        if output.stderr.is_empty() {
            return Err(status.into());
        }
        Err(format!("{status}: {}", output.stderr).into())
    }
}

impl ArchiveExtractor for WinRmClient {
    fn extract_archive(&self, source: &str, destination: &str) -> Result<(), Box<dyn Error>> {
        self.execute_command(&extract_archive_command(source, destination))
    }
}

fn extract_archive_command(source: &str, destination: &str) -> String {
    format!(
        "powershell.exe Expand-Archive -LiteralPath '{source}' -DestinationPath '{destination}' -Force"
    )
}

pub(crate) struct WinRmConnectionValidator<'a> {
    pub(crate) client: &'a WinRmClient,
}

impl VmConnectionValidator for WinRmConnectionValidator<'_> {
    fn validate(&self) -> Result<(), Box<dyn Error>> {
        self.client.can_reach_vm().map_err(|err| {
            format!(
                "cannot reach guest VM at {}:{}: {err}",
                self.client.host, self.client.port
            )
        })?;
        self.client.can_login_vm().map_err(|err| {
            format!("cannot complete login due to an incorrect username or password: {err}")
        })?;
        Ok(())
    }
}

/// Enables WinRM by running the BOSH WinRM module as a guest process. This
/// goes through the hypervisor since the remote shell is not up yet.
pub(crate) struct GuestWinRmEnabler<'a> {
    pub(crate) client: &'a dyn IaasClient,
    pub(crate) session: GuestSession,
    pub(crate) ps_modules: PathBuf,
}

impl GuestWinRmEnabler<'_> {
    fn run_enable_script(&self) -> Result<(), Box<dyn Error>> {
        let script = enable_winrm_script(&self.ps_modules)?;
        let encoded = encode_powershell_command(&script);
        let process = self
            .client
            .start(&self.session, POWERSHELL, &["-EncodedCommand", encoded.as_str()])?;
        let exit_code = self.client.wait_for_exit(&self.session, process)?;
        if exit_code != 0 {
            return Err(format!("WinRM process on guest VM exited with code {exit_code}").into());
        }
        Ok(())
    }
}

impl WinRmEnabler for GuestWinRmEnabler<'_> {
    fn enable(&self) -> Result<(), Box<dyn Error>> {
        self.run_enable_script()
            .map_err(|err| format!("failed to enable WinRM: {err}").into())
    }
}

fn enable_winrm_script(ps_modules: &Path) -> Result<String, Box<dyn Error>> {
    let module = read_zip_entry(ps_modules, WINRM_PS_MODULE)?;
    let mut script = String::from_utf8(module)
        .map_err(|err| format!("{WINRM_PS_MODULE} is not valid UTF-8: {err}"))?;
    script.push_str("\nEnable-WinRM\n");
    Ok(script)
}
