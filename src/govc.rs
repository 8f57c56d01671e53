use std::{error::Error, fmt, path::PathBuf};

use serde::Deserialize;
use url::Url;

use crate::{
    construct::{GuestProcess, GuestSession, IaasClient},
    utils::{run_tool, ToolOutput},
};

/// vSphere access through the `govc` command line tool.
#[derive(Clone)]
pub(crate) struct GovcClient {
    binary: PathBuf,
    url: Url,
    insecure: bool,
}

impl fmt::Debug for GovcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut url = self.url.clone();
        if url.password().is_some() {
            // Only fails for URLs that cannot carry credentials in the first place.
            let _ = url.set_password(Some("REDACTED"));
        }
        f.debug_struct("GovcClient")
            .field("binary", &self.binary)
            .field("url", &url.as_str())
            .field("insecure", &self.insecure)
            .finish()
    }
}

// govc has emitted both the Go field names and camel case over the years.
#[derive(Debug, Deserialize)]
struct ProcessList {
    #[serde(rename = "processInfo", alias = "ProcessInfo", default)]
    process_info: Vec<ProcessInfo>,
}

#[derive(Debug, Deserialize)]
struct ProcessInfo {
    #[serde(rename = "exitCode", alias = "ExitCode")]
    exit_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct VmInfo {
    #[serde(rename = "virtualMachines", alias = "VirtualMachines", default)]
    virtual_machines: Option<Vec<VirtualMachine>>,
}

#[derive(Debug, Deserialize)]
struct VirtualMachine {
    #[serde(rename = "runtime", alias = "Runtime")]
    runtime: Runtime,
}

#[derive(Debug, Deserialize)]
struct Runtime {
    #[serde(rename = "powerState", alias = "PowerState")]
    power_state: String,
}

impl GovcClient {
    /// `url` is the vCenter endpoint; the credentials are folded into it the
    /// way govc expects them.
    pub(crate) fn new(
        binary: PathBuf,
        mut url: Url,
        username: &str,
        password: &str,
        insecure: bool,
    ) -> Result<Self, Box<dyn Error>> {
        url.set_username(username)
            .map_err(|_| format!("cannot use {url} with credentials"))?;
        url.set_password(Some(password))
            .map_err(|_| format!("cannot use {url} with credentials"))?;
        Ok(Self {
            binary,
            url,
            insecure,
        })
    }

    fn connection_args(&self, subcommand: &str) -> Vec<String> {
        vec![
            subcommand.to_string(),
            format!("-u={}", self.url),
            format!("-k={}", self.insecure),
        ]
    }

    fn guest_args(&self, subcommand: &str, session: &GuestSession) -> Vec<String> {
        let mut args = self.connection_args(subcommand);
        args.push(format!("-vm.ipath={}", session.vm_inventory_path));
        args.push(format!("-l={}:{}", session.username, session.password));
        args
    }

    fn run(&self, args: Vec<String>) -> Result<String, Box<dyn Error>> {
        let subcommand = args.first().cloned().unwrap_or_default();
        let output = run_tool(&self.binary, &subcommand, args)?;
        ensure_success(&subcommand, output)
    }

    /// Checks the vCenter credentials by asking for the server description.
    pub(crate) fn validate_credentials(&self) -> Result<(), Box<dyn Error>> {
        self.run(self.connection_args("about")).map(|_| ())
    }

    pub(crate) fn find_vm(&self, vm_inventory_path: &str) -> Result<(), Box<dyn Error>> {
        let mut args = self.connection_args("vm.info");
        args.extend(["-json".to_string(), vm_inventory_path.to_string()]);
        let machines = parse_vm_info(&self.run(args)?)?;
        if machines.len() != 1 {
            return Err(format!(
                "expected one VM at {vm_inventory_path}, found {}",
                machines.len()
            )
            .into());
        }
        Ok(())
    }
}

impl IaasClient for GovcClient {
    fn make_directory(&self, session: &GuestSession, path: &str) -> Result<(), Box<dyn Error>> {
        let mut args = self.guest_args("guest.mkdir", session);
        args.extend(["-p".to_string(), path.to_string()]);
        self.run(args).map(|_| ())
    }

    fn upload_artifact(
        &self,
        session: &GuestSession,
        artifact: &str,
        destination: &str,
    ) -> Result<(), Box<dyn Error>> {
        let mut args = self.guest_args("guest.upload", session);
        args.extend([
            "-f".to_string(),
            artifact.to_string(),
            destination.to_string(),
        ]);
        self.run(args).map(|_| ())
    }

    fn start(
        &self,
        session: &GuestSession,
        command: &str,
        args: &[&str],
    ) -> Result<GuestProcess, Box<dyn Error>> {
        let mut govc_args = self.guest_args("guest.start", session);
        govc_args.push(command.to_string());
        govc_args.extend(args.iter().map(|arg| arg.to_string()));
        let pid = self.run(govc_args)?.trim().to_string();
        if pid.is_empty() {
            return Err(format!("no process id returned when starting {command}").into());
        }
        Ok(GuestProcess::new(pid))
    }

    fn wait_for_exit(
        &self,
        session: &GuestSession,
        process: GuestProcess,
    ) -> Result<i32, Box<dyn Error>> {
        let mut args = self.guest_args("guest.ps", session);
        args.extend([
            "-p".to_string(),
            process.pid().to_string(),
            "-X".to_string(),
            "-json".to_string(),
        ]);
        parse_exit_code(&self.run(args)?, process.pid())
    }

    fn is_powered_off(&self, session: &GuestSession) -> Result<bool, Box<dyn Error>> {
        let mut args = self.connection_args("vm.info");
        args.extend(["-json".to_string(), session.vm_inventory_path.clone()]);
        let machines = parse_vm_info(&self.run(args)?)?;
        match machines.first() {
            Some(machine) => Ok(machine.runtime.power_state == "poweredOff"),
            None => Err(format!("VM {} not found", session.vm_inventory_path).into()),
        }
    }
}

fn ensure_success(subcommand: &str, output: ToolOutput) -> Result<String, Box<dyn Error>> {
    if output.success() {
        return Ok(output.stdout);
    }
    let status = output
        .code
        .map(|code| format!("exit code {code}"))
        .unwrap_or_else(|| "terminated by signal".to_string());
    if output.stderr.is_empty() {
        return Err(format!("govc {subcommand} failed ({status})").into());
    }
    Err(format!("govc {subcommand} failed ({status}): {}", output.stderr).into())
}

fn parse_exit_code(json: &str, pid: &str) -> Result<i32, Box<dyn Error>> {
    let list: ProcessList = serde_json::from_str(json)?;
    list.process_info
        .first()
        .and_then(|info| info.exit_code)
        .ok_or_else(|| format!("no exit code reported for guest process {pid}").into())
}

fn parse_vm_info(json: &str) -> Result<Vec<VirtualMachine>, Box<dyn Error>> {
    let info: VmInfo = serde_json::from_str(json)?;
    Ok(info.virtual_machines.unwrap_or_default())
}
