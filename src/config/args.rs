use std::{
    fs,
    net::IpAddr,
    path::PathBuf,
};

use anstyle::{
    AnsiColor::{BrightBlue, BrightGreen, BrightMagenta, BrightRed, Cyan, Red, White},
    Color::Ansi,
    Style,
};
use clap::{builder::Styles, Parser};
use url::Url;

use crate::utils::find_binary_on_path;

pub(crate) const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");

pub(crate) const LONG: &str = r"
     _                 _           _ _     _
 ___| |_ ___ _ __ ___ | |__  _   _(_) | __| |
/ __| __/ _ \ '_ ` _ \| '_ \| | | | | |/ _` |
\__ \ ||  __/ | | | | | |_) | |_| | | | (_| |
|___/\__\___|_| |_| |_|_.__/ \__,_|_|_|\__,_|
";

pub(crate) const INVENTORY_PATH_ERROR: &str =
    "inventory path must use the 'vm' keyword, e.g. /my-datacenter/vm/my-folder/my-vm-name";

#[cfg(not(target_os = "windows"))]
const GOVC_FILE_NAME: &str = "govc";
#[cfg(target_os = "windows")]
const GOVC_FILE_NAME: &str = "govc.exe";

#[cfg(not(target_os = "windows"))]
const WINRM_FILE_NAME: &str = "winrm";
#[cfg(target_os = "windows")]
const WINRM_FILE_NAME: &str = "winrm.exe";

fn styles() -> Styles {
    Styles::styled()
        .usage(Style::new().bold().fg_color(Some(Ansi(BrightBlue))))
        .header(Style::new().bold().underline().fg_color(Some(Ansi(Cyan))))
        .literal(Style::new().fg_color(Some(Ansi(BrightGreen))))
        .invalid(Style::new().bold().fg_color(Some(Ansi(Red))))
        .error(Style::new().bold().fg_color(Some(Ansi(BrightRed))))
        .valid(Style::new().fg_color(Some(Ansi(White))))
        .placeholder(Style::new().italic().fg_color(Some(Ansi(BrightMagenta))))
}

// https://docs.rs/clap/latest/clap/_derive/index.html#arg-attributes
/// Prepare an imported Windows VM on vCenter for stemcell packaging
#[derive(Parser, Debug, PartialEq, Clone)]
#[command(
    version,
    styles = styles(),
    about = format!("{}\n{}", LONG, env!("CARGO_PKG_DESCRIPTION"))
)]
pub(crate) struct Args {
    /// IP address of the guest VM
    #[clap(env, long, short = 'i', required = true)]
    pub(crate) vm_ip: IpAddr,

    /// Administrator username on the guest VM
    #[clap(env, long, short = 'u', required = true)]
    pub(crate) vm_username: String,

    /// Administrator password on the guest VM
    #[clap(env, long, short = 'p', required = true, hide_env_values = true)]
    pub(crate) vm_password: String,

    /// vCenter URL, https:// is assumed when no scheme is given
    #[clap(env, long, short = 'c', value_parser = parse_vcenter_url, required = true)]
    pub(crate) vcenter_url: Url,

    /// vCenter username
    #[clap(env, long, required = true)]
    pub(crate) vcenter_username: String,

    /// vCenter password
    #[clap(env, long, required = true, hide_env_values = true)]
    pub(crate) vcenter_password: String,

    /// Inventory path of the VM, e.g. /my-datacenter/vm/my-folder/my-vm-name
    #[clap(env, long, short = 'v', value_parser = parse_inventory_path, required = true)]
    pub(crate) vm_inventory_path: String,

    /// Directories searched for LGPO.zip, StemcellAutomation.zip and bosh-psmodules.zip
    #[clap(
        env,
        long,
        short = 'a',
        value_parser = path_exists_full,
        use_value_delimiter = true,
        value_delimiter = ',',
        default_values_os_t = current_work_dir(),
        required = false
    )]
    pub(crate) artifact_directories: Vec<PathBuf>,

    /// Depth to walk the artifact directories
    #[clap(env, long, short = 'd', default_value = "2")]
    pub(crate) depth: usize,

    /// Absolute path to the govc binary
    #[clap(
        env,
        long,
        value_parser = parse_govc_binary,
        default_value_os_t = find_binary_on_path(GOVC_FILE_NAME),
        required = false
    )]
    pub(crate) govc_binary: PathBuf,

    /// Absolute path to the winrm binary
    #[clap(
        env,
        long,
        value_parser = parse_winrm_binary,
        default_value_os_t = find_binary_on_path(WINRM_FILE_NAME),
        required = false
    )]
    pub(crate) winrm_binary: PathBuf,

    /// Version handed to the setup script
    #[clap(env, long, default_value = env!("CARGO_PKG_VERSION"))]
    pub(crate) stembuild_version: String,
}

fn parse_vcenter_url(arg: &str) -> Result<Url, String> {
    let candidate = if arg.contains("://") {
        arg.to_string()
    } else {
        format!("https://{arg}")
    };
    let url = Url::parse(&candidate).map_err(|err| format!("{arg}: {err}"))?;
    if url.host_str().is_none() {
        return Err(format!("{arg}: missing host"));
    }
    Ok(url)
}

fn parse_inventory_path(arg: &str) -> Result<String, String> {
    if arg.starts_with('/') && arg.contains("/vm/") {
        Ok(arg.trim_end_matches('/').to_string())
    } else {
        Err(format!("{INVENTORY_PATH_ERROR}, Provided {arg}"))
    }
}

fn path_must_exist(arg: &str) -> Result<PathBuf, std::io::Error> {
    let path = PathBuf::from(arg);
    if path.try_exists()? {
        Ok(path)
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Path provided, does not exist: {arg}"),
        ))
    }
}

fn path_exists_full(arg: &str) -> Result<PathBuf, std::io::Error> {
    fs::canonicalize(path_must_exist(arg)?)
}

fn parse_absolute_path(arg: &str) -> Result<PathBuf, String> {
    path_exists_full(arg).map_err(|err| err.to_string())
}

// An empty value is the PATH lookup coming back empty handed.
fn parse_tool_binary(arg: &str, tool: &str) -> Result<PathBuf, String> {
    if arg.is_empty() {
        return Err(format!("{tool} not found on PATH, pass --{tool}-binary"));
    }
    parse_absolute_path(arg)
}

fn parse_govc_binary(arg: &str) -> Result<PathBuf, String> {
    parse_tool_binary(arg, "govc")
}

fn parse_winrm_binary(arg: &str) -> Result<PathBuf, String> {
    parse_tool_binary(arg, "winrm")
}

fn current_work_dir() -> Vec<PathBuf> {
    std::env::current_dir().into_iter().collect()
}
