use std::{error::Error, time::Duration};

use reqwest::blocking::Client;
use url::Url;

use crate::govc::GovcClient;

pub(crate) const INVALID_URL_ERROR: &str = "please provide a valid vCenter URL";

pub(crate) const INVALID_VM_PATH_ERROR: &str = "VM path is invalid\nPlease make sure to format your inventory path correctly using the 'vm' keyword. Example: /my-datacenter/vm/my-folder/my-vm-name";

/// Checks the vCenter endpoint, the vCenter credentials and the VM inventory
/// path before anything touches the guest.
pub(crate) fn validate_source_parameters(
    url: &Url,
    insecure: bool,
    client: &GovcClient,
    vm_inventory_path: &str,
) -> Result<(), Box<dyn Error>> {
    if let Err(err) = check_url_reachable(url, insecure) {
        log::debug!("vCenter URL check failed with {err}");
        return Err(INVALID_URL_ERROR.into());
    }
    validate_vcenter_access(url, client, vm_inventory_path)
}

/// The govc side of the pre-flight: credentials first, then the VM lookup.
fn validate_vcenter_access(
    url: &Url,
    client: &GovcClient,
    vm_inventory_path: &str,
) -> Result<(), Box<dyn Error>> {
    if let Err(err) = client.validate_credentials() {
        log::debug!("vCenter login failed with {err}");
        return Err(format!("please provide valid credentials for {url}").into());
    }
    if let Err(err) = client.find_vm(vm_inventory_path) {
        log::debug!("VM lookup failed with {err}");
        return Err(INVALID_VM_PATH_ERROR.into());
    }
    Ok(())
}

/// Any HTTP answer counts, including auth failures, the point is that
/// something is listening at `url`.
fn check_url_reachable(url: &Url, insecure: bool) -> Result<(), Box<dyn Error>> {
    let client = Client::builder()
        .danger_accept_invalid_certs(insecure)
        .timeout(Duration::from_secs(30))
        .build()?;
    let response = client.get(url.clone()).send()?;
    log::debug!("vCenter answered with {}", response.status());
    Ok(())
}
