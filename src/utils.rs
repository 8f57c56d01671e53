use std::{
    env::{split_paths, var_os},
    error::Error,
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
    thread,
    time::Duration,
};

pub(crate) fn sleep(duration: Duration) {
    thread::sleep(duration);
}

pub(crate) fn find_binary_on_path(file_name: &str) -> PathBuf {
    if let Some(paths) = var_os("PATH") {
        for path in split_paths(&paths) {
            let full_path = path.join(file_name);
            if full_path.is_file() {
                return full_path;
            }
        }
    }
    PathBuf::new()
}

/// Output of an external tool that ran to completion.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub(crate) code: Option<i32>,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl ToolOutput {
    pub(crate) fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs `binary` to completion. Only `label` is logged since the arguments
/// may carry credentials.
pub(crate) fn run_tool<I, S>(binary: &Path, label: &str, args: I) -> Result<ToolOutput, Box<dyn Error>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    log::debug!("Running {} {}", binary.display(), label);
    let output = Command::new(binary)
        .args(args)
        .output()
        .map_err(|err| format!("failed to run {}: {err}", binary.display()))?;
    let result = ToolOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };
    log::debug!("{} {} exited with {:?}", binary.display(), label, result.code);
    Ok(result)
}
