use base64::{engine::general_purpose::STANDARD, Engine};

/// Encodes a PowerShell command for `powershell.exe -EncodedCommand`, which
/// expects base64 over UTF-16LE text.
pub(crate) fn encode_powershell_command(command: &str) -> String {
    let bytes: Vec<u8> = command
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    STANDARD.encode(bytes)
}
