use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Stamped into the stored config so a config written by another version is
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Metadata {
    pub(crate) stembuild_version: String,
    pub(crate) created: SystemTime,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            stembuild_version: env!("CARGO_PKG_VERSION").to_string(),
            created: SystemTime::now(),
        }
    }
}

impl Metadata {
    pub(crate) fn is_current(&self) -> bool {
        self.stembuild_version == env!("CARGO_PKG_VERSION")
    }
}
