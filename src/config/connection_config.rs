use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

use crate::config::meta::Metadata;

pub(crate) const CONNECTION_CONFIG_LOCATION: &str = "connection";

/// Transport settings that rarely change between runs.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ConnectionConfig {
    pub(crate) winrm_port: u16,
    pub(crate) winrm_https: bool,
    /// Skip TLS verification for vCenter and WinRM over https
    pub(crate) insecure: bool,
    pub(crate) reach_timeout_seconds: u64,
    pub(crate) metadata: Metadata,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            winrm_port: 5985,
            winrm_https: false,
            insecure: false,
            reach_timeout_seconds: 30,
            metadata: Metadata::default(),
        }
    }
}

impl ConnectionConfig {
    pub(crate) fn reach_timeout(&self) -> Duration {
        Duration::from_secs(self.reach_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use pretty_assertions::assert_eq;
    use std::{error::Error, path::Path};

    #[test]
    fn load_config() -> Result<(), Box<dyn Error>> {
        let root = std::env::current_dir()?;
        let config_path = Path::join(&root, Path::new("example_config.toml"));
        let config: ConnectionConfig = confy::load_path(config_path)?;
        let mut expected = ConnectionConfig::default();
        expected.metadata = config.metadata.clone();
        assert_eq!(expected, config);
        assert_eq!(config.reach_timeout(), Duration::from_secs(30));
        Ok(())
    }

    #[test]
    fn stale_metadata_is_not_current() {
        let mut config = ConnectionConfig::default();
        assert!(config.metadata.is_current());
        config.metadata.stembuild_version = "0.0.1".to_string();
        assert!(!config.metadata.is_current());
    }
}
