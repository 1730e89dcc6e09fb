/*++

Licensed under the Apache-2.0 license.

File Name:

    config.rs

Abstract:

    File contains utilities for parsing configuration files

--*/

use anyhow::{anyhow, Context};
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Key Configuration
#[derive(Default, Debug, Serialize, Deserialize)]
pub(crate) struct KeyConfig {
    /// Public key PEM path
    pub pub_key: Option<String>,

    /// Private key PEM path
    pub priv_key: Option<String>,
}

impl KeyConfig {
    /// Private key path, resolved against `base`
    pub fn priv_key_path(&self, base: &Path) -> anyhow::Result<PathBuf> {
        let path = self
            .priv_key
            .as_ref()
            .ok_or_else(|| anyhow!("priv_key not specified in key config"))?;
        Ok(base.join(path))
    }

    /// Public key path, resolved against `base`
    pub fn pub_key_path(&self, base: &Path) -> anyhow::Result<PathBuf> {
        let path = self
            .pub_key
            .as_ref()
            .ok_or_else(|| anyhow!("pub_key not specified in key config"))?;
        Ok(base.join(path))
    }
}

/// Load Key Configuration from file
pub(crate) fn load_key_config(path: &Path) -> anyhow::Result<KeyConfig> {
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read the config file {}", path.display()))?;

    let config: KeyConfig = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(config)
}

/// Directory relative key paths in a config file are resolved against
pub(crate) fn config_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_config() {
        let config: KeyConfig =
            toml::from_str("pub_key = \"keys/pub.pem\"\npriv_key = \"/abs/priv.pem\"\n").unwrap();
        let base = Path::new("/etc/bootimg");
        assert_eq!(
            config.pub_key_path(base).unwrap(),
            PathBuf::from("/etc/bootimg/keys/pub.pem")
        );
        assert_eq!(
            config.priv_key_path(base).unwrap(),
            PathBuf::from("/abs/priv.pem")
        );
    }

    #[test]
    fn test_missing_key() {
        let config: KeyConfig = toml::from_str("pub_key = \"pub.pem\"\n").unwrap();
        let err = config.priv_key_path(Path::new(".")).unwrap_err();
        assert_eq!(err.to_string(), "priv_key not specified in key config");
    }

    #[test]
    fn test_config_dir() {
        assert_eq!(
            config_dir(Path::new("/etc/bootimg/keys.toml")),
            PathBuf::from("/etc/bootimg")
        );
        assert_eq!(config_dir(Path::new("keys.toml")), PathBuf::from(""));
    }
}
