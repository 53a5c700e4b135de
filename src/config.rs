use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

/// Backend used when neither --backend, the environment, nor the config
/// file names one.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Local client configuration, read from the user config directory. The
/// backend-held settings (n8n credentials, model name) are edited through
/// the Config screen instead and never touch this file.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub backend_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("flowdeck").join("config.json"))
    }

    /// Log file location for TUI runs, next to the config file.
    pub fn log_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("flowdeck").join("flowdeck.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.backend_url, None);
    }

    #[test]
    fn test_loads_backend_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"backend_url": "http://agent.local:3001"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.backend_url.as_deref(),
            Some("http://agent.local:3001")
        );
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
