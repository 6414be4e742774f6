use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CliConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub drafts_path: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:3000".to_string(),
            },
            storage: StorageConfig {
                drafts_path: get_default_drafts_path(),
            },
        }
    }
}

impl CliConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        // Create default config file if it doesn't exist
        if !config_path.exists() {
            let default_config = r#"
[backend]
base_url = "http://localhost:3000"

[storage]
drafts_path = "~/.local/share/attest/drafts.db"
"#;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        Self::load_from_file(&config_path)
    }

    pub fn load_from_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::Message(format!(
                "Configuration file not found: {}",
                config_path.display()
            )));
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .build()?;

        let mut config: CliConfig = builder.try_deserialize()?;

        // Expand tilde in the drafts database path
        if config.storage.drafts_path.starts_with("~") {
            if let Some(home) = home::home_dir() {
                let path_str = config.storage.drafts_path.to_string_lossy();
                let expanded = path_str.replacen("~", &home.to_string_lossy(), 1);
                config.storage.drafts_path = PathBuf::from(expanded);
            }
        }

        Ok(config)
    }
}

fn get_config_path() -> PathBuf {
    if let Some(home) = home::home_dir() {
        home.join(".config/attest/cli.toml")
    } else {
        PathBuf::from("cli.toml")
    }
}

fn get_default_drafts_path() -> PathBuf {
    if let Some(home) = home::home_dir() {
        home.join(".local/share/attest/drafts.db")
    } else {
        PathBuf::from("drafts.db")
    }
}
