use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8888/db";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    pub gateway_url: Option<String>,
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("CRM_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("crm").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn session_file() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("session.json"))
}

pub fn load_cli_config() -> anyhow::Result<CliConfig> {
    let config_file = get_config_dir()?.join("config.json");

    if !config_file.exists() {
        return Ok(CliConfig::default());
    }

    let content = fs::read_to_string(config_file)?;
    let config: CliConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Flag, then `CRM_GATEWAY_URL`, then `config.json`, then the local default.
pub fn resolve_gateway_url(flag: Option<String>) -> anyhow::Result<String> {
    if let Some(url) = flag {
        return Ok(url);
    }
    if let Ok(url) = std::env::var("CRM_GATEWAY_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    Ok(load_cli_config()?
        .gateway_url
        .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()))
}
