use crate::error::{Result, SedekahError};
use sedekah_qr_common::SuggestionPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const GEOCODER_URL_ENV: &str = "SEDEKAH_GEOCODER_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geocoder_url: String,
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_seconds: u64,
    pub name_suggestion: SuggestionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoder_url: "https://nominatim.openstreetmap.org/reverse".into(),
            user_agent: format!("sedekah-qr/{}", env!("CARGO_PKG_VERSION")),
            accept_language: "ms,en".into(),
            timeout_seconds: 10,
            name_suggestion: SuggestionPolicy::Loose,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        // Environment wins over the file
        if let Ok(url) = std::env::var(GEOCODER_URL_ENV) {
            if !url.trim().is_empty() {
                config.geocoder_url = url;
            }
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SedekahError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("sedekah-qr").join("config.json"))
    }

    pub fn set_geocoder_url(&mut self, url: String) -> Result<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SedekahError::Config(format!("geocoder URL must be http(s): {}", url)));
        }
        self.geocoder_url = url;
        self.save()
    }

    pub fn set_name_suggestion(&mut self, policy: SuggestionPolicy) -> Result<()> {
        self.name_suggestion = policy;
        self.save()
    }
}
