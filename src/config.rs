//! Configuration management for the resume tailor

use crate::error::{Result, ResumeTailorError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const GOOGLE_ACCESS_TOKEN_VAR: &str = "GOOGLE_ACCESS_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub generation: GenerationConfig,
    pub google: GoogleConfig,
    pub posting: PostingConfig,
    pub segmentation: SegmentationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub docs_api_base: String,
    pub scopes: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingConfig {
    pub default_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Lines shorter than this (in graphemes) may be headings.
    pub heading_max_chars: usize,
    /// Columns of leading whitespace per bullet nesting level.
    pub indent_width: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            heading_max_chars: 60,
            indent_width: 2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: GenerationConfig {
                model: "gpt-4o-mini".to_string(),
                api_base: "https://api.openai.com/v1".to_string(),
                max_tokens: 4096,
                timeout_secs: 120,
            },
            google: GoogleConfig {
                credentials_path: PathBuf::from("credentials.json"),
                token_path: PathBuf::from("token.json"),
                docs_api_base: "https://docs.googleapis.com/v1".to_string(),
                scopes: vec!["https://www.googleapis.com/auth/documents".to_string()],
                timeout_secs: 60,
            },
            posting: PostingConfig {
                default_path: PathBuf::from("job_posting.txt"),
            },
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file is created with the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ResumeTailorError::Configuration(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeTailorError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-tailor")
            .join("config.toml")
    }
}

/// Load `.env` if present; a missing file is not an error.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

pub fn openai_api_key() -> Result<String> {
    Ok(require_env(OPENAI_API_KEY_VAR)?)
}

/// Pre-issued Google access token, bypassing the OAuth flow.
pub fn google_access_token() -> Option<String> {
    std::env::var(GOOGLE_ACCESS_TOKEN_VAR)
        .ok()
        .filter(|token| !token.trim().is_empty())
}

fn require_env(key: &str) -> anyhow::Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.posting.default_path, PathBuf::from("job_posting.txt"));
    }

    #[test]
    fn test_round_trip_keeps_custom_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.segmentation.heading_max_chars = 42;
        config.google.token_path = PathBuf::from("/tmp/tok.json");
        config.save_to(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.segmentation.heading_max_chars, 42);
        assert_eq!(loaded.google.token_path, PathBuf::from("/tmp/tok.json"));
    }

    #[test]
    fn test_malformed_config_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "generation = 5").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ResumeTailorError::Configuration(_))
        ));
    }
}
