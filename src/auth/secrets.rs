//! OAuth client secrets as downloaded from the Google Cloud console

use crate::error::{Result, ResumeTailorError};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ResumeTailorError::Auth(format!(
                "OAuth client file '{}' not found. Create a desktop OAuth client in the Google Cloud console and save its JSON there",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses either the "installed" (desktop) or "web" client layout.
    pub fn from_json(content: &str) -> Result<Self> {
        let file: SecretsFile = serde_json::from_str(content)
            .map_err(|e| ResumeTailorError::Auth(format!("Malformed OAuth client file: {}", e)))?;

        file.installed
            .or(file.web)
            .ok_or_else(|| ResumeTailorError::Auth("OAuth client file has no 'installed' or 'web' section".to_string()))
    }
}
