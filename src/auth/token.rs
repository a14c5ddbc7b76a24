//! The persisted OAuth token

use crate::error::{Result, ResumeTailorError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_SKEW_SECS: i64 = 60;
/// Used when the token endpoint omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// Token endpoint reply for both the code exchange and refresh grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredToken {
    /// Build from a token response. Refresh replies usually omit the refresh
    /// token, so the previous one is kept.
    pub fn from_response(response: TokenResponse, previous_refresh: Option<String>, now: DateTime<Utc>) -> Self {
        let lifetime = response.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: now + Duration::seconds(lifetime),
            scope: response.scope,
            token_type: response.token_type.unwrap_or_else(default_token_type),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().map_or(false, |t| !t.is_empty())
    }

    /// `Ok(None)` when no token file exists yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let token = serde_json::from_str(&content)
            .map_err(|e| ResumeTailorError::Auth(format!("Corrupt token file '{}': {}", path.display(), e)))?;
        Ok(Some(token))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        restrict_permissions(path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn response(refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: "ya29.new".to_string(),
            expires_in: Some(3599),
            refresh_token: refresh.map(str::to_string),
            scope: None,
            token_type: Some("Bearer".to_string()),
        }
    }

    #[test]
    fn test_refresh_reply_keeps_previous_refresh_token() {
        let now = Utc::now();
        let token = StoredToken::from_response(response(None), Some("1//old".to_string()), now);
        assert_eq!(token.refresh_token.as_deref(), Some("1//old"));
        assert_eq!(token.expires_at, now + Duration::seconds(3599));
    }

    #[test]
    fn test_expiry_includes_skew() {
        let now = Utc::now();
        let token = StoredToken::from_response(response(Some("r")), None, now);
        assert!(!token.is_expired(now));
        assert!(token.is_expired(now + Duration::seconds(3599 - 30)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        let token = StoredToken::from_response(response(Some("r")), None, Utc::now());

        token.save(&path).unwrap();
        assert_eq!(StoredToken::load(&path).unwrap(), Some(token));
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        assert_eq!(StoredToken::load(&path).unwrap(), None);

        std::fs::write(&path, b"\x80\x04pickle").unwrap();
        assert!(StoredToken::load(&path).is_err());
    }
}
