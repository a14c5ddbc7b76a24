//! Google session: load, refresh and persist the OAuth token

use crate::auth::oauth;
use crate::auth::secrets::ClientSecrets;
use crate::auth::token::StoredToken;
use crate::config::GoogleConfig;
use crate::error::{Result, ResumeTailorError};
use chrono::Utc;
use log::{info, warn};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process-wide credential state, passed explicitly to the document client.
pub struct Session {
    http: Client,
    credentials_path: PathBuf,
    token_path: PathBuf,
    scopes: Vec<String>,
    secrets: Option<ClientSecrets>,
    token: Option<StoredToken>,
}

impl Session {
    /// Read the persisted token, if any. A token file that cannot be parsed
    /// is deleted so the next `access_token` call re-authorizes.
    pub fn load(config: &GoogleConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let token = match StoredToken::load(&config.token_path) {
            Ok(token) => token,
            Err(e) => {
                warn!("Error reading {}: {}", config.token_path.display(), e);
                Self::remove_token_file(&config.token_path)?;
                None
            }
        };

        Ok(Self {
            http,
            credentials_path: config.credentials_path.clone(),
            token_path: config.token_path.clone(),
            scopes: config.scopes.clone(),
            secrets: None,
            token,
        })
    }

    pub fn token(&self) -> Option<&StoredToken> {
        self.token.as_ref()
    }

    /// A valid access token, refreshing or re-authorizing as needed.
    pub async fn access_token(&mut self) -> Result<String> {
        let now = Utc::now();
        let (expired, refreshable) = match &self.token {
            Some(token) => (token.is_expired(now), token.can_refresh()),
            None => (true, false),
        };

        if !expired {
            if let Some(token) = &self.token {
                return Ok(token.access_token.clone());
            }
        }

        if refreshable {
            match self.refresh().await {
                Ok(()) => return self.current_token(),
                Err(e) => {
                    warn!("Error refreshing token: {}", e);
                    Self::remove_token_file(&self.token_path)?;
                    self.token = None;
                }
            }
        }

        self.authorize().await?;
        self.current_token()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let refresh_token = self
            .token
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or_else(|| ResumeTailorError::Auth("No refresh token available".to_string()))?;

        info!("Refreshing expired token...");
        let secrets = self.secrets()?.clone();
        let response = oauth::refresh(&self.http, &secrets, &refresh_token).await?;
        self.token = Some(StoredToken::from_response(response, Some(refresh_token), Utc::now()));
        self.persist()
    }

    /// Run the browser consent flow and persist the new token.
    pub async fn authorize(&mut self) -> Result<()> {
        info!("Getting new token...");
        let secrets = self.secrets()?.clone();
        let response = oauth::authorize(&self.http, &secrets, &self.scopes).await?;
        self.token = Some(StoredToken::from_response(response, None, Utc::now()));
        self.persist()
    }

    pub fn persist(&self) -> Result<()> {
        match &self.token {
            Some(token) => token.save(&self.token_path),
            None => Ok(()),
        }
    }

    /// Delete a persisted token. Returns whether a file was removed.
    pub fn remove_token_file(path: &Path) -> Result<bool> {
        if path.exists() {
            info!("Removing token file {}", path.display());
            std::fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn current_token(&self) -> Result<String> {
        self.token
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or_else(|| ResumeTailorError::Auth("No access token after authorization".to_string()))
    }

    fn secrets(&mut self) -> Result<&ClientSecrets> {
        if self.secrets.is_none() {
            self.secrets = Some(ClientSecrets::load(&self.credentials_path)?);
        }
        self.secrets
            .as_ref()
            .ok_or_else(|| ResumeTailorError::Auth("OAuth client secrets unavailable".to_string()))
    }
}
