//! Google credentials: client secrets, the persisted token and the OAuth flow

pub mod oauth;
pub mod secrets;
pub mod session;
pub mod token;

use crate::error::Result;
use async_trait::async_trait;

pub use secrets::ClientSecrets;
pub use session::Session;
pub use token::StoredToken;

/// Anything that can hand out a bearer token for the document service.
#[async_trait]
pub trait TokenSource: Send {
    async fn bearer_token(&mut self) -> Result<String>;
}

/// A fixed, pre-issued access token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn bearer_token(&mut self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[async_trait]
impl TokenSource for Session {
    async fn bearer_token(&mut self) -> Result<String> {
        self.access_token().await
    }
}
