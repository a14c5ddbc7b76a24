//! Document service boundary: fetch, create and batch-update documents

pub mod api;
pub mod google;
pub mod writer;

use crate::error::Result;
use crate::input::link::document_url;
use crate::processing::document::SourceDocument;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use api::Request;
pub use google::GoogleDocsClient;
pub use writer::DocumentWriter;

/// A newly created document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub document_id: String,
    pub title: String,
}

impl DocumentHandle {
    pub fn url(&self) -> String {
        document_url(&self.document_id)
    }
}

#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Fetch structured content by id.
    async fn fetch(&self, document_id: &str) -> Result<SourceDocument>;

    /// Create an empty document.
    async fn create(&self, title: &str) -> Result<DocumentHandle>;

    /// Apply a batch of content/style operations, in order.
    async fn batch_update(&self, document_id: &str, requests: &[Request]) -> Result<()>;
}
