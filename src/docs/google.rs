//! Google Docs REST client and conversion of the fetched document into blocks

use crate::auth::TokenSource;
use crate::config::GoogleConfig;
use crate::docs::api::{ApiError, BatchUpdate, CreateDocument, RawDocument, RawParagraph, Request};
use crate::docs::{DocumentHandle, DocumentService};
use crate::error::{Result, ResumeTailorError};
use crate::processing::document::{Block, SourceDocument, TextRun};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;

/// Soft line break inside a paragraph (shift+enter).
pub const VERTICAL_TAB: char = '\u{000b}';

const MAX_NAMED_HEADING: u8 = 6;

pub struct GoogleDocsClient<T: TokenSource> {
    http: Client,
    api_base: String,
    tokens: Mutex<T>,
}

impl<T: TokenSource> GoogleDocsClient<T> {
    pub fn new(tokens: T, config: &GoogleConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base: config.docs_api_base.trim_end_matches('/').to_string(),
            tokens: Mutex::new(tokens),
        })
    }

    async fn bearer_token(&self) -> Result<String> {
        self.tokens.lock().await.bearer_token().await
    }

    fn documents_url(&self) -> String {
        format!("{}/documents", self.api_base)
    }
}

#[async_trait]
impl<T: TokenSource> DocumentService for GoogleDocsClient<T> {
    async fn fetch(&self, document_id: &str) -> Result<SourceDocument> {
        let token = self.bearer_token().await?;
        let url = format!("{}/{}", self.documents_url(), document_id);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ResumeTailorError::DocumentRead(e.to_string()))?;

        let raw: RawDocument = read_json(response, ResumeTailorError::DocumentRead).await?;
        let document = parse_document(raw);
        info!(
            "Fetched '{}' ({} blocks, {} styled runs)",
            document.title,
            document.blocks.len(),
            document.styled_run_count()
        );
        Ok(document)
    }

    async fn create(&self, title: &str) -> Result<DocumentHandle> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Created {
            document_id: String,
            title: Option<String>,
        }

        let token = self.bearer_token().await?;
        let response = self
            .http
            .post(self.documents_url())
            .bearer_auth(token)
            .json(&CreateDocument { title })
            .send()
            .await?;

        let created: Created = read_json(response, ResumeTailorError::DocumentService).await?;
        info!("Created document {}", created.document_id);
        Ok(DocumentHandle {
            document_id: created.document_id,
            title: created.title.unwrap_or_else(|| title.to_string()),
        })
    }

    async fn batch_update(&self, document_id: &str, requests: &[Request]) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }

        let token = self.bearer_token().await?;
        let url = format!("{}/{}:batchUpdate", self.documents_url(), document_id);
        debug!("POST {} ({} requests)", url, requests.len());

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&BatchUpdate { requests })
            .send()
            .await?;

        let _: serde_json::Value = read_json(response, ResumeTailorError::DocumentService).await?;
        Ok(())
    }
}

/// Decode a JSON body, mapping HTTP failures through `on_error`. 401 and 403
/// are always reported as authentication errors.
async fn read_json<D, F>(response: Response, on_error: F) -> Result<D>
where
    D: serde::de::DeserializeOwned,
    F: Fn(String) -> ResumeTailorError,
{
    let status = response.status();
    let body = response.text().await.map_err(|e| on_error(e.to_string()))?;

    if !status.is_success() {
        let message = api_error_message(status, &body);
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ResumeTailorError::Auth(message),
            _ => on_error(message),
        });
    }

    serde_json::from_str(&body).map_err(|e| on_error(format!("malformed response: {}", e)))
}

fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api) => match api.error.status {
            Some(kind) => format!("{} ({}): {}", status.as_u16(), kind, api.error.message),
            None => format!("{}: {}", status.as_u16(), api.error.message),
        },
        Err(_) => format!("{}: {}", status.as_u16(), body.trim()),
    }
}

/// Convert the raw document body into blocks. Non-paragraph elements and
/// empty paragraphs are skipped.
pub fn parse_document(raw: RawDocument) -> SourceDocument {
    let blocks = raw
        .body
        .map(|body| body.content)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|element| element.paragraph)
        .filter_map(|paragraph| parse_paragraph(&paragraph))
        .collect();

    SourceDocument::new(raw.document_id, raw.title, blocks)
}

fn parse_paragraph(paragraph: &RawParagraph) -> Option<Block> {
    let mut text = String::new();
    let mut runs: Vec<TextRun> = Vec::new();
    let mut offset = 0;

    for run in paragraph.elements.iter().filter_map(|e| e.text_run.as_ref()) {
        let content: String = run
            .content
            .chars()
            .map(|c| if c == VERTICAL_TAB { '\n' } else { c })
            .collect();
        let len = content.chars().count();
        if len == 0 {
            continue;
        }
        push_merged(&mut runs, TextRun::new(offset, offset + len, run.text_style.flags()));
        text.push_str(&content);
        offset += len;
    }

    // Every paragraph ends with its own newline.
    if text.ends_with('\n') {
        text.pop();
    }
    if text.trim().is_empty() {
        return None;
    }

    let len = text.chars().count();
    let runs = runs
        .into_iter()
        .filter(|run| run.start < len)
        .map(|run| TextRun::new(run.start, run.end.min(len), run.style))
        .collect::<Vec<_>>();

    let block = match (&paragraph.bullet, named_style(paragraph)) {
        (Some(bullet), _) => Block::bullet(bullet.nesting_level.unwrap_or(0), text),
        (None, Some(style)) => match heading_level(style) {
            Some(level) => Block::heading(level, text),
            None => Block::paragraph(text),
        },
        (None, None) => Block::paragraph(text),
    };
    Some(block.with_runs(runs))
}

fn named_style(paragraph: &RawParagraph) -> Option<&str> {
    paragraph
        .paragraph_style
        .as_ref()
        .and_then(|style| style.named_style_type.as_deref())
}

/// `TITLE` is level 0 and `SUBTITLE` reads as level 2.
pub fn heading_level(named_style: &str) -> Option<u8> {
    match named_style {
        "TITLE" => Some(0),
        "SUBTITLE" => Some(2),
        other => other
            .strip_prefix("HEADING_")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|level| (1..=MAX_NAMED_HEADING).contains(level)),
    }
}

fn push_merged(runs: &mut Vec<TextRun>, run: TextRun) {
    if let Some(last) = runs.last_mut() {
        if last.style == run.style && last.end == run.start {
            last.end = run.end;
            return;
        }
    }
    runs.push(run);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::document::{BlockKind, StyleFlags};

    fn parse(json: &str) -> SourceDocument {
        parse_document(serde_json::from_str(json).unwrap())
    }

    const SAMPLE: &str = r#"{
        "documentId": "doc-1",
        "title": "Jane Doe Resume",
        "body": {"content": [
            {"sectionBreak": {}},
            {"paragraph": {
                "elements": [{"textRun": {"content": "Jane Doe\n", "textStyle": {"bold": true}}}],
                "paragraphStyle": {"namedStyleType": "TITLE"}
            }},
            {"paragraph": {
                "elements": [{"textRun": {"content": "Experience\n", "textStyle": {}}}],
                "paragraphStyle": {"namedStyleType": "HEADING_2"}
            }},
            {"paragraph": {
                "elements": [
                    {"textRun": {"content": "Acme", "textStyle": {"bold": true}}},
                    {"textRun": {"content": " - built tools\n", "textStyle": {}}}
                ],
                "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"},
                "bullet": {"listId": "kix.1", "nestingLevel": 1}
            }},
            {"paragraph": {
                "elements": [{"textRun": {"content": "\n", "textStyle": {}}}],
                "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"}
            }},
            {"paragraph": {
                "elements": [{"textRun": {"content": "Line one\u000bline two\n", "textStyle": {"italic": true}}}],
                "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"}
            }},
            {"table": {}}
        ]}
    }"#;

    #[test]
    fn test_parse_document_blocks() {
        let doc = parse(SAMPLE);
        assert_eq!(doc.document_id, "doc-1");
        assert_eq!(doc.title, "Jane Doe Resume");
        assert_eq!(doc.blocks.len(), 4);

        assert!(matches!(&doc.blocks[0], Block::Heading { level: 0, text, .. } if text == "Jane Doe"));
        assert_eq!(doc.blocks[0].runs(), &[TextRun::new(0, 8, StyleFlags::bold())]);
        assert!(matches!(&doc.blocks[1], Block::Heading { level: 2, .. }));
        assert_eq!(doc.blocks[3].kind(), BlockKind::Paragraph);
    }

    #[test]
    fn test_bullet_runs_and_nesting() {
        let doc = parse(SAMPLE);
        match &doc.blocks[2] {
            Block::BulletItem { indent, text, runs } => {
                assert_eq!(*indent, 1);
                assert_eq!(text, "Acme - built tools");
                assert_eq!(
                    runs,
                    &vec![TextRun::new(0, 4, StyleFlags::bold()), TextRun::plain(4, 18)]
                );
            }
            other => panic!("expected bullet, got {:?}", other),
        }
    }

    #[test]
    fn test_soft_breaks_become_newlines() {
        let doc = parse(SAMPLE);
        assert_eq!(doc.blocks[3].text(), "Line one\nline two");
        assert_eq!(doc.blocks[3].runs(), &[TextRun::new(0, 17, StyleFlags::italic())]);
        assert!(doc.blocks[3].validate().is_ok());
    }

    #[test]
    fn test_adjacent_equal_runs_merge() {
        let doc = parse(
            r#"{"documentId": "d", "body": {"content": [{"paragraph": {"elements": [
                {"textRun": {"content": "Rust ", "textStyle": {"bold": true}}},
                {"textRun": {"content": "engineer\n", "textStyle": {"bold": true}}}
            ]}}]}}"#,
        );
        assert_eq!(doc.blocks[0].runs(), &[TextRun::new(0, 13, StyleFlags::bold())]);
    }

    #[test]
    fn test_missing_body_is_empty_document() {
        let doc = parse(r#"{"documentId": "d", "title": "Empty"}"#);
        assert!(doc.blocks.is_empty());
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(heading_level("TITLE"), Some(0));
        assert_eq!(heading_level("SUBTITLE"), Some(2));
        assert_eq!(heading_level("HEADING_4"), Some(4));
        assert_eq!(heading_level("HEADING_9"), None);
        assert_eq!(heading_level("NORMAL_TEXT"), None);
    }

    #[test]
    fn test_api_error_message_prefers_google_envelope() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        assert_eq!(
            api_error_message(StatusCode::NOT_FOUND, body),
            "404 (NOT_FOUND): Requested entity was not found."
        );
        assert_eq!(api_error_message(StatusCode::BAD_GATEWAY, "oops "), "502: oops");
    }
}
