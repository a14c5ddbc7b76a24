//! Writes a reconciled document into a new document, one block per batch

use crate::docs::api::{
    CreateParagraphBullets, DeleteParagraphBullets, InsertText, Location, ParagraphStyle, Range,
    Request, TextStyle, UpdateParagraphStyle, UpdateTextStyle, TEXT_STYLE_FIELDS,
};
use crate::docs::google::VERTICAL_TAB;
use crate::docs::{DocumentHandle, DocumentService};
use crate::error::{Result, ResumeTailorError};
use crate::processing::document::{Block, BlockKind, ReconciledDocument, StyleFlags};
use log::{debug, info};

/// The body of a new document starts at index 1.
pub const BODY_START_INDEX: usize = 1;
pub const BULLET_PRESET: &str = "BULLET_DISC_CIRCLE_SQUARE";
/// Deepest list nesting level the Docs API accepts.
pub const MAX_NESTING_LEVEL: usize = 8;

pub struct DocumentWriter<'a, S: DocumentService + ?Sized> {
    service: &'a S,
}

impl<'a, S: DocumentService + ?Sized> DocumentWriter<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Create `title` and append every block in order. Stops at the first
    /// block the service rejects; blocks already written stay in place.
    pub async fn write(&self, title: &str, document: &ReconciledDocument) -> Result<DocumentHandle> {
        let handle = self.service.create(title).await?;

        let mut cursor = BODY_START_INDEX;
        let mut previous = None;
        for (index, reconciled) in document.blocks.iter().enumerate() {
            let block = &reconciled.block;
            let (requests, next_cursor) = block_requests(block, cursor, previous);
            debug!("Block {} ({}) at {}: {} requests", index, block.kind(), cursor, requests.len());

            self.service
                .batch_update(&handle.document_id, &requests)
                .await
                .map_err(|e| ResumeTailorError::DocumentWrite {
                    index,
                    kind: block.kind(),
                    message: e.to_string(),
                })?;

            cursor = next_cursor;
            previous = Some(block.kind());
        }

        info!("Wrote {} blocks to {}", document.blocks.len(), handle.document_id);
        Ok(handle)
    }
}

/// Requests that append `block` at `cursor`, plus the cursor for the next
/// block.
///
/// Order: insert text, reset character styles, apply styled runs, clear a
/// bullet inherited from the previous paragraph, set the named paragraph
/// style, then create bullets. Bullet nesting is expressed with leading tabs,
/// which the bullet request consumes, so they do not count toward the next
/// cursor.
pub fn block_requests(block: &Block, cursor: usize, previous: Option<BlockKind>) -> (Vec<Request>, usize) {
    let body: String = block
        .text()
        .chars()
        .map(|c| if c == '\n' { VERTICAL_TAB } else { c })
        .collect();
    let tabs = match block {
        Block::BulletItem { indent, .. } => (*indent).min(MAX_NESTING_LEVEL),
        _ => 0,
    };
    let offsets = utf16_offsets(&body);
    let body_len = offsets.last().copied().unwrap_or(0);
    let text_start = cursor + tabs;
    let paragraph = Range::new(cursor, text_start + body_len + 1);

    let mut requests = vec![Request::InsertText(InsertText {
        location: Location { index: cursor },
        text: format!("{}{}\n", "\t".repeat(tabs), body),
    })];

    if body_len > 0 {
        requests.push(text_style(Range::new(text_start, text_start + body_len), StyleFlags::PLAIN));
    }

    for run in block.runs().iter().filter(|run| run.is_styled()) {
        let start = offsets[run.start.min(offsets.len() - 1)];
        let end = offsets[run.end.min(offsets.len() - 1)];
        if end > start {
            requests.push(text_style(Range::new(text_start + start, text_start + end), run.style));
        }
    }

    if previous == Some(BlockKind::BulletItem) {
        requests.push(Request::DeleteParagraphBullets(DeleteParagraphBullets { range: paragraph }));
    }

    requests.push(Request::UpdateParagraphStyle(UpdateParagraphStyle {
        range: paragraph,
        paragraph_style: ParagraphStyle {
            named_style_type: named_style_type(block),
        },
        fields: "namedStyleType".to_string(),
    }));

    if block.kind() == BlockKind::BulletItem {
        requests.push(Request::CreateParagraphBullets(CreateParagraphBullets {
            range: paragraph,
            bullet_preset: BULLET_PRESET.to_string(),
        }));
    }

    (requests, cursor + body_len + 1)
}

fn text_style(range: Range, style: StyleFlags) -> Request {
    Request::UpdateTextStyle(UpdateTextStyle {
        range,
        text_style: TextStyle::from(style),
        fields: TEXT_STYLE_FIELDS.to_string(),
    })
}

pub fn named_style_type(block: &Block) -> String {
    match block {
        Block::Heading { level: 0, .. } => "TITLE".to_string(),
        Block::Heading { level, .. } => format!("HEADING_{}", level),
        Block::BulletItem { .. } | Block::Paragraph { .. } => "NORMAL_TEXT".to_string(),
    }
}

/// UTF-16 offset of every char boundary, including the end of the text.
fn utf16_offsets(text: &str) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(text.len() + 1);
    let mut offset = 0;
    offsets.push(offset);
    for c in text.chars() {
        offset += c.len_utf16();
        offsets.push(offset);
    }
    offsets
}
