//! Google Docs v1 wire types: the parts of the document resource we read
//! and the batchUpdate requests we send

use crate::processing::document::StyleFlags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<RawBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBody {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// Tables, section breaks and tables of contents are skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct StructuralElement {
    pub paragraph: Option<RawParagraph>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParagraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
    pub paragraph_style: Option<RawParagraphStyle>,
    pub bullet: Option<RawBullet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    pub text_run: Option<RawTextRun>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTextRun {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub text_style: RawTextStyle,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTextStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
}

impl RawTextStyle {
    pub fn flags(&self) -> StyleFlags {
        StyleFlags {
            bold: self.bold.unwrap_or(false),
            italic: self.italic.unwrap_or(false),
            underline: self.underline.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParagraphStyle {
    pub named_style_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBullet {
    pub nesting_level: Option<usize>,
}

/// Google error envelope: `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateDocument<'a> {
    pub title: &'a str,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdate<'a> {
    pub requests: &'a [Request],
}

/// One batchUpdate operation; serializes as `{"insertText": {...}}` etc.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    InsertText(InsertText),
    UpdateTextStyle(UpdateTextStyle),
    UpdateParagraphStyle(UpdateParagraphStyle),
    CreateParagraphBullets(CreateParagraphBullets),
    DeleteParagraphBullets(DeleteParagraphBullets),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: usize,
    pub end_index: usize,
}

impl Range {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self { start_index, end_index }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertText {
    pub location: Location,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl From<StyleFlags> for TextStyle {
    fn from(flags: StyleFlags) -> Self {
        Self {
            bold: flags.bold,
            italic: flags.italic,
            underline: flags.underline,
        }
    }
}

pub const TEXT_STYLE_FIELDS: &str = "bold,italic,underline";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyle {
    pub range: Range,
    pub text_style: TextStyle,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub named_style_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParagraphStyle {
    pub range: Range,
    pub paragraph_style: ParagraphStyle,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParagraphBullets {
    pub range: Range,
    pub bullet_preset: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteParagraphBullets {
    pub range: Range,
}
