//! Document structures shared by the reader, the reconciliation engine and the writer

use crate::error::{Result, ResumeTailorError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character styles carried over from the source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleFlags {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyleFlags {
    pub const PLAIN: StyleFlags = StyleFlags {
        bold: false,
        italic: false,
        underline: false,
    };

    pub fn bold() -> Self {
        Self { bold: true, ..Self::PLAIN }
    }

    pub fn italic() -> Self {
        Self { italic: true, ..Self::PLAIN }
    }

    pub fn underline() -> Self {
        Self { underline: true, ..Self::PLAIN }
    }

    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline)
    }
}

/// A styled span of a block's text. `start..end` counts `char`s, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub start: usize,
    pub end: usize,
    pub style: StyleFlags,
}

impl TextRun {
    pub fn new(start: usize, end: usize, style: StyleFlags) -> Self {
        Self { start, end, style }
    }

    pub fn plain(start: usize, end: usize) -> Self {
        Self::new(start, end, StyleFlags::PLAIN)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_styled(&self) -> bool {
        !self.style.is_plain()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Heading,
    BulletItem,
    Paragraph,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Heading => write!(f, "heading"),
            BlockKind::BulletItem => write!(f, "bullet item"),
            BlockKind::Paragraph => write!(f, "paragraph"),
        }
    }
}

/// One structural unit of a document.
///
/// Heading level `0` is the document title style, `1..=6` map to the
/// numbered heading styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
        runs: Vec<TextRun>,
    },
    BulletItem {
        indent: usize,
        text: String,
        runs: Vec<TextRun>,
    },
    Paragraph {
        text: String,
        runs: Vec<TextRun>,
    },
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        let text = text.into();
        let runs = whole_text_run(&text, StyleFlags::PLAIN);
        Block::Heading { level, text, runs }
    }

    pub fn bullet(indent: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let runs = whole_text_run(&text, StyleFlags::PLAIN);
        Block::BulletItem { indent, text, runs }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        let text = text.into();
        let runs = whole_text_run(&text, StyleFlags::PLAIN);
        Block::Paragraph { text, runs }
    }

    /// Replace the runs with a single run of `style` covering the whole text.
    pub fn styled(mut self, style: StyleFlags) -> Self {
        let runs = whole_text_run(self.text(), style);
        *self.runs_mut() = runs;
        self
    }

    pub fn with_runs(mut self, runs: Vec<TextRun>) -> Self {
        *self.runs_mut() = runs;
        self
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Heading { .. } => BlockKind::Heading,
            Block::BulletItem { .. } => BlockKind::BulletItem,
            Block::Paragraph { .. } => BlockKind::Paragraph,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Block::Heading { text, .. }
            | Block::BulletItem { text, .. }
            | Block::Paragraph { text, .. } => text,
        }
    }

    pub fn runs(&self) -> &[TextRun] {
        match self {
            Block::Heading { runs, .. }
            | Block::BulletItem { runs, .. }
            | Block::Paragraph { runs, .. } => runs,
        }
    }

    fn runs_mut(&mut self) -> &mut Vec<TextRun> {
        match self {
            Block::Heading { runs, .. }
            | Block::BulletItem { runs, .. }
            | Block::Paragraph { runs, .. } => runs,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    pub fn styled_run_count(&self) -> usize {
        self.runs().iter().filter(|run| run.is_styled()).count()
    }

    /// Check that every run lies inside the text and that runs are ordered
    /// and non-overlapping.
    pub fn validate(&self) -> Result<()> {
        let len = self.char_len();
        let mut previous_end = 0;
        for (i, run) in self.runs().iter().enumerate() {
            if run.start > run.end || run.end > len {
                return Err(ResumeTailorError::Reconciliation(format!(
                    "run {} ({}..{}) lies outside {} '{}' of length {}",
                    i,
                    run.start,
                    run.end,
                    self.kind(),
                    self.text(),
                    len
                )));
            }
            if run.start < previous_end {
                return Err(ResumeTailorError::Reconciliation(format!(
                    "run {} ({}..{}) overlaps the previous run ending at {}",
                    i, run.start, run.end, previous_end
                )));
            }
            previous_end = run.end;
        }
        Ok(())
    }

    /// Plain-text rendering used in prompts and by the segmenter round trip.
    pub fn render(&self) -> String {
        match self {
            Block::Heading { text, .. } | Block::Paragraph { text, .. } => text.clone(),
            Block::BulletItem { indent, text, .. } => {
                format!("{}- {}", "  ".repeat(*indent), text)
            }
        }
    }
}

fn whole_text_run(text: &str, style: StyleFlags) -> Vec<TextRun> {
    let len = text.chars().count();
    if len == 0 {
        Vec::new()
    } else {
        vec![TextRun::new(0, len, style)]
    }
}

/// The résumé as fetched from the document service. Read-only after fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub document_id: String,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl SourceDocument {
    pub fn new(document_id: impl Into<String>, title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            document_id: document_id.into(),
            title: title.into(),
            blocks,
        }
    }

    /// The résumé as plain text, in the same shape the tailoring prompt asks
    /// the model to answer in.
    pub fn plain_text(&self) -> String {
        render_blocks(self.blocks.iter())
    }

    pub fn styled_run_count(&self) -> usize {
        self.blocks.iter().map(Block::styled_run_count).sum()
    }

    pub fn count_of(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.kind() == kind).count()
    }
}

/// A tailored block plus the index of the source block whose style it took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledBlock {
    pub block: Block,
    pub origin: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledDocument {
    pub source_id: String,
    pub blocks: Vec<ReconciledBlock>,
}

impl ReconciledDocument {
    pub fn styled_run_count(&self) -> usize {
        self.blocks.iter().map(|b| b.block.styled_run_count()).sum()
    }

    pub fn matched_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.origin.is_some()).count()
    }

    pub fn plain_text(&self) -> String {
        render_blocks(self.blocks.iter().map(|b| &b.block))
    }
}

/// Blocks separated by blank lines; consecutive bullets stay on adjacent lines.
fn render_blocks<'a>(blocks: impl Iterator<Item = &'a Block>) -> String {
    let mut out = String::new();
    let mut previous: Option<BlockKind> = None;
    for block in blocks {
        if let Some(prev) = previous {
            let both_bullets = prev == BlockKind::BulletItem && block.kind() == BlockKind::BulletItem;
            out.push_str(if both_bullets { "\n" } else { "\n\n" });
        }
        out.push_str(&block.render());
        previous = Some(block.kind());
    }
    out
}
