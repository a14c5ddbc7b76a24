//! Reconciliation: re-applies the source document's structure and character
//! styles to the tailored plain text.
//!
//! Matching is positional per block kind. The i-th tailored heading borrows
//! from the i-th source heading, the i-th bullet from the i-th source bullet,
//! and so on. There is no text alignment between old and new wording.

use crate::error::{Result, ResumeTailorError};
use crate::processing::document::{
    Block, BlockKind, ReconciledBlock, ReconciledDocument, SourceDocument, TextRun,
};
use crate::processing::segment::{Segmenter, Unit, UnitKind};
use log::{debug, info};

const DEFAULT_HEADING_LEVEL: u8 = 1;
const TITLE_LEVEL: u8 = 0;
const MAX_HEADING_LEVEL: usize = 6;

/// Source block indices of one kind, consumed front to back.
#[derive(Debug, Default)]
struct Lane {
    indices: Vec<usize>,
    cursor: usize,
}

impl Lane {
    fn advance(&mut self) -> Option<usize> {
        let index = self.indices.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(index)
    }
}

/// Per-kind cursors over the source blocks.
#[derive(Debug)]
struct BlockArena<'a> {
    blocks: &'a [Block],
    headings: Lane,
    bullets: Lane,
    paragraphs: Lane,
}

impl<'a> BlockArena<'a> {
    fn new(blocks: &'a [Block]) -> Self {
        let mut arena = Self {
            blocks,
            headings: Lane::default(),
            bullets: Lane::default(),
            paragraphs: Lane::default(),
        };
        for (index, block) in blocks.iter().enumerate() {
            arena.lane_mut(block.kind()).indices.push(index);
        }
        arena
    }

    fn lane_mut(&mut self, kind: BlockKind) -> &mut Lane {
        match kind {
            BlockKind::Heading => &mut self.headings,
            BlockKind::BulletItem => &mut self.bullets,
            BlockKind::Paragraph => &mut self.paragraphs,
        }
    }

    /// Next unused source block of `kind`, if any remain.
    fn next(&mut self, kind: BlockKind) -> Option<(usize, &'a Block)> {
        let blocks = self.blocks;
        let index = self.lane_mut(kind).advance()?;
        Some((index, &blocks[index]))
    }
}

/// Counts of numbered heading levels emitted so far. Title headings are not
/// counted.
#[derive(Debug, Default)]
struct LevelTally {
    counts: [usize; MAX_HEADING_LEVEL + 1],
}

impl LevelTally {
    fn record(&mut self, level: u8) {
        let level = level as usize;
        if level != TITLE_LEVEL as usize && level <= MAX_HEADING_LEVEL {
            self.counts[level] += 1;
        }
    }

    /// Most frequent level; ties go to the smaller level number.
    fn most_common(&self) -> Option<u8> {
        let mut best: Option<(usize, usize)> = None;
        for (level, &count) in self.counts.iter().enumerate().skip(1) {
            if count > 0 && best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((level, count));
            }
        }
        best.map(|(level, _)| level as u8)
    }
}

pub struct Reconciler {
    segmenter: Segmenter,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(Segmenter::default())
    }
}

impl Reconciler {
    pub fn new(segmenter: Segmenter) -> Self {
        Self { segmenter }
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    pub fn reconcile(&self, source: &SourceDocument, tailored_text: &str) -> Result<ReconciledDocument> {
        if tailored_text.trim().is_empty() {
            return Err(ResumeTailorError::EmptyTailoringResult);
        }

        let units = self.segmenter.segment(tailored_text);
        if units.is_empty() {
            return Err(ResumeTailorError::EmptyTailoringResult);
        }

        let mut arena = BlockArena::new(&source.blocks);
        let mut levels = LevelTally::default();
        let mut blocks = Vec::with_capacity(units.len());

        for (position, unit) in units.into_iter().enumerate() {
            let matched = arena.next(unit.block_kind());
            let reconciled = build_block(unit, matched, &mut levels);

            reconciled.block.validate().map_err(|e| {
                ResumeTailorError::Reconciliation(format!("unit {}: {}", position, e))
            })?;

            debug!(
                "Unit {} ({}) styled from {:?}",
                position,
                reconciled.block.kind(),
                reconciled.origin
            );
            blocks.push(reconciled);
        }

        let document = ReconciledDocument {
            source_id: source.document_id.clone(),
            blocks,
        };

        info!(
            "Reconciled {} blocks ({} matched to source styles)",
            document.blocks.len(),
            document.matched_count()
        );

        Ok(document)
    }
}

/// Reconcile with the default segmentation settings.
pub fn reconcile(source: &SourceDocument, tailored_text: &str) -> Result<ReconciledDocument> {
    Reconciler::default().reconcile(source, tailored_text)
}

fn build_block(unit: Unit, matched: Option<(usize, &Block)>, levels: &mut LevelTally) -> ReconciledBlock {
    let new_len = unit.text.chars().count();
    let runs = match matched {
        Some((_, source_block)) => remap_runs(source_block, new_len),
        None => plain_runs(new_len),
    };
    let origin = matched.map(|(index, _)| index);

    let block = match unit.kind {
        UnitKind::Heading => {
            let level = match matched {
                Some((_, Block::Heading { level, .. })) => *level,
                _ => levels.most_common().unwrap_or(DEFAULT_HEADING_LEVEL),
            };
            levels.record(level);
            Block::Heading { level, text: unit.text, runs }
        }
        UnitKind::BulletItem { indent } => Block::BulletItem { indent, text: unit.text, runs },
        UnitKind::Paragraph => Block::Paragraph { text: unit.text, runs },
    };

    ReconciledBlock { block, origin }
}

fn plain_runs(len: usize) -> Vec<TextRun> {
    if len == 0 {
        Vec::new()
    } else {
        vec![TextRun::plain(0, len)]
    }
}

/// Scale each source run onto a text of `new_len` chars by the ratio of the
/// lengths. Gaps become plain runs and touching runs with equal style merge,
/// so the result never holds more styled runs than the source block.
fn remap_runs(source: &Block, new_len: usize) -> Vec<TextRun> {
    let old_len = source.char_len();
    if new_len == 0 {
        return Vec::new();
    }
    if old_len == 0 {
        return plain_runs(new_len);
    }

    let scale = |offset: usize| -> usize {
        let scaled = (offset as f64 * new_len as f64 / old_len as f64).round() as usize;
        scaled.min(new_len)
    };

    let mut runs: Vec<TextRun> = Vec::new();
    let mut cursor = 0;
    for run in source.runs() {
        let start = scale(run.start).max(cursor);
        let end = scale(run.end).max(start);
        if start > cursor {
            push_run(&mut runs, TextRun::plain(cursor, start));
        }
        if end > start {
            push_run(&mut runs, TextRun::new(start, end, run.style));
        }
        cursor = cursor.max(end);
    }
    if cursor < new_len {
        push_run(&mut runs, TextRun::plain(cursor, new_len));
    }
    runs
}

fn push_run(runs: &mut Vec<TextRun>, run: TextRun) {
    if let Some(last) = runs.last_mut() {
        if last.style == run.style && last.end == run.start {
            last.end = run.end;
            return;
        }
    }
    runs.push(run);
}
