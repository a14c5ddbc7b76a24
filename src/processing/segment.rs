//! Line classification: splits the model's plain-text reply into headings,
//! bullet items and paragraphs

use crate::config::SegmentationConfig;
use crate::processing::document::BlockKind;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

const TERMINAL_PUNCTUATION: [char; 5] = ['.', '!', '?', ',', ';'];
const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    Heading,
    BulletItem { indent: usize },
    Paragraph,
}

/// One logical unit of tailored text, before any styling is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub kind: UnitKind,
    pub text: String,
}

impl Unit {
    pub fn heading(text: impl Into<String>) -> Self {
        Self { kind: UnitKind::Heading, text: text.into() }
    }

    pub fn bullet(indent: usize, text: impl Into<String>) -> Self {
        Self { kind: UnitKind::BulletItem { indent }, text: text.into() }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self { kind: UnitKind::Paragraph, text: text.into() }
    }

    pub fn block_kind(&self) -> BlockKind {
        match self.kind {
            UnitKind::Heading => BlockKind::Heading,
            UnitKind::BulletItem { .. } => BlockKind::BulletItem,
            UnitKind::Paragraph => BlockKind::Paragraph,
        }
    }

    /// Render back to the line form the segmenter reads.
    pub fn render(&self, indent_width: usize) -> String {
        match self.kind {
            UnitKind::BulletItem { indent } => {
                format!("{}- {}", " ".repeat(indent * indent_width), self.text)
            }
            UnitKind::Heading | UnitKind::Paragraph => self.text.clone(),
        }
    }
}

pub struct Segmenter {
    bullet_regex: Regex,
    heading_max_chars: usize,
    indent_width: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(&SegmentationConfig::default())
    }
}

impl Segmenter {
    pub fn new(config: &SegmentationConfig) -> Self {
        let bullet_regex = Regex::new(r"^([ \t]*)(?:[-*•]|\d{1,3}[.)])[ \t]+(\S.*)$")
            .expect("Invalid bullet regex");

        Self {
            bullet_regex,
            heading_max_chars: config.heading_max_chars,
            indent_width: config.indent_width.max(1),
        }
    }

    /// Split text into units.
    ///
    /// A blank line closes the open paragraph. Bullet lines and headings are
    /// always single-line units; every other line joins the open paragraph,
    /// with the original line breaks kept as `\n`.
    pub fn segment(&self, text: &str) -> Vec<Unit> {
        let mut units = Vec::new();
        let mut open_paragraph: Vec<String> = Vec::new();

        for raw_line in text.lines() {
            let line = raw_line.trim_end();
            if line.trim().is_empty() {
                flush_paragraph(&mut open_paragraph, &mut units);
                continue;
            }

            if let Some(caps) = self.bullet_regex.captures(line) {
                flush_paragraph(&mut open_paragraph, &mut units);
                let indent = self.indent_level(&caps[1]);
                units.push(Unit::bullet(indent, caps[2].trim()));
                continue;
            }

            let trimmed = line.trim();
            let paragraph_open = !open_paragraph.is_empty();
            if self.is_all_caps_heading(trimmed) || (!paragraph_open && self.is_short_heading(trimmed)) {
                flush_paragraph(&mut open_paragraph, &mut units);
                units.push(Unit::heading(trimmed));
                continue;
            }

            open_paragraph.push(trimmed.to_string());
        }

        flush_paragraph(&mut open_paragraph, &mut units);
        units
    }

    /// Units joined with blank lines.
    pub fn render(&self, units: &[Unit]) -> String {
        units
            .iter()
            .map(|unit| unit.render(self.indent_width))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn indent_level(&self, leading: &str) -> usize {
        let columns: usize = leading
            .chars()
            .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
            .sum();
        columns / self.indent_width
    }

    fn is_short_heading(&self, line: &str) -> bool {
        line.graphemes(true).count() < self.heading_max_chars && !ends_with_terminal_punctuation(line)
    }

    fn is_all_caps_heading(&self, line: &str) -> bool {
        let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
        letters.len() >= 2
            && letters.iter().all(|c| c.is_uppercase())
            && line.graphemes(true).count() < self.heading_max_chars
            && !ends_with_terminal_punctuation(line)
    }
}

fn ends_with_terminal_punctuation(line: &str) -> bool {
    line.chars()
        .last()
        .map(|c| TERMINAL_PUNCTUATION.contains(&c))
        .unwrap_or(false)
}

fn flush_paragraph(lines: &mut Vec<String>, units: &mut Vec<Unit>) {
    if !lines.is_empty() {
        units.push(Unit::paragraph(lines.join("\n")));
        lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str) -> Vec<Unit> {
        Segmenter::default().segment(text)
    }

    #[test]
    fn test_classifies_headings_bullets_and_paragraphs() {
        let text = "Jane Doe\n\nExperience\n- Led the platform team.\n  - Cut costs by 30%.\n\nI build reliable systems for people who depend on them.\nMostly in Rust.";
        let units = segment(text);

        assert_eq!(
            units,
            vec![
                Unit::heading("Jane Doe"),
                Unit::heading("Experience"),
                Unit::bullet(0, "Led the platform team."),
                Unit::bullet(1, "Cut costs by 30%."),
                Unit::paragraph("I build reliable systems for people who depend on them.\nMostly in Rust."),
            ]
        );
    }

    #[test]
    fn test_bullet_glyphs_and_numbering() {
        let units = segment("* star\n• dot\n1. first\n2) second\n\t- tabbed");
        let kinds: Vec<_> = units.iter().map(|u| u.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                UnitKind::BulletItem { indent: 0 },
                UnitKind::BulletItem { indent: 0 },
                UnitKind::BulletItem { indent: 0 },
                UnitKind::BulletItem { indent: 0 },
                UnitKind::BulletItem { indent: 2 },
            ]
        );
        assert_eq!(units[2].text, "first");
    }

    #[test]
    fn test_hyphenated_words_are_not_bullets() {
        let units = segment("-5% churn year over year, measured quarterly.");
        assert_eq!(units[0].kind, UnitKind::Paragraph);
    }

    #[test]
    fn test_short_line_inside_open_paragraph_is_not_heading() {
        let units = segment("This paragraph opens with a sentence.\nand continues here");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].kind, UnitKind::Paragraph);
    }

    #[test]
    fn test_all_caps_line_breaks_open_paragraph() {
        let units = segment("This paragraph opens with a sentence.\nSKILLS\nRust, Go, SQL.");
        assert_eq!(
            units,
            vec![
                Unit::paragraph("This paragraph opens with a sentence."),
                Unit::heading("SKILLS"),
                Unit::paragraph("Rust, Go, SQL."),
            ]
        );
    }

    #[test]
    fn test_pure_prose_yields_paragraphs_only() {
        let text = "I have spent ten years building distributed systems at scale.\n\nBefore that, I taught mathematics for three years.";
        let units = segment(text);
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|u| u.kind == UnitKind::Paragraph));
    }

    #[test]
    fn test_segmentation_is_idempotent() {
        let segmenter = Segmenter::default();
        let text = "JANE DOE\nSenior Engineer\n\nSummary\nShipped things.\nshort tail\n\n- one\n    - two, nested\n3. three\n\nEducation\nBSc Computer Science, 2014.";
        let first = segmenter.segment(text);
        let second = segmenter.segment(&segmenter.render(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn test_whitespace_only_text_has_no_units() {
        assert!(segment("  \n\t\n").is_empty());
    }
}
