//! Console summary of a finished tailoring run

use crate::pipeline::RunSummary;
use chrono::Local;
use colored::{Color, Colorize};

pub struct SummaryFormatter {
    use_colors: bool,
}

impl SummaryFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn format(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str(&self.format_header("✅ Tailored résumé created", Color::Green));
        output.push_str(&format!(
            "Finished: {}\n\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        output.push_str(&format!("📄 Source: {}\n", summary.source_title));
        output.push_str(&format!(
            "💼 Position: {} at {}\n",
            summary.job.title, summary.job.company
        ));
        output.push_str(&format!("🎚️  Intensity: {}\n", summary.intensity));
        output.push_str(&format!("📝 Title: {}\n", summary.output.title));
        output.push_str(&format!(
            "🔗 Link: {}\n",
            self.colorize(&summary.output.url(), Color::Cyan)
        ));

        output.push_str(&self.format_header("Formatting", Color::Blue));
        output.push_str(&format!(
            "Blocks written: {} ({} styled from the original)\n",
            summary.blocks_written, summary.blocks_matched
        ));
        output.push_str(&format!(
            "Styled runs: {} (original had {})\n",
            summary.output_styled_runs, summary.source_styled_runs
        ));

        let unmatched = summary.blocks_written.saturating_sub(summary.blocks_matched);
        if unmatched > 0 {
            output.push_str(&format!(
                "{} {} new block(s) had no counterpart in the original and use plain styling\n",
                self.colorize("⚠️", Color::Yellow),
                unmatched
            ));
        }

        output
    }

    fn format_header(&self, title: &str, color: Color) -> String {
        if self.use_colors {
            format!("\n{}\n", title.color(color).bold())
        } else {
            format!("\n{}\n", title)
        }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::DocumentHandle;
    use crate::llm::{Intensity, JobDetails};

    fn summary(matched: usize) -> RunSummary {
        RunSummary {
            source_title: "Jane Doe".to_string(),
            job: JobDetails {
                company: "Acme".to_string(),
                title: "Rust Engineer".to_string(),
            },
            intensity: Intensity::Balanced,
            output: DocumentHandle {
                document_id: "new-doc".to_string(),
                title: "Jane Doe - Acme - Rust Engineer".to_string(),
            },
            blocks_written: 5,
            blocks_matched: matched,
            source_styled_runs: 3,
            output_styled_runs: 2,
        }
    }

    #[test]
    fn test_plain_summary_lists_link_and_counts() {
        let text = SummaryFormatter::new(false).format(&summary(5));
        assert!(text.contains("Position: Rust Engineer at Acme"));
        assert!(text.contains("https://docs.google.com/document/d/new-doc/edit"));
        assert!(text.contains("Blocks written: 5 (5 styled from the original)"));
        assert!(!text.contains("no counterpart"));
    }

    #[test]
    fn test_unmatched_blocks_are_called_out() {
        let text = SummaryFormatter::new(false).format(&summary(3));
        assert!(text.contains("2 new block(s) had no counterpart"));
    }
}
