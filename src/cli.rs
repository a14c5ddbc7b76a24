//! CLI interface for the resume tailor

use crate::error::{Result, ResumeTailorError};
use crate::input::link::extract_doc_id;
use crate::llm::Intensity;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

#[derive(Parser)]
#[command(name = "resume-tailor")]
#[command(about = "Tailor a Google Docs résumé to a job posting")]
#[command(long_about = "Rewrite a résumé stored in Google Docs for a specific job posting, keep its headings, bullets and character styles, and save the result as a new document")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tailor a résumé (the default when no command is given)
    Tailor {
        /// Google Doc sharing link or document id
        #[arg(short, long)]
        link: Option<String>,

        /// Path to the job posting text file
        #[arg(short, long)]
        posting: Option<PathBuf>,

        /// How far the wording may move toward the posting
        #[arg(short, long, value_enum)]
        intensity: Option<Intensity>,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Forget the stored Google token
    Logout,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Line-based interactive prompts. Generic over the streams so the flows can
/// be driven from tests.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Ask until a usable Google Doc link is entered.
    pub fn ask_document_id(&mut self) -> Result<String> {
        loop {
            let answer = self.ask("Enter the Google Doc link: ")?;
            match extract_doc_id(&answer) {
                Ok(id) => return Ok(id),
                Err(e) => self.report(&format!("{} Please enter a valid Google Doc link.", e))?,
            }
        }
    }

    /// Ask for a posting file path. `exit`, `quit` or `q` cancel the run.
    pub fn ask_posting_path(&mut self) -> Result<PathBuf> {
        loop {
            let answer = self.ask("Enter the path to the job posting file (or 'exit' to quit): ")?;
            if EXIT_WORDS.contains(&answer.to_lowercase().as_str()) {
                return Err(ResumeTailorError::Cancelled);
            }
            if !answer.is_empty() {
                return Ok(PathBuf::from(answer));
            }
        }
    }

    pub fn ask_intensity(&mut self) -> Result<Intensity> {
        writeln!(self.output, "\n{}", "Select tailoring intensity:".bold())?;
        for (i, level) in Intensity::ALL.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, level.description())?;
        }

        loop {
            let answer = self.ask("Enter your choice (1-3): ")?;
            match Intensity::from_selection(&answer) {
                Some(intensity) => return Ok(intensity),
                None => self.report("Invalid choice. Please enter 1, 2, or 3.")?,
            }
        }
    }

    pub fn report(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    /// One trimmed answer. End of input cancels the run.
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ResumeTailorError::Cancelled);
        }
        Ok(line.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(prompter: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.into_output()).unwrap()
    }

    #[test]
    fn test_document_link_is_asked_again_until_valid() {
        let mut p = prompter("not a link\nhttps://docs.google.com/document/d/abc_123-XYZ/edit\n");
        assert_eq!(p.ask_document_id().unwrap(), "abc_123-XYZ");
        assert!(output(p).contains("Please enter a valid Google Doc link."));
    }

    #[test]
    fn test_end_of_input_cancels() {
        let mut p = prompter("");
        assert!(matches!(p.ask_document_id(), Err(ResumeTailorError::Cancelled)));
    }

    #[test]
    fn test_exit_words_cancel_posting_prompt() {
        for word in ["exit", "QUIT", " q "] {
            let mut p = prompter(&format!("{}\n", word));
            assert!(matches!(p.ask_posting_path(), Err(ResumeTailorError::Cancelled)));
        }
    }

    #[test]
    fn test_blank_posting_path_is_skipped() {
        let mut p = prompter("\n  \npostings/acme.txt\n");
        assert_eq!(p.ask_posting_path().unwrap(), PathBuf::from("postings/acme.txt"));
    }

    #[test]
    fn test_intensity_menu() {
        let mut p = prompter("7\nextensive\n");
        assert_eq!(p.ask_intensity().unwrap(), Intensity::Extensive);

        let shown = output(p);
        assert!(shown.contains("1. Minimal changes"));
        assert!(shown.contains("Invalid choice"));
    }

    #[test]
    fn test_cli_parses_tailor_flags() {
        let cli = Cli::try_parse_from([
            "resume-tailor",
            "tailor",
            "--link",
            "abc",
            "--intensity",
            "subtle",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Tailor { link, posting, intensity }) => {
                assert_eq!(link.as_deref(), Some("abc"));
                assert_eq!(posting, None);
                assert_eq!(intensity, Some(Intensity::Subtle));
            }
            _ => panic!("expected tailor command"),
        }
    }

    #[test]
    fn test_no_command_defaults_to_none() {
        let cli = Cli::try_parse_from(["resume-tailor"]).unwrap();
        assert!(cli.command.is_none());
    }
}
