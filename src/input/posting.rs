//! Job posting file loading

use crate::cli::Prompter;
use crate::error::{Result, ResumeTailorError};
use log::{info, warn};
use std::io::{BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Read a posting as UTF-8 text.
pub async fn read_posting(path: &Path) -> Result<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ResumeTailorError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ResumeTailorError::FileAccess(format!("{}: {}", path.display(), e)));
        }
    };

    let text = String::from_utf8(bytes).map_err(|_| ResumeTailorError::Encoding(path.to_path_buf()))?;
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&text);

    if text.trim().is_empty() {
        return Err(ResumeTailorError::FileAccess(format!("{} is empty", path.display())));
    }

    info!("Loaded job posting from {} ({} characters)", path.display(), text.chars().count());
    Ok(text.to_string())
}

/// Finds a readable posting. An explicit path must load as given; otherwise
/// the default path is tried, then whatever the user types until a file loads
/// or they give up.
pub struct PostingLoader {
    default_path: PathBuf,
}

impl PostingLoader {
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
        }
    }

    pub async fn load<R: BufRead, W: Write>(
        &self,
        explicit: Option<&Path>,
        prompter: &mut Prompter<R, W>,
    ) -> Result<(PathBuf, String)> {
        if let Some(path) = explicit {
            let text = read_posting(path).await?;
            return Ok((path.to_path_buf(), text));
        }

        match read_posting(&self.default_path).await {
            Ok(text) => return Ok((self.default_path.clone(), text)),
            Err(e) if e.is_file_access() => {
                warn!("Could not load job posting from {}: {}", self.default_path.display(), e);
                prompter.report(&format!("{}", e))?;
            }
            Err(e) => return Err(e),
        }

        loop {
            let path = prompter.ask_posting_path()?;
            match read_posting(&path).await {
                Ok(text) => return Ok((path, text)),
                Err(e) if e.is_file_access() => prompter.report(&format!("{}", e))?,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[tokio::test]
    async fn test_read_posting_strips_byte_order_mark() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("posting.txt");
        std::fs::write(&path, "\u{feff}Company: Acme\nRust engineer").unwrap();

        assert_eq!(read_posting(&path).await.unwrap(), "Company: Acme\nRust engineer");
    }

    #[tokio::test]
    async fn test_read_posting_errors() {
        let dir = tempdir().unwrap();

        let missing = dir.path().join("missing.txt");
        assert!(matches!(read_posting(&missing).await, Err(ResumeTailorError::FileNotFound(_))));

        let binary = dir.path().join("binary.txt");
        std::fs::write(&binary, [0xff, 0xfe, 0x00, 0x41]).unwrap();
        assert!(matches!(read_posting(&binary).await, Err(ResumeTailorError::Encoding(_))));

        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, " \n").unwrap();
        assert!(matches!(read_posting(&empty).await, Err(ResumeTailorError::FileAccess(_))));

        assert!(matches!(read_posting(dir.path()).await, Err(ResumeTailorError::FileAccess(_))));
    }

    #[tokio::test]
    async fn test_default_path_is_used_when_readable() {
        let dir = tempdir().unwrap();
        let default = dir.path().join("job_posting.txt");
        std::fs::write(&default, "Senior Rust Engineer").unwrap();

        let mut p = prompter("");
        let (path, text) = PostingLoader::new(&default).load(None, &mut p).await.unwrap();
        assert_eq!(path, default);
        assert_eq!(text, "Senior Rust Engineer");
    }

    #[tokio::test]
    async fn test_prompts_until_a_file_loads() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("acme.txt");
        std::fs::write(&good, "Platform engineer").unwrap();
        let input = format!("{}\n{}\n", dir.path().join("nope.txt").display(), good.display());

        let mut p = prompter(&input);
        let loader = PostingLoader::new(dir.path().join("job_posting.txt"));
        let (path, text) = loader.load(None, &mut p).await.unwrap();

        assert_eq!(path, good);
        assert_eq!(text, "Platform engineer");
        let shown = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(shown.matches("File not found").count(), 2);
    }

    #[tokio::test]
    async fn test_explicit_missing_path_is_not_found() {
        let dir = tempdir().unwrap();
        let default = dir.path().join("job_posting.txt");
        std::fs::write(&default, "Senior Rust Engineer").unwrap();
        let missing = dir.path().join("typo.txt");

        let mut p = prompter("");
        let result = PostingLoader::new(&default).load(Some(&missing), &mut p).await;

        assert!(matches!(result, Err(ResumeTailorError::FileNotFound(path)) if path == missing));
        assert!(p.into_output().is_empty());
    }

    #[tokio::test]
    async fn test_exit_cancels_loading() {
        let dir = tempdir().unwrap();
        let mut p = prompter("q\n");
        let loader = PostingLoader::new(dir.path().join("job_posting.txt"));

        assert!(matches!(loader.load(None, &mut p).await, Err(ResumeTailorError::Cancelled)));
    }
}
