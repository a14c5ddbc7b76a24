//! Google Doc link parsing

use crate::error::{Result, ResumeTailorError};
use regex::Regex;

/// Extract the document id from a sharing link such as
/// `https://docs.google.com/document/d/<id>/edit?usp=sharing`.
/// A bare id is accepted as well.
pub fn extract_doc_id(link: &str) -> Result<String> {
    let link = link.trim();
    let path_pattern = Regex::new(r"/document/d/([a-zA-Z0-9_-]+)").expect("Invalid document link regex");
    if let Some(caps) = path_pattern.captures(link) {
        return Ok(caps[1].to_string());
    }

    let bare_id = Regex::new(r"^[a-zA-Z0-9_-]{20,}$").expect("Invalid document id regex");
    if bare_id.is_match(link) {
        return Ok(link.to_string());
    }

    Err(ResumeTailorError::InvalidLink(if link.is_empty() {
        "link is empty".to_string()
    } else {
        format!("no document id found in '{}'", link)
    }))
}

pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}
