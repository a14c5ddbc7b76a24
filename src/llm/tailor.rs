//! Tailoring request builder: résumé + posting + intensity in, rewritten text out

use crate::error::{Result, ResumeTailorError};
use crate::llm::intensity::Intensity;
use crate::llm::prompts::{PromptParams, PromptTemplates};
use crate::llm::{GenerationRequest, TextGenerator};
use log::info;
use serde::{Deserialize, Serialize};

const JOB_DETAILS_MAX_TOKENS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub company: String,
    pub title: String,
}

pub struct Tailor<G> {
    generator: G,
    templates: PromptTemplates,
    max_tokens: u32,
}

impl<G: TextGenerator> Tailor<G> {
    pub fn new(generator: G, max_tokens: u32) -> Self {
        Self {
            generator,
            templates: PromptTemplates::default(),
            max_tokens,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn build_request(&self, original_text: &str, posting_text: &str, intensity: Intensity) -> GenerationRequest {
        let params = PromptParams {
            resume_content: original_text,
            job_content: posting_text,
            intensity,
        };

        GenerationRequest {
            system: self.templates.render_tailor_system(intensity),
            user: self.templates.render_tailor_user(&params),
            max_tokens: self.max_tokens,
            temperature: None,
        }
    }

    /// Ask the model for a tailored résumé. The reply comes back as plain
    /// text; a fence around the whole reply is removed.
    pub async fn tailor(&self, original_text: &str, posting_text: &str, intensity: Intensity) -> Result<String> {
        let request = self.build_request(original_text, posting_text, intensity);
        info!(
            "Requesting {} tailoring from {}",
            intensity,
            self.generator.model_name()
        );

        let reply = self.generator.generate(&request).await.map_err(into_service_error)?;
        Ok(strip_code_fences(&reply).to_string())
    }

    pub async fn extract_job_details(&self, posting_text: &str) -> Result<JobDetails> {
        let request = GenerationRequest {
            system: self.templates.job_details_system.clone(),
            user: posting_text.to_string(),
            max_tokens: JOB_DETAILS_MAX_TOKENS,
            temperature: None,
        };

        let reply = self.generator.generate(&request).await.map_err(into_service_error)?;
        parse_job_details(&reply).ok_or_else(|| {
            ResumeTailorError::TailoringService(
                "failed to extract company name or job title from response".to_string(),
            )
        })
    }
}

fn into_service_error(err: ResumeTailorError) -> ResumeTailorError {
    match err {
        e @ (ResumeTailorError::TailoringService(_) | ResumeTailorError::EmptyTailoringResult) => e,
        other => ResumeTailorError::TailoringService(other.to_string()),
    }
}

/// Parse `Company: <name>` / `Title: <title>` lines.
pub fn parse_job_details(reply: &str) -> Option<JobDetails> {
    let mut company = None;
    let mut title = None;

    for line in reply.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Company:") {
            company = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Title:") {
            title = Some(rest.trim().to_string());
        }
    }

    match (company, title) {
        (Some(company), Some(title)) if !company.is_empty() && !title.is_empty() => {
            Some(JobDetails { company, title })
        }
        _ => None,
    }
}

/// Strips a ``` fence (with or without a language tag) around the whole reply.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text.strip_prefix("```") else {
        return text;
    };
    let body = match stripped.find('\n') {
        Some(newline) => &stripped[newline + 1..],
        None => stripped,
    };
    body.trim_end().strip_suffix("```").map(str::trim).unwrap_or(text)
}
