//! Prompt templates for tailoring and job detail extraction

use crate::llm::intensity::Intensity;
use log::debug;

/// Prompt templates used by the tailor
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub tailor_system: String,
    pub tailor_user: String,
    pub job_details_system: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            tailor_system: TAILOR_SYSTEM_TEMPLATE.to_string(),
            tailor_user: TAILOR_USER_TEMPLATE.to_string(),
            job_details_system: JOB_DETAILS_SYSTEM_TEMPLATE.to_string(),
        }
    }
}

/// Parameters for prompt template substitution
#[derive(Debug, Clone)]
pub struct PromptParams<'a> {
    pub resume_content: &'a str,
    pub job_content: &'a str,
    pub intensity: Intensity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn from_weight(weight: f32) -> Self {
        if weight > 0.7 {
            Priority::High
        } else if weight > 0.3 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

/// Weighted tailoring guidelines for an intensity level.
pub fn guidelines(intensity: Intensity) -> Vec<(&'static str, Priority)> {
    let w = intensity.weight();
    vec![
        ("Keep original content and phrasing", Priority::from_weight(1.0 - w)),
        ("Adjust content to match job requirements", Priority::from_weight(w)),
        ("Use industry-specific terminology", Priority::from_weight(w)),
        ("Add relevant details to existing points", Priority::from_weight(w)),
        ("Reorder content within sections for relevance", Priority::from_weight(w * 0.8)),
    ]
}

impl PromptTemplates {
    pub fn render_tailor_system(&self, intensity: Intensity) -> String {
        let guideline_lines = guidelines(intensity)
            .iter()
            .enumerate()
            .map(|(i, (action, priority))| format!("{}. {} (Priority: {})", i + 1, action, priority.label()))
            .collect::<Vec<_>>()
            .join("\n");

        let weight = intensity.weight();
        let preserve_pct = ((1.0 - weight) * 100.0).round() as u32;
        let match_pct = (weight * 100.0).round() as u32;

        self.tailor_system
            .replace("{guidelines}", &guideline_lines)
            .replace("{directive}", intensity.directive())
            .replace("{preserve_pct}", &preserve_pct.to_string())
            .replace("{match_pct}", &match_pct.to_string())
    }

    pub fn render_tailor_user(&self, params: &PromptParams<'_>) -> String {
        debug!(
            "Rendering tailoring prompt: resume {} chars, posting {} chars, intensity {}",
            params.resume_content.len(),
            params.job_content.len(),
            params.intensity
        );

        fill_placeholders(
            &self.tailor_user,
            &[("{job}", params.job_content), ("{resume}", params.resume_content)],
        )
    }
}

/// Substitute placeholders in a single left-to-right pass, so braces inside
/// a substituted value are never expanded again.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

const TAILOR_SYSTEM_TEMPLATE: &str = r#"You are an expert at tailoring resumes to job descriptions.

Tailoring level: {directive}

Tailoring guidelines:
{guidelines}

Additional instructions:
- Preserve approximately {preserve_pct}% of the original content
- Match approximately {match_pct}% of key terms and skills from the job posting
- Maintain truthfulness: never invent employers, job titles, dates, degrees or experience
- Keep every section of the original, in the same order, with the same headings
- Keep overall length similar to the original

Output format:
- Plain text only, no Markdown, no bold markers, no code fences
- One heading per line, with a blank line before each section
- Bullet points start with "- ", indented two spaces per nesting level
- Separate paragraphs with a blank line

Only output the modified resume content, no explanations or other text."#;

const TAILOR_USER_TEMPLATE: &str = r#"Job Posting:

{job}

Original Resume:

{resume}

Provide the tailored resume:"#;

const JOB_DETAILS_SYSTEM_TEMPLATE: &str = r#"Extract the company name and exact job title from the job posting.
Use the official title as written, not a generic version.
Respond in the format:
Company: <name>
Title: <title>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_reflects_intensity() {
        let templates = PromptTemplates::default();

        let subtle = templates.render_tailor_system(Intensity::Subtle);
        assert!(subtle.contains("Keep original content and phrasing (Priority: High)"));
        assert!(subtle.contains("Use industry-specific terminology (Priority: Low)"));
        assert!(subtle.contains("Preserve approximately 80%"));
        assert!(subtle.contains(Intensity::Subtle.directive()));

        let extensive = templates.render_tailor_system(Intensity::Extensive);
        assert!(extensive.contains("Keep original content and phrasing (Priority: Low)"));
        assert!(extensive.contains("Reorder content within sections for relevance (Priority: High)"));
        assert!(extensive.contains("Match approximately 90%"));
    }

    #[test]
    fn test_no_placeholders_left() {
        let templates = PromptTemplates::default();
        let params = PromptParams {
            resume_content: "Software Engineer at Tech Corp.",
            job_content: "Senior Rust Engineer role.",
            intensity: Intensity::Balanced,
        };

        let system = templates.render_tailor_system(params.intensity);
        let user = templates.render_tailor_user(&params);

        for rendered in [&system, &user] {
            assert!(!rendered.contains('{'), "unreplaced placeholder in {}", rendered);
        }
        assert!(user.contains("Software Engineer at Tech Corp."));
        assert!(user.contains("Senior Rust Engineer role."));
        assert!(user.find("Job Posting").unwrap() < user.find("Original Resume").unwrap());
    }

    #[test]
    fn test_placeholders_in_inputs_stay_literal() {
        let templates = PromptTemplates::default();
        let params = PromptParams {
            resume_content: "Built {job} scheduler.",
            job_content: "Paste your {resume} here.",
            intensity: Intensity::Balanced,
        };

        let user = templates.render_tailor_user(&params);

        assert!(user.contains("Paste your {resume} here."));
        assert!(user.contains("Built {job} scheduler."));
        assert_eq!(user.matches("Built {job} scheduler.").count(), 1);
        assert!(user.find("Paste your").unwrap() < user.find("Original Resume").unwrap());
    }

    #[test]
    fn test_system_prompt_forbids_fabrication() {
        let system = PromptTemplates::default().render_tailor_system(Intensity::Extensive);
        assert!(system.contains("never invent employers"));
        assert!(system.contains("Plain text only"));
    }
}
