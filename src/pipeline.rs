//! Runs one tailoring job: fetch, tailor, reconcile, write

use crate::docs::{DocumentHandle, DocumentService, DocumentWriter};
use crate::error::ResumeTailorError;
use crate::llm::{Intensity, JobDetails, Tailor, TextGenerator};
use crate::processing::reconcile::Reconciler;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    FetchDocument,
    ExtractJobDetails,
    Tailor,
    Reconcile,
    WriteDocument,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::FetchDocument,
        PipelineStage::ExtractJobDetails,
        PipelineStage::Tailor,
        PipelineStage::Reconcile,
        PipelineStage::WriteDocument,
    ];

    fn progress_message(self) -> &'static str {
        match self {
            PipelineStage::FetchDocument => "Reading résumé...",
            PipelineStage::ExtractJobDetails => "Extracting job details...",
            PipelineStage::Tailor => "Tailoring résumé...",
            PipelineStage::Reconcile => "Restoring formatting...",
            PipelineStage::WriteDocument => "Writing new document...",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::FetchDocument => write!(f, "Reading the résumé document"),
            PipelineStage::ExtractJobDetails => write!(f, "Extracting job details"),
            PipelineStage::Tailor => write!(f, "Tailoring"),
            PipelineStage::Reconcile => write!(f, "Reconciling styles"),
            PipelineStage::WriteDocument => write!(f, "Writing the tailored document"),
        }
    }
}

/// The error that stopped a run, tagged with the stage it came from.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct StageFailure {
    pub stage: PipelineStage,
    #[source]
    pub source: ResumeTailorError,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source_title: String,
    pub job: JobDetails,
    pub intensity: Intensity,
    pub output: DocumentHandle,
    pub blocks_written: usize,
    pub blocks_matched: usize,
    pub source_styled_runs: usize,
    pub output_styled_runs: usize,
}

pub struct Pipeline<'a, D: DocumentService + ?Sized, G: TextGenerator> {
    docs: &'a D,
    tailor: &'a Tailor<G>,
    reconciler: &'a Reconciler,
    progress: ProgressBar,
}

impl<'a, D: DocumentService + ?Sized, G: TextGenerator> Pipeline<'a, D, G> {
    pub fn new(docs: &'a D, tailor: &'a Tailor<G>, reconciler: &'a Reconciler) -> Self {
        let progress = ProgressBar::new(PipelineStage::ALL.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        progress.enable_steady_tick(Duration::from_millis(120));

        Self {
            docs,
            tailor,
            reconciler,
            progress,
        }
    }

    /// Replace the progress display, e.g. with `ProgressBar::hidden()`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(
        &self,
        document_id: &str,
        posting_text: &str,
        intensity: Intensity,
    ) -> Result<RunSummary, StageFailure> {
        let result = self.run_stages(document_id, posting_text, intensity).await;
        match &result {
            Ok(_) => self.progress.finish_with_message("Done!"),
            Err(failure) => self.progress.abandon_with_message(format!("{} failed", failure.stage)),
        }
        result
    }

    async fn run_stages(
        &self,
        document_id: &str,
        posting_text: &str,
        intensity: Intensity,
    ) -> Result<RunSummary, StageFailure> {
        self.enter(PipelineStage::FetchDocument);
        let source = self
            .docs
            .fetch(document_id)
            .await
            .map_err(at(PipelineStage::FetchDocument))?;

        self.enter(PipelineStage::ExtractJobDetails);
        let job = self
            .tailor
            .extract_job_details(posting_text)
            .await
            .map_err(at(PipelineStage::ExtractJobDetails))?;
        info!("Job: {} at {}", job.title, job.company);

        self.enter(PipelineStage::Tailor);
        let tailored = self
            .tailor
            .tailor(&source.plain_text(), posting_text, intensity)
            .await
            .map_err(at(PipelineStage::Tailor))?;

        self.enter(PipelineStage::Reconcile);
        let reconciled = self
            .reconciler
            .reconcile(&source, &tailored)
            .map_err(at(PipelineStage::Reconcile))?;

        self.enter(PipelineStage::WriteDocument);
        let title = output_title(&source.title, &job);
        let output = DocumentWriter::new(self.docs)
            .write(&title, &reconciled)
            .await
            .map_err(at(PipelineStage::WriteDocument))?;
        self.progress.inc(1);

        Ok(RunSummary {
            source_title: source.title.clone(),
            job,
            intensity,
            output,
            blocks_written: reconciled.blocks.len(),
            blocks_matched: reconciled.matched_count(),
            source_styled_runs: source.styled_run_count(),
            output_styled_runs: reconciled.styled_run_count(),
        })
    }

    fn enter(&self, stage: PipelineStage) {
        if stage != PipelineStage::FetchDocument {
            self.progress.inc(1);
        }
        self.progress.set_message(stage.progress_message());
        info!("{}", stage);
    }
}

fn at(stage: PipelineStage) -> impl Fn(ResumeTailorError) -> StageFailure {
    move |source| StageFailure { stage, source }
}

/// `"{source title} - {company} - {job title}"`
pub fn output_title(source_title: &str, job: &JobDetails) -> String {
    format!("{} - {} - {}", source_title, job.company, job.title)
}
