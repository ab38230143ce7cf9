//! 🏭 Processing — where a raw transcript becomes a processed result.
//!
//! 🎬 *[three stages stand in a row. a transcript approaches. it is nervous.]*
//! *[stage one reads it. stage two measures it. stage three judges it.]*
//! *[only if all three nod does a `ProcessedResult` get to exist.]*
//!
//! The pipeline is summarize → extract → analyze, applied to exactly one
//! transcript at a time with no shared mutable state between items. One bad
//! transcript cannot poison the next one, and a half-processed transcript
//! cannot leak downstream: assembly only happens after every stage succeeds.
//!
//! 🧠 Knowledge graph:
//! - `summarizer` / `analyzer`: trait + concrete impl + enum dispatcher, so a
//!   real generation or scoring service can slot in without touching the
//!   worker loop. Currently stubs, loudly labeled as such.
//! - `extractor`: a pure function. No trait. It cannot fail and it cannot
//!   block, so wrapping it in ceremony would just be cosplay.
//! - [`ProcessError`]: the per-item failure taxonomy the worker matches on.
//!   Each variant names the stage that fell over, which is the difference
//!   between a useful 3am log line and a useless one.
//!
//! 🦆 (the duck is processed. the duck was always processed.)

pub mod analyzer;
pub mod extractor;
pub mod summarizer;

use crate::common::{ProcessedResult, Transcript, ValidationError};
use analyzer::{Analyzer, AnalyzerBackend};
use extractor::extract_structured_data;
use summarizer::{Summarizer, SummarizerBackend};

/// 💀 Everything that can go wrong while handling one transcript, one variant
/// per step. The worker loop does not care *that* it failed — it cares
/// *where*, because "where" is what goes in the log next to the dead letter.
///
/// Extraction has no variant on purpose: it is a pure 1:1 field mapping and
/// has no failure mode on a decoded transcript.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("raw store refused the transcript: {0:#}")]
    StoreRaw(anyhow::Error),
    #[error("summarize stage failed: {0:#}")]
    Summarize(anyhow::Error),
    #[error("analyze stage failed: {0:#}")]
    Analyze(anyhow::Error),
    #[error("assembled result failed validation: {0}")]
    Assemble(#[from] ValidationError),
    #[error("processed store refused the result: {0:#}")]
    StoreProcessed(anyhow::Error),
    #[error("upstream submission failed: {0:#}")]
    Submit(anyhow::Error),
}

impl ProcessError {
    /// 🏷️ Short stage label for structured log fields. Grep-friendly,
    /// pager-friendly, 3am-friendly.
    pub fn stage(&self) -> &'static str {
        match self {
            ProcessError::StoreRaw(_) => "store_raw",
            ProcessError::Summarize(_) => "summarize",
            ProcessError::Analyze(_) => "analyze",
            ProcessError::Assemble(_) => "assemble",
            ProcessError::StoreProcessed(_) => "store_processed",
            ProcessError::Submit(_) => "submit",
        }
    }
}

/// 🏭 The three-stage pipeline, bundled. Holds the summarizer and analyzer
/// backends; the extractor needs no state and gets none.
///
/// Shared across the worker pool behind an `Arc` — every method takes `&self`
/// and touches nothing mutable, so twenty workers can run it at once without
/// a single lock between them.
#[derive(Debug)]
pub struct Pipeline {
    summarizer: SummarizerBackend,
    analyzer: AnalyzerBackend,
}

impl Pipeline {
    /// 🏗️ The current lineup: stub summarizer, stub analyzer. When the real
    /// services arrive they take the same seats.
    pub fn new() -> Self {
        Self {
            summarizer: SummarizerBackend::stub(),
            analyzer: AnalyzerBackend::stub(),
        }
    }

    /// 🔄 Run one transcript through summarize → extract → analyze and
    /// assemble the validated result.
    ///
    /// Any stage error aborts the run for this transcript and nothing partial
    /// escapes — the caller gets a [`ProcessError`] naming the stage, and the
    /// *source transcript* (not some half-built result) is what goes to the
    /// dead-letter sink.
    pub async fn run(&self, transcript: &Transcript) -> Result<ProcessedResult, ProcessError> {
        let summary = self
            .summarizer
            .summarize(transcript)
            .await
            .map_err(ProcessError::Summarize)?;

        let structured = extract_structured_data(transcript);

        let analysis = self
            .analyzer
            .analyze(transcript)
            .await
            .map_err(ProcessError::Analyze)?;

        let result = ProcessedResult::assemble(transcript, summary, structured, analysis)?;
        Ok(result)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_fixtures::{sample_transcript, silent_transcript};

    #[tokio::test]
    async fn the_one_where_all_three_stages_shake_hands() {
        let pipeline = Pipeline::new();
        let t = sample_transcript("t1");

        let result = pipeline
            .run(&t)
            .await
            .expect("💀 A well-formed transcript should survive the full pipeline.");

        assert_eq!(result.transcript_id, "t1");
        assert!(!result.summary.trim().is_empty());
        assert!((0.0..=1.0).contains(&result.analysis.sentiment));
        assert_eq!(result.structured_data.visitor_details.permit_status, "pending");
        assert!(result.processing_timestamp >= t.timestamp);
    }

    #[tokio::test]
    async fn the_one_where_silence_fails_at_the_first_stage() {
        // 🧪 No turns, no summary, no result. The error names the stage.
        let pipeline = Pipeline::new();
        let t = silent_transcript("t-silent");

        let err = pipeline
            .run(&t)
            .await
            .expect_err("💀 An empty transcript summarized successfully? Out of what?");
        assert_eq!(err.stage(), "summarize");
    }
}
