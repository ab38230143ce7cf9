//! 📊 Analysis — sentiment, preparedness, and the follow-up to-do list.
//!
//! 🎬 *[the transcript has been summarized and extracted. one judge remains.]*
//! *[the judge holds a clipboard. the clipboard is, for now, pre-printed.]*
//!
//! Same seam shape as the summarizer: trait, concrete impl, dispatcher enum.
//! The stub produces a fixed mid-scale sentiment and a single placeholder
//! action item; a real scoring service replaces it behind the same contract
//! (transcript in, validated [`Analysis`] out).
//!
//! ⚠️ Whatever sits behind this trait, the [0.0, 1.0] sentiment bound is
//! enforced at `Analysis` construction. A scoring service that returns 7.3
//! does not get to publish 7.3.

use anyhow::Result;
use async_trait::async_trait;

use crate::common::{Analysis, Transcript};

/// 📊 The analysis seam. Transcript in, `Analysis` out, validation included.
#[async_trait]
pub trait Analyzer: std::fmt::Debug {
    async fn analyze(&self, transcript: &Transcript) -> Result<Analysis>;
}

/// 🎭 The dispatcher enum over concrete analyzers.
#[derive(Debug)]
pub enum AnalyzerBackend {
    Stub(StubAnalyzer),
}

impl AnalyzerBackend {
    pub fn stub() -> Self {
        Self::Stub(StubAnalyzer)
    }
}

#[async_trait]
impl Analyzer for AnalyzerBackend {
    async fn analyze(&self, transcript: &Transcript) -> Result<Analysis> {
        match self {
            AnalyzerBackend::Stub(a) => a.analyze(transcript).await,
        }
    }
}

// 📊 The stub's fixed outputs. Dead center on sentiment (we have no idea, and
// 0.5 is the honest spelling of "no idea"), medium preparedness, one
// placeholder action item in the exact format the follow-up desk expects to
// see replaced.
const STUB_SENTIMENT: f64 = 0.5;
const STUB_PREPAREDNESS: &str = "medium";
const STUB_ACTION_ITEM: &str = "[LLM GENERATED ACTION ITEM]";

/// 📊 The stand-in analyzer. The only field it genuinely reads is the
/// metadata's interest level, which it passes through unchanged — the agent
/// on the call had more context than this struct ever will.
#[derive(Debug, Default)]
pub struct StubAnalyzer;

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(&self, transcript: &Transcript) -> Result<Analysis> {
        let analysis = Analysis::new(
            STUB_SENTIMENT,
            transcript.metadata.visitor_interest_level.clone(),
            STUB_PREPAREDNESS.to_string(),
            vec![STUB_ACTION_ITEM.to_string()],
        )?;
        Ok(analysis)
    }
}
