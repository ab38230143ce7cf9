//! 📝 Summarization — turn a pile of dialogue into one honest sentence.
//!
//! 🎬 *[a forty-minute call about volcano logistics. somewhere in it, a point.]*
//! *[the summarizer's job: find the point. the summarizer's budget: one line.]*
//!
//! The real implementation belongs to an external generation service that is
//! not wired up yet. What lives here is the stub that holds its seat: a
//! deterministic, offline summary built from the turn sequence. Non-empty by
//! construction, because a downstream validator will bounce anything less.
//!
//! ⚠️ There is NO fallback summary. If summarization fails, the transcript is
//! the caller's problem (retry or dead-letter). A made-up summary is worse
//! than no summary — ask anyone who has read minutes from a meeting the
//! note-taker slept through.

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::common::Transcript;

/// 📝 The summarize seam. Anything that can turn a transcript into a
/// non-empty string can sit here: the stub below today, a remote generation
/// service tomorrow, same contract either way.
///
/// Async because the eventual real implementation is a network call, and the
/// seam should not need re-plumbing the day it arrives.
#[async_trait]
pub trait Summarizer: std::fmt::Debug {
    /// 📝 Produce a non-empty summary of the transcript's turn sequence.
    async fn summarize(&self, transcript: &Transcript) -> Result<String>;
}

/// 🎭 The dispatcher enum over concrete summarizers. One variant today;
/// the seam is the point, not the variant count.
#[derive(Debug)]
pub enum SummarizerBackend {
    Stub(StubSummarizer),
}

impl SummarizerBackend {
    /// 🏗️ The stub lineup — what you get until a generation service shows up.
    pub fn stub() -> Self {
        Self::Stub(StubSummarizer)
    }
}

#[async_trait]
impl Summarizer for SummarizerBackend {
    async fn summarize(&self, transcript: &Transcript) -> Result<String> {
        match self {
            SummarizerBackend::Stub(s) => s.summarize(transcript).await,
        }
    }
}

/// 📝 The stand-in summarizer: deterministic, offline, and refreshingly
/// honest about being a template. Reports the shape of the call (who, how
/// long, how it opened) rather than pretending to understand it.
#[derive(Debug, Default)]
pub struct StubSummarizer;

// ✂️ Opening-line excerpt cap, in characters. Long enough to be useful,
// short enough that a monologuing visitor doesn't become the whole summary.
const EXCERPT_CHARS: usize = 80;

impl StubSummarizer {
    /// ✂️ Char-boundary-safe truncation. Byte slicing a UTF-8 string at
    /// position 80 is how you learn what a panic message looks like in Elvish.
    fn excerpt(text: &str) -> String {
        let mut excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
        if text.chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }
        excerpt
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    /// 📝 Build the template summary from the turn sequence.
    ///
    /// 💀 A transcript with zero turns is a summarize failure, full stop.
    /// There is nothing to summarize and we refuse to invent content.
    async fn summarize(&self, transcript: &Transcript) -> Result<String> {
        let Some(opening) = transcript.turns.first() else {
            bail!(
                "transcript '{}' has no turns to summarize",
                transcript.transcript_id
            );
        };

        Ok(format!(
            "{} call ({}s, {} turns, {} participants); opened by {}: \"{}\"",
            transcript.agent_type,
            transcript.duration_seconds,
            transcript.turns.len(),
            transcript.participants.len(),
            opening.speaker,
            Self::excerpt(&opening.text),
        ))
    }
}
