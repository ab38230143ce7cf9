//! 📦 Common data structures — the building blocks of mordex
//!
//! ---
//!
//! 🎬 COLD OPEN — INT. VISITOR CENTER, SLOPES OF MOUNT DOOM — 3:47 AM
//!
//! 🌋 The lava glow flickers against the monitoring dashboard. Somewhere
//! upstream, a booking agent has just finished a forty-minute call with a
//! hobbit who "only wants to drop something off, real quick." The call is
//! over. The transcript is not. The transcript is just getting started.
//!
//! ✅ And then — a `Transcript` arrives. Quietly. Carrying its turns and its
//! questionnaire like a responsible adult carrying groceries in one trip.
//! It knows who spoke. It knows when. It does not know what happens next.
//! Relatable.
//!
//! 🦆
//!
//! This module defines the humble yet load-bearing structs that ferry one
//! recorded interaction from the wire, through the pipeline, and into storage.
//! They don't ask questions. They carry the data. They are the postal workers
//! of this codebase. Please tip your postal workers.
//!
//! ---
//!
//! ⚠️  Field names here are the upstream API's wire contract. Rename a serde
//! attribute and a production stream stops parsing. No pressure.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 💀 The ways a processed result can fail the sniff test before it is allowed
/// to exist. These are matched on, so they get a real enum instead of an
/// anyhow string. The borrow checker approves. The type system applauds.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    /// 📝 An empty summary is not a summary. It's a shrug with extra steps.
    #[error("summary must not be empty")]
    EmptySummary,
    /// 📊 Sentiment lives in [0.0, 1.0]. Everything else is astrology.
    #[error("sentiment must be within [0.0, 1.0], got {0}")]
    SentimentOutOfRange(f64),
}

/// 🗣️ One turn of conversation: somebody said something, at some point in time.
///
/// Chronological order across turns is expected but not enforced. We receive
/// what the upstream recorded. If the upstream recorded time travel, we ship
/// time travel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub speaker: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// 📋 The fixed intake questionnaire — five booleans the agent is supposed to
/// tick off during every call. Whether they actually did is precisely what
/// these fields record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataQuestionnaire {
    pub purpose_of_visit_asked: bool,
    pub experience_assessed: bool,
    pub risk_acknowledged: bool,
    pub gear_discussed: bool,
    /// ⚠️ The load-bearing question. Historically, visitors who answer "no"
    /// to this one are the visitors you want to follow up with.
    pub any_items_to_dispose_of_asked: bool,
}

/// 📦 Call metadata: the questionnaire plus the agent's free-text-ish
/// categorical reads on the visitor. All strings are upstream-controlled
/// vocabularies we pass through rather than police.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub questionnaire: MetadataQuestionnaire,
    pub visitor_interest_level: String,
    pub potential_issue: String,
    pub mount_doom_permit_status: String,
    pub language: String,
}

/// 🎯 A `Transcript` — one ingested record of a recorded interaction, plus its
/// metadata questionnaire. The atomic unit of this entire pipeline.
///
/// Immutable once decoded off the wire. Exactly one worker owns it at a time,
/// and it ends its life either persisted-and-submitted or in the dead-letter
/// sink. There is no third door.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub transcript_id: String,
    pub session_id: String,
    /// ⏰ Arrival timestamp, as stamped by the upstream service.
    pub timestamp: DateTime<Utc>,
    pub agent_type: String,
    /// 📏 Non-negative by type. The upstream sends an integer; a negative call
    /// duration would be a transcript from before the call started, and we
    /// are not equipped for that conversation.
    pub duration_seconds: u64,
    /// 👥 role → name. At least one entry expected; not enforced, because the
    /// upstream occasionally has opinions about what "expected" means.
    pub participants: HashMap<String, String>,
    /// 🗣️ The ordered turn sequence. Wire name is `transcript_text` because
    /// the upstream said so and the upstream signs the paychecks.
    #[serde(rename = "transcript_text")]
    pub turns: Vec<TranscriptTurn>,
    pub metadata: Metadata,
}

/// 🧝 Visitor details derived from metadata — who is this person, really,
/// and do they know what they're walking into?
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitorDetails {
    pub ring_bearer: bool,
    pub gear_prepared: bool,
    pub hazard_knowledge: String,
    pub fitness_level: String,
    pub permit_status: String,
}

/// 📋 Which questionnaire items were actually completed during the call.
/// A 1:1 mapping from [`MetadataQuestionnaire`], with friendlier names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionnaireCompletion {
    pub purpose_of_visit: bool,
    pub experience_level: bool,
    pub risk_acknowledgment: bool,
    pub gear_assessment: bool,
    pub item_disposal_intent: bool,
}

/// 📦 The structured half of a processed result: visitor details plus
/// questionnaire completion. Derived deterministically from metadata —
/// no network, no models, no surprises.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredData {
    pub visitor_details: VisitorDetails,
    pub questionnaire_completion: QuestionnaireCompletion,
}

/// 📊 Analysis output: a sentiment score, two categorical reads, and a list
/// of action items for whoever staffs the follow-up desk.
///
/// Construct through [`Analysis::new`] so the sentiment bound is checked at
/// the door. The club has one rule: [0.0, 1.0].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub sentiment: f64,
    pub interest_level: String,
    pub preparedness_level: String,
    pub action_items: Vec<String>,
}

impl Analysis {
    /// 📊 Build an `Analysis`, rejecting any sentiment outside [0.0, 1.0].
    ///
    /// NaN fails the range check too, because `NaN.partial_cmp` answers every
    /// question with "no" and we respect that energy.
    pub fn new(
        sentiment: f64,
        interest_level: String,
        preparedness_level: String,
        action_items: Vec<String>,
    ) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&sentiment) {
            return Err(ValidationError::SentimentOutOfRange(sentiment));
        }
        Ok(Self {
            sentiment,
            interest_level,
            preparedness_level,
            action_items,
        })
    }
}

/// 🏁 A `ProcessedResult` — the summary/structured/analysis bundle derived
/// from exactly one [`Transcript`].
///
/// Only [`ProcessedResult::assemble`] builds one, and only after every
/// pipeline stage has succeeded. A partial result is not a result. It is a
/// rumor, and we do not persist rumors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedResult {
    pub transcript_id: String,
    pub summary: String,
    pub structured_data: StructuredData,
    pub analysis: Analysis,
    pub processing_timestamp: DateTime<Utc>,
}

impl ProcessedResult {
    /// 🏁 Assemble the final bundle from a source transcript and its three
    /// stage outputs. This is the only door into `ProcessedResult`, and the
    /// bouncer checks two things:
    ///
    /// - the summary is non-empty (whitespace does not count as content)
    /// - the sentiment is within [0.0, 1.0]
    ///
    /// The `transcript_id` is copied straight off the source, so a mismatched
    /// id is not a bug we can have. One less 3am page.
    ///
    /// ⏰ `processing_timestamp` is stamped now, clamped to never precede the
    /// source's arrival time. Wall clocks drift; invariants shouldn't.
    pub fn assemble(
        transcript: &Transcript,
        summary: String,
        structured_data: StructuredData,
        analysis: Analysis,
    ) -> Result<Self, ValidationError> {
        if summary.trim().is_empty() {
            return Err(ValidationError::EmptySummary);
        }
        if !(0.0..=1.0).contains(&analysis.sentiment) {
            return Err(ValidationError::SentimentOutOfRange(analysis.sentiment));
        }
        let processing_timestamp = Utc::now().max(transcript.timestamp);
        Ok(Self {
            transcript_id: transcript.transcript_id.clone(),
            summary,
            structured_data,
            analysis,
            processing_timestamp,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::sample_transcript;
    use super::*;

    #[test]
    fn the_one_where_the_wire_format_parses_as_broadcast() {
        // 🧪 A line exactly as the streaming endpoint sends it, fat fields and all.
        let raw = r#"{"transcript_id":"t1","session_id":"s1","timestamp":"2025-05-01T00:00:00Z","agent_type":"customer_service","duration_seconds":10,"participants":{"agent":"A","customer":"C"},"transcript_text":[{"speaker":"agent","text":"Hello","timestamp":"2025-05-01T00:00:01Z"}],"metadata":{"questionnaire":{"purpose_of_visit_asked":true,"experience_assessed":true,"risk_acknowledged":true,"gear_discussed":true,"any_items_to_dispose_of_asked":true},"visitor_interest_level":"high","potential_issue":"naive","mount_doom_permit_status":"pending","language":"en"}}"#;

        let t: Transcript = serde_json::from_str(raw)
            .expect("💀 The canonical wire sample should parse. If it doesn't, nothing does.");
        assert_eq!(t.transcript_id, "t1");
        assert_eq!(t.turns.len(), 1);
        assert_eq!(t.turns[0].speaker, "agent");
        assert_eq!(t.metadata.mount_doom_permit_status, "pending");

        // 🔄 And going back out, the turn list must still answer to `transcript_text`.
        let value = serde_json::to_value(&t).expect("💀 Serialization should not be the hard part.");
        assert!(value.get("transcript_text").is_some());
        assert!(value.get("turns").is_none());
    }

    #[test]
    fn the_one_where_sentiment_stays_between_the_lines() {
        let ok = Analysis::new(0.5, "high".into(), "medium".into(), vec!["call back".into()]);
        assert!(ok.is_ok());

        // ✅ The fence posts are inside the fence.
        assert!(Analysis::new(0.0, "low".into(), "low".into(), vec![]).is_ok());
        assert!(Analysis::new(1.0, "low".into(), "low".into(), vec![]).is_ok());

        for bad in [-0.1, 1.5, f64::NAN] {
            let err = Analysis::new(bad, "high".into(), "medium".into(), vec![])
                .expect_err("💀 Out-of-range sentiment walked straight past the bouncer.");
            assert!(matches!(err, ValidationError::SentimentOutOfRange(_)));
        }
    }

    #[test]
    fn the_one_where_an_empty_summary_is_shown_the_door() {
        let t = sample_transcript("t1");
        let analysis = Analysis::new(0.5, "high".into(), "medium".into(), vec![]).unwrap();
        let structured = crate::processing::extractor::extract_structured_data(&t);

        let err = ProcessedResult::assemble(&t, "   \n".to_string(), structured, analysis)
            .expect_err("💀 Whitespace posing as a summary made it through. Unacceptable.");
        assert_eq!(err, ValidationError::EmptySummary);
    }

    #[test]
    fn the_one_where_time_refuses_to_run_backwards() {
        // ⏰ A transcript stamped in the future. Clock skew happens to the best of fleets.
        let mut t = sample_transcript("t1");
        t.timestamp = Utc::now() + chrono::Duration::hours(1);

        let analysis = Analysis::new(0.5, "high".into(), "medium".into(), vec![]).unwrap();
        let structured = crate::processing::extractor::extract_structured_data(&t);
        let result = ProcessedResult::assemble(&t, "a real summary".into(), structured, analysis)
            .expect("💀 A valid result should assemble even when the clocks disagree.");

        // ✅ Processing time never precedes arrival time, skew or no skew.
        assert!(result.processing_timestamp >= t.timestamp);
        assert_eq!(result.transcript_id, "t1");
    }

    #[test]
    fn the_one_where_the_result_keeps_its_wire_names() {
        let t = sample_transcript("t1");
        let analysis = Analysis::new(0.5, "high".into(), "medium".into(), vec!["x".into()]).unwrap();
        let structured = crate::processing::extractor::extract_structured_data(&t);
        let result =
            ProcessedResult::assemble(&t, "summary".into(), structured, analysis).unwrap();

        let value = serde_json::to_value(&result).unwrap();
        for key in [
            "transcript_id",
            "summary",
            "structured_data",
            "analysis",
            "processing_timestamp",
        ] {
            assert!(value.get(key).is_some(), "missing wire field '{key}'");
        }
    }
}
