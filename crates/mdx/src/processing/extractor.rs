//! 🗂️ Extraction — the one stage with no excuses.
//!
//! A pure, deterministic 1:1 mapping from [`Metadata`] fields to
//! [`StructuredData`]. No network. No model. No await. On a decoded
//! transcript it cannot fail, which is why it returns a value and not a
//! `Result` — an error type with zero inhabitants is just paperwork.
//!
//! 🧠 Knowledge graph: the mapping below IS the contract. Downstream dashboards
//! key on these exact fields. Change a mapping here and somebody's permit
//! report goes quietly wrong, which is the worst kind of wrong.

use crate::common::{QuestionnaireCompletion, StructuredData, Transcript, VisitorDetails};

/// 🗂️ Derive structured visitor data from the transcript's metadata.
///
/// Field provenance, for the audit trail:
/// - `gear_prepared`        ← `questionnaire.gear_discussed`
/// - `permit_status`        ← `metadata.mount_doom_permit_status`
/// - `ring_bearer`          ← fixed `false`: detection needs the analysis
///   service, and false accusations are a customer-relations incident
/// - `hazard_knowledge`, `fitness_level` ← `"unknown"` until a scoring
///   service fills them in
/// - questionnaire completion ← 1:1 from the asked/assessed flags
pub fn extract_structured_data(transcript: &Transcript) -> StructuredData {
    let md = &transcript.metadata;
    let q = &md.questionnaire;

    let visitor_details = VisitorDetails {
        ring_bearer: false,
        gear_prepared: q.gear_discussed,
        hazard_knowledge: "unknown".to_string(),
        fitness_level: "unknown".to_string(),
        permit_status: md.mount_doom_permit_status.clone(),
    };

    let questionnaire_completion = QuestionnaireCompletion {
        purpose_of_visit: q.purpose_of_visit_asked,
        experience_level: q.experience_assessed,
        risk_acknowledgment: q.risk_acknowledged,
        gear_assessment: q.gear_discussed,
        item_disposal_intent: q.any_items_to_dispose_of_asked,
    };

    StructuredData {
        visitor_details,
        questionnaire_completion,
    }
}
