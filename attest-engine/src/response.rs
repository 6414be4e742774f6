use std::collections::BTreeMap;
use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use attest_api::types::{Phase, ResponseRecord};

use crate::catalog::Catalog;
use crate::session::SessionContext;

/// Comment submitted in place of an empty consultation note
pub const NO_COMMENT_PLACEHOLDER: &str = "no additional comment";

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::QuantitativeStatus {}
    impl Sealed for super::QualitativeStatus {}
}

/// Status domain of one assessment phase
///
/// Implemented exactly twice. The two phases accept different answer sets
/// and seed different defaults, so sessions are generic over this trait
/// instead of branching on the phase at runtime.
pub trait PhaseStatus:
    sealed::Sealed
    + Copy
    + Eq
    + fmt::Debug
    + fmt::Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Phase this status domain belongs to
    const PHASE: Phase;

    /// Status seeded for every question when a catalog loads
    fn seed() -> Self;

    /// Whether the status asks for expert consultation
    fn needs_consultation(&self) -> bool;

    /// Wire value submitted to the backend
    fn as_wire(&self) -> &'static str;
}

/// Answer domain of the quantitative checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantitativeStatus {
    /// The control is implemented
    Fulfilled,
    /// The control is not implemented
    Unfulfilled,
    /// The control does not apply to this system
    NotApplicable,
    /// Expert consultation is required before the item can be settled
    NeedsConsultation,
}

impl PhaseStatus for QuantitativeStatus {
    const PHASE: Phase = Phase::Quantitative;

    fn seed() -> Self {
        QuantitativeStatus::Fulfilled
    }

    fn needs_consultation(&self) -> bool {
        matches!(self, QuantitativeStatus::NeedsConsultation)
    }

    fn as_wire(&self) -> &'static str {
        match self {
            QuantitativeStatus::Fulfilled => "fulfilled",
            QuantitativeStatus::Unfulfilled => "unfulfilled",
            QuantitativeStatus::NotApplicable => "not_applicable",
            QuantitativeStatus::NeedsConsultation => "needs_consultation",
        }
    }
}

impl fmt::Display for QuantitativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Answer domain of the qualitative survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualitativeStatus {
    /// Expert consultation is requested for this indicator
    NeedsConsultation,
    /// The indicator does not apply to this system
    NotApplicable,
}

impl PhaseStatus for QualitativeStatus {
    const PHASE: Phase = Phase::Qualitative;

    fn seed() -> Self {
        QualitativeStatus::NotApplicable
    }

    fn needs_consultation(&self) -> bool {
        matches!(self, QualitativeStatus::NeedsConsultation)
    }

    fn as_wire(&self) -> &'static str {
        match self {
            QualitativeStatus::NeedsConsultation => "needs_consultation",
            QualitativeStatus::NotApplicable => "not_applicable",
        }
    }
}

impl fmt::Display for QualitativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One question's recorded answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<S> {
    /// Selected status
    pub status: S,
    /// Consultation note; non-empty only while the status asks for one
    #[serde(default)]
    pub additional_comment: String,
    /// Stable path of the uploaded evidence file, if any
    #[serde(default)]
    pub attachment: Option<String>,
}

impl<S: PhaseStatus> Response<S> {
    fn seeded() -> Self {
        Response {
            status: S::seed(),
            additional_comment: String::new(),
            attachment: None,
        }
    }
}

/// Dense answer map for one phase of one round, keyed by question number
///
/// Every question has exactly one entry from the moment the set is seeded;
/// editing never adds or removes entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
// `PhaseStatus` already carries `Serialize + DeserializeOwned`; an empty
// bound stops the derive from adding a second, ambiguous `Deserialize` bound
#[serde(bound = "")]
pub struct ResponseSet<S: PhaseStatus> {
    responses: BTreeMap<u32, Response<S>>,
}

impl<S: PhaseStatus> ResponseSet<S> {
    /// Seed one default response per question number 1..=len
    pub fn seeded(len: u32) -> Self {
        let responses = (1..=len).map(|n| (n, Response::seeded())).collect();
        ResponseSet { responses }
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn contains(&self, question_number: u32) -> bool {
        self.responses.contains_key(&question_number)
    }

    pub fn get(&self, question_number: u32) -> Option<&Response<S>> {
        self.responses.get(&question_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Response<S>)> {
        self.responses.iter().map(|(n, response)| (*n, response))
    }

    /// Record a status
    ///
    /// A status that does not ask for consultation drops any existing
    /// comment; stale advisory text never survives a resolved item.
    pub fn set_status(&mut self, question_number: u32, status: S) -> bool {
        match self.responses.get_mut(&question_number) {
            Some(response) => {
                response.status = status;
                if !status.needs_consultation() {
                    response.additional_comment.clear();
                }
                true
            }
            None => false,
        }
    }

    /// Record a consultation note; kept only while the status asks for one
    pub fn set_comment(&mut self, question_number: u32, text: impl Into<String>) -> bool {
        match self.responses.get_mut(&question_number) {
            Some(response) if response.status.needs_consultation() => {
                response.additional_comment = text.into();
                true
            }
            _ => false,
        }
    }

    /// Attach an uploaded evidence path, independent of the status
    pub fn set_attachment(&mut self, question_number: u32, path: impl Into<String>) -> bool {
        match self.responses.get_mut(&question_number) {
            Some(response) => {
                response.attachment = Some(path.into());
                true
            }
            None => false,
        }
    }

    /// Drop the attached evidence path
    pub fn clear_attachment(&mut self, question_number: u32) -> bool {
        match self.responses.get_mut(&question_number) {
            Some(response) => {
                response.attachment = None;
                true
            }
            None => false,
        }
    }

    /// Apply a saved draft entry by entry, skipping question numbers the
    /// current catalog does not know
    pub fn apply_saved(&mut self, saved: ResponseSet<S>) -> usize {
        let mut applied = 0;
        for (question_number, response) in saved.responses {
            match self.responses.get_mut(&question_number) {
                Some(slot) => {
                    *slot = response;
                    applied += 1;
                }
                None => {
                    tracing::warn!(
                        question_number,
                        "dropping draft entry outside the active catalog"
                    );
                }
            }
        }
        applied
    }

    /// Format the whole set for submission
    ///
    /// Quantitative batches identify questions by their number; qualitative
    /// batches identify them by the catalog row id. An unanswered
    /// consultation note goes out as the placeholder text instead of
    /// blocking the batch.
    pub fn to_records(&self, context: &SessionContext, catalog: &Catalog) -> Vec<ResponseRecord> {
        self.responses
            .iter()
            .map(|(question_number, response)| {
                let question_id = match S::PHASE {
                    Phase::Quantitative => i64::from(*question_number),
                    Phase::Qualitative => catalog
                        .question_id_at(*question_number)
                        .unwrap_or_else(|| i64::from(*question_number)),
                };
                let additional_comment = if response.status.needs_consultation() {
                    if response.additional_comment.is_empty() {
                        NO_COMMENT_PLACEHOLDER.to_string()
                    } else {
                        response.additional_comment.clone()
                    }
                } else {
                    String::new()
                };
                ResponseRecord {
                    system_id: context.system_id,
                    user_id: context.user_id,
                    diagnosis_round: context.diagnosis_round,
                    question_id,
                    response: response.status.as_wire().to_string(),
                    additional_comment,
                    file_path: response.attachment.clone(),
                }
            })
            .collect()
    }
}
