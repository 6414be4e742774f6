use serde::{Deserialize, Serialize};
use std::fmt;

/// The two questionnaire phases of a diagnosis round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Checklist over concrete control items
    Quantitative,
    /// Indicator survey answered after the checklist
    Qualitative,
}

impl Phase {
    /// Path segment and draft-key prefix for this phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Quantitative => "quantitative",
            Phase::Qualitative => "qualitative",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog question as served by the backend
///
/// Quantitative rows carry `legal_basis`; qualitative rows carry
/// `indicator_definition` and `reference_info`. `question_number` is the
/// 1-based position within the phase catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Database id of the question row
    pub id: i64,
    /// 1-based position within the phase catalog
    pub question_number: u32,
    /// Indicator or control text shown to the user
    ///
    /// Older backend rows name this `question` (checklist) or `indicator`
    /// (survey); both are accepted.
    #[serde(alias = "question", alias = "indicator")]
    pub prompt: String,
    /// Rich-text criteria explaining how to judge the item
    #[serde(default)]
    pub evaluation_criteria: String,
    /// Statutory basis for the control (quantitative only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_basis: Option<String>,
    /// Longer definition of the indicator (qualitative only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_definition: Option<String>,
    /// Supplementary reference material (qualitative only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_info: Option<String>,
    /// Question-bank category the row belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// One answered question as submitted to the backend
///
/// Bodies use the backend's camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    /// System under assessment
    pub system_id: i64,
    /// User performing the assessment
    pub user_id: i64,
    /// Diagnosis round this batch belongs to
    pub diagnosis_round: u32,
    /// Question identifier; the per-phase id policy is decided by the caller
    pub question_id: i64,
    /// Wire form of the selected status
    pub response: String,
    /// Consultation note, or the backend's placeholder when none was given
    pub additional_comment: String,
    /// Stable path of the uploaded evidence file, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// Request body wrapper for a phase submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSubmission {
    pub responses: Vec<ResponseRecord>,
}

/// Organization profile answered once before a round opens
///
/// All eight answers are mandatory; `missing_field` reports the first blank
/// one so callers can point at it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentProfile {
    /// Kind of organization operating the system
    pub organization: String,
    /// Head count bracket of the user base
    pub user_group: String,
    /// Whether a dedicated personal-information system is operated
    pub personal_info_system: String,
    /// Whether member information is handled through a homepage
    pub member_info_homepage: String,
    /// Whether personal data is provided to external parties
    pub external_data_provision: String,
    /// Whether CCTV is operated
    pub cctv_operation: String,
    /// Whether personal-data handling is outsourced
    pub task_outsourcing: String,
    /// Whether a disposal process for personal data exists
    pub personal_info_disposal: String,
}

impl AssessmentProfile {
    /// First unanswered field, if any, using the wire field name
    pub fn missing_field(&self) -> Option<&'static str> {
        let fields = [
            (self.organization.as_str(), "organization"),
            (self.user_group.as_str(), "userGroup"),
            (self.personal_info_system.as_str(), "personalInfoSystem"),
            (self.member_info_homepage.as_str(), "memberInfoHomepage"),
            (self.external_data_provision.as_str(), "externalDataProvision"),
            (self.cctv_operation.as_str(), "cctvOperation"),
            (self.task_outsourcing.as_str(), "taskOutsourcing"),
            (self.personal_info_disposal.as_str(), "personalInfoDisposal"),
        ];
        fields
            .iter()
            .find(|(value, _)| value.trim().is_empty())
            .map(|(_, name)| *name)
    }
}

/// Registration body combining identity with the profile answers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRegistration {
    pub system_id: i64,
    pub user_id: i64,
    #[serde(flatten)]
    pub profile: AssessmentProfile,
}

/// Response of the round-number lookup
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundInfo {
    /// Next diagnosis round the backend will accept, starting at 1
    pub diagnosis_round: u32,
}

/// Body used to finalize a round
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRound {
    pub user_id: i64,
    pub system_id: i64,
}

/// Response of the evidence upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Stable path under which the file was stored
    pub url: String,
}

/// Response of the CSRF token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfToken {
    pub csrf_token: String,
}

/// Error payload the backend returns on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}
