use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{AssessmentProfile, Phase, Question, ResponseRecord};

/// Backend operations the session engine depends on
///
/// `HttpAssessmentApi` is the production implementation. The engine only
/// sees this trait, so tests drive sessions against in-memory fakes.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    /// Fetch the ordered question catalog for one phase of a system
    async fn questions(&self, phase: Phase, system_id: i64) -> Result<Vec<Question>, ApiError>;

    /// Look up the next diagnosis round the backend will accept
    async fn next_round(&self, system_id: i64) -> Result<u32, ApiError>;

    /// Whether an assessment registration already exists for this pair
    async fn has_assessment(&self, system_id: i64, user_id: i64) -> Result<bool, ApiError>;

    /// Register the organization profile that opens a round
    async fn register_assessment(
        &self,
        system_id: i64,
        user_id: i64,
        profile: &AssessmentProfile,
    ) -> Result<(), ApiError>;

    /// Submit one phase's complete response batch
    async fn submit_responses(
        &self,
        phase: Phase,
        responses: &[ResponseRecord],
    ) -> Result<(), ApiError>;

    /// Finalize the current round so the backend computes score and grade
    async fn complete_round(&self, system_id: i64, user_id: i64) -> Result<(), ApiError>;

    /// Upload one evidence file and return the stable path to attach
    async fn upload_response_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError>;
}
