use std::sync::Arc;

use attest_api::client::AssessmentApi;
use attest_api::types::{AssessmentProfile, Phase};

use crate::draft::DraftStore;
use crate::error::EngineError;
use crate::response::{QualitativeStatus, QuantitativeStatus};
use crate::session::{SessionContext, SessionController};

/// Hand-off data threaded from one phase into the next
///
/// Once a round is open its number travels only through this value; it is
/// never refetched mid-round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundHandoff {
    pub system_id: i64,
    pub user_id: i64,
    pub diagnosis_round: u32,
}

/// Sequences one diagnosis round across both phases
///
/// Owns every call that talks about rounds: profile registration, the
/// next-round lookup, the quantitative to qualitative hand-off and the
/// final server-side completion.
pub struct RoundManager {
    api: Arc<dyn AssessmentApi>,
    drafts: Arc<dyn DraftStore>,
    system_id: i64,
    user_id: i64,
}

impl RoundManager {
    pub fn new(
        api: Arc<dyn AssessmentApi>,
        drafts: Arc<dyn DraftStore>,
        system_id: i64,
        user_id: i64,
    ) -> Result<Self, EngineError> {
        if system_id <= 0 {
            return Err(EngineError::context_missing("systemId is missing"));
        }
        if user_id <= 0 {
            return Err(EngineError::context_missing("userId is missing"));
        }
        Ok(RoundManager {
            api,
            drafts,
            system_id,
            user_id,
        })
    }

    /// Register the organization profile unless one already exists
    ///
    /// Returns whether a new registration was created.
    pub async fn ensure_registered(&self, profile: &AssessmentProfile) -> Result<bool, EngineError> {
        let exists = self
            .api
            .has_assessment(self.system_id, self.user_id)
            .await
            .map_err(|source| EngineError::RegistrationFailed { source })?;
        if exists {
            tracing::debug!(
                system_id = self.system_id,
                user_id = self.user_id,
                "assessment already registered"
            );
            return Ok(false);
        }

        // The profile is only inspected when a registration is actually needed
        if let Some(field) = profile.missing_field() {
            return Err(EngineError::ProfileIncomplete { field });
        }

        self.api
            .register_assessment(self.system_id, self.user_id, profile)
            .await
            .map_err(|source| EngineError::RegistrationFailed { source })?;
        tracing::info!(
            system_id = self.system_id,
            user_id = self.user_id,
            "assessment registered"
        );
        Ok(true)
    }

    /// Ask the backend for the next round number and open the quantitative
    /// phase under it
    pub async fn start_round(&self) -> Result<SessionController<QuantitativeStatus>, EngineError> {
        let round = self
            .api
            .next_round(self.system_id)
            .await
            .map_err(|source| EngineError::RoundLookupFailed { source })?;
        let context = SessionContext::new(self.system_id, self.user_id, round)?;
        tracing::info!(system_id = self.system_id, round, "opening diagnosis round");
        SessionController::start(context, Arc::clone(&self.api), Arc::clone(&self.drafts)).await
    }

    /// Open the qualitative phase for the round the quantitative phase
    /// just finished, reusing the handed-off round number as-is
    pub async fn enter_qualitative(
        &self,
        handoff: RoundHandoff,
    ) -> Result<SessionController<QualitativeStatus>, EngineError> {
        let context =
            SessionContext::new(handoff.system_id, handoff.user_id, handoff.diagnosis_round)?;
        SessionController::start(context, Arc::clone(&self.api), Arc::clone(&self.drafts)).await
    }

    /// Finalize the round server-side and drop both phase drafts
    ///
    /// A failed completion leaves the hand-off usable for a retry.
    pub async fn complete_round(&self, handoff: &RoundHandoff) -> Result<(), EngineError> {
        self.api
            .complete_round(handoff.system_id, handoff.user_id)
            .await
            .map_err(|source| EngineError::RoundCompletionFailed { source })?;

        let context =
            SessionContext::new(handoff.system_id, handoff.user_id, handoff.diagnosis_round)?;
        for phase in [Phase::Quantitative, Phase::Qualitative] {
            let key = context.draft_key(phase);
            if let Err(err) = self.drafts.clear(&key) {
                tracing::warn!(
                    key = %key.storage_key(),
                    error = %err,
                    "draft clear failed after round completion"
                );
            }
        }

        tracing::info!(
            system_id = handoff.system_id,
            round = handoff.diagnosis_round,
            "diagnosis round completed"
        );
        Ok(())
    }
}
