use attest_api::client::AssessmentApi;
use attest_api::types::{Phase, Question};

use crate::error::EngineError;

/// Ordered question catalog for one phase of one system
///
/// Ordering is authoritative: the session cursor walks positions 1..=len
/// and the response map is keyed by those positions.
#[derive(Debug, Clone)]
pub struct Catalog {
    phase: Phase,
    questions: Vec<Question>,
}

impl Catalog {
    /// Build a catalog from already fetched rows
    ///
    /// An empty catalog is an error: a session with no questions must
    /// never render, the caller routes back to a safe screen instead.
    pub fn new(phase: Phase, system_id: i64, questions: Vec<Question>) -> Result<Self, EngineError> {
        if questions.is_empty() {
            return Err(EngineError::CatalogUnavailable {
                phase,
                system_id,
                source: None,
            });
        }
        Ok(Catalog { phase, questions })
    }

    /// Fetch the catalog for one phase from the backend
    pub async fn load(
        api: &dyn AssessmentApi,
        phase: Phase,
        system_id: i64,
    ) -> Result<Self, EngineError> {
        let questions =
            api.questions(phase, system_id)
                .await
                .map_err(|source| EngineError::CatalogUnavailable {
                    phase,
                    system_id,
                    source: Some(source),
                })?;

        let catalog = Self::new(phase, system_id, questions)?;
        tracing::debug!(%phase, system_id, count = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn len(&self) -> u32 {
        self.questions.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question at a 1-based position
    pub fn question(&self, position: u32) -> Option<&Question> {
        position
            .checked_sub(1)
            .and_then(|index| self.questions.get(index as usize))
    }

    /// Catalog row id at a 1-based position
    pub fn question_id_at(&self, position: u32) -> Option<i64> {
        self.question(position).map(|question| question.id)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}
