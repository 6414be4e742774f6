use std::sync::Arc;

use chrono::{DateTime, Utc};

use attest_api::client::AssessmentApi;
use attest_api::error::ApiError;
use attest_api::types::{Phase, Question, ResponseRecord};

use crate::catalog::Catalog;
use crate::draft::{DraftStore, StoredDraft};
use crate::error::EngineError;
use crate::response::{PhaseStatus, Response, ResponseSet};
use crate::round::RoundHandoff;
use crate::upload::Uploader;

/// Identity triple every session operation is scoped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub system_id: i64,
    pub user_id: i64,
    pub diagnosis_round: u32,
}

impl SessionContext {
    /// Validate the triple; a session never starts with missing context
    pub fn new(system_id: i64, user_id: i64, diagnosis_round: u32) -> Result<Self, EngineError> {
        if system_id <= 0 {
            return Err(EngineError::context_missing("systemId is missing"));
        }
        if user_id <= 0 {
            return Err(EngineError::context_missing("userId is missing"));
        }
        if diagnosis_round == 0 {
            return Err(EngineError::context_missing(
                "diagnosisRound must be at least 1",
            ));
        }
        Ok(SessionContext {
            system_id,
            user_id,
            diagnosis_round,
        })
    }

    /// Draft slot for one phase of this context
    pub fn draft_key(&self, phase: Phase) -> crate::draft::DraftKey {
        crate::draft::DraftKey::new(self.system_id, self.user_id, self.diagnosis_round, phase)
    }
}

/// Lifecycle of one phase session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Editing and navigation are allowed
    Active,
    /// A submission is in flight; the session is read-only
    Submitting,
    /// The batch landed server-side; the session is closed
    Completed,
}

/// Outcome of an `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Cursor moved to this step
    Moved(u32),
    /// Already at the last step; the next action is submission
    AtEnd,
}

/// Drives one phase of one diagnosis round question by question
///
/// The controller owns the catalog, the dense response map and the cursor.
/// Every edit autosaves the whole map to the draft store, so closing the
/// process mid-phase loses nothing. Submission is all-or-nothing: the
/// full batch goes out in one request and the draft is cleared only once
/// the backend confirms it.
pub struct SessionController<S: PhaseStatus> {
    context: SessionContext,
    api: Arc<dyn AssessmentApi>,
    drafts: Arc<dyn DraftStore>,
    catalog: Catalog,
    responses: ResponseSet<S>,
    step: u32,
    state: SessionState,
    last_saved: Option<DateTime<Utc>>,
}

impl<S: PhaseStatus> SessionController<S> {
    /// Load the catalog, seed defaults and hydrate any saved draft
    pub async fn start(
        context: SessionContext,
        api: Arc<dyn AssessmentApi>,
        drafts: Arc<dyn DraftStore>,
    ) -> Result<Self, EngineError> {
        let catalog = Catalog::load(api.as_ref(), S::PHASE, context.system_id).await?;
        let mut responses = ResponseSet::seeded(catalog.len());

        // Hydration runs exactly once, right after default seeding, and
        // only while both the catalog and the seeded map are non-empty. A
        // draft saved against a different catalog shape can therefore
        // adjust entries but never replace the map wholesale.
        let key = context.draft_key(S::PHASE);
        let mut last_saved = None;
        match drafts.load(&key) {
            Ok(Some(stored)) => {
                if !catalog.is_empty() && !responses.is_empty() {
                    if let Some(saved) = stored.decode::<S>(&key) {
                        let applied = responses.apply_saved(saved);
                        last_saved = Some(stored.saved_at);
                        tracing::info!(key = %key.storage_key(), applied, "restored draft");
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    key = %key.storage_key(),
                    error = %err,
                    "draft load failed, starting from defaults"
                );
            }
        }

        tracing::info!(
            phase = %S::PHASE,
            system_id = context.system_id,
            user_id = context.user_id,
            round = context.diagnosis_round,
            questions = catalog.len(),
            "session started"
        );

        Ok(SessionController {
            context,
            api,
            drafts,
            catalog,
            responses,
            step: 1,
            state: SessionState::Active,
            last_saved,
        })
    }

    pub fn phase(&self) -> Phase {
        S::PHASE
    }

    pub fn context(&self) -> SessionContext {
        self.context
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// 1-based cursor position
    pub fn current_step(&self) -> u32 {
        self.step
    }

    pub fn total_steps(&self) -> u32 {
        self.catalog.len()
    }

    /// Question under the cursor
    pub fn current_question(&self) -> Option<&Question> {
        self.catalog.question(self.step)
    }

    pub fn response(&self, question_number: u32) -> Option<&Response<S>> {
        self.responses.get(question_number)
    }

    pub fn responses(&self) -> &ResponseSet<S> {
        &self.responses
    }

    /// When the draft store last confirmed a save, if it ever did
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Record a status; statuses without consultation drop any comment
    pub fn set_status(&mut self, question_number: u32, status: S) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.ensure_known(question_number)?;
        self.responses.set_status(question_number, status);
        self.autosave();
        Ok(())
    }

    /// Record a consultation note for the question
    ///
    /// The note is kept only while the status asks for consultation; the
    /// call is a no-op otherwise.
    pub fn set_comment(
        &mut self,
        question_number: u32,
        text: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.ensure_known(question_number)?;
        if self.responses.set_comment(question_number, text) {
            self.autosave();
        }
        Ok(())
    }

    /// Upload an evidence file and attach it to the question
    ///
    /// A failed upload changes nothing: the previous attachment and all
    /// other answers stay as they are.
    pub async fn attach_file(
        &mut self,
        question_number: u32,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, EngineError> {
        self.ensure_active()?;
        self.ensure_known(question_number)?;

        let uploader = Uploader::new(Arc::clone(&self.api));
        let path = uploader.upload(file_name, bytes).await?;

        self.responses.set_attachment(question_number, path.clone());
        self.autosave();
        Ok(path)
    }

    /// Detach the uploaded evidence from the question
    pub fn clear_attachment(&mut self, question_number: u32) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.ensure_known(question_number)?;
        self.responses.clear_attachment(question_number);
        self.autosave();
        Ok(())
    }

    /// Move the cursor one step back, clamped at the first question
    pub fn previous(&mut self) -> Result<u32, EngineError> {
        self.ensure_active()?;
        self.step = self.step.saturating_sub(1).max(1);
        Ok(self.step)
    }

    /// Move the cursor forward; at the last step the caller submits instead
    pub fn advance(&mut self) -> Result<Advance, EngineError> {
        self.ensure_active()?;
        if self.step < self.total_steps() {
            self.step += 1;
            Ok(Advance::Moved(self.step))
        } else {
            Ok(Advance::AtEnd)
        }
    }

    /// Freeze the session and take the batch for submission
    ///
    /// Exactly one caller gets a batch while a submission is in flight; a
    /// second call fails until `resolve_submission` reopens or closes the
    /// session.
    pub fn begin_submission(&mut self) -> Result<Vec<ResponseRecord>, EngineError> {
        self.ensure_active()?;
        self.state = SessionState::Submitting;
        Ok(self.responses.to_records(&self.context, &self.catalog))
    }

    /// Settle an in-flight submission with the backend's verdict
    pub fn resolve_submission(
        &mut self,
        outcome: Result<(), ApiError>,
    ) -> Result<RoundHandoff, EngineError> {
        if self.state != SessionState::Submitting {
            return Err(EngineError::NotSubmitting);
        }
        match outcome {
            Ok(()) => {
                self.state = SessionState::Completed;
                let key = self.context.draft_key(S::PHASE);
                if let Err(err) = self.drafts.clear(&key) {
                    tracing::warn!(
                        key = %key.storage_key(),
                        error = %err,
                        "draft clear failed after submission"
                    );
                }
                tracing::info!(
                    phase = %S::PHASE,
                    round = self.context.diagnosis_round,
                    "phase submitted"
                );
                Ok(RoundHandoff {
                    system_id: self.context.system_id,
                    user_id: self.context.user_id,
                    diagnosis_round: self.context.diagnosis_round,
                })
            }
            Err(source) => {
                // Reopen at the same step with every answer intact
                self.state = SessionState::Active;
                Err(EngineError::SubmissionFailed {
                    phase: S::PHASE,
                    source,
                })
            }
        }
    }

    /// Submit the whole phase in one request
    pub async fn submit(&mut self) -> Result<RoundHandoff, EngineError> {
        let records = self.begin_submission()?;
        let outcome = self.api.submit_responses(S::PHASE, &records).await;
        self.resolve_submission(outcome)
    }

    fn ensure_active(&self) -> Result<(), EngineError> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Submitting => Err(EngineError::SubmissionInFlight),
            SessionState::Completed => Err(EngineError::PhaseCompleted { phase: S::PHASE }),
        }
    }

    fn ensure_known(&self, question_number: u32) -> Result<(), EngineError> {
        if self.responses.contains(question_number) {
            Ok(())
        } else {
            Err(EngineError::UnknownQuestion { question_number })
        }
    }

    /// Persist the full response map; a storage failure never stops the
    /// session, only the reload guarantee is lost
    fn autosave(&mut self) {
        let key = self.context.draft_key(S::PHASE);
        let now = Utc::now();
        let stored = match StoredDraft::encode(&self.responses, now) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(
                    key = %key.storage_key(),
                    error = %err,
                    "draft serialization failed, skipping autosave"
                );
                return;
            }
        };
        match self.drafts.save(&key, &stored) {
            Ok(()) => self.last_saved = Some(now),
            Err(err) => {
                tracing::warn!(
                    key = %key.storage_key(),
                    error = %err,
                    "draft save failed, session continues in memory"
                );
            }
        }
    }
}
