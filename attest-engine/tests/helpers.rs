// Compiled separately into each test binary; not every binary uses
// every helper.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use attest_api::client::AssessmentApi;
use attest_api::error::ApiError;
use attest_api::types::{AssessmentProfile, Phase, Question, ResponseRecord};

/// Scripted backend double for driving sessions without a network
///
/// Failure counters are one-shot budgets: setting `fail_next_submissions`
/// to 1 makes exactly the next submission fail, then the fake recovers.
#[derive(Default)]
pub struct FakeApi {
    pub quantitative: Vec<Question>,
    pub qualitative: Vec<Question>,
    pub next_round: u32,
    pub registered: Mutex<bool>,
    pub submissions: Mutex<Vec<(Phase, Vec<ResponseRecord>)>>,
    pub completed: Mutex<Vec<(i64, i64)>>,
    pub fail_next_round_lookups: AtomicU32,
    pub fail_next_submissions: AtomicU32,
    pub fail_next_completions: AtomicU32,
    pub fail_next_uploads: AtomicU32,
}

impl FakeApi {
    pub fn with_catalogs(quantitative: usize, qualitative: usize) -> Self {
        FakeApi {
            quantitative: make_questions(Phase::Quantitative, quantitative),
            qualitative: make_questions(Phase::Qualitative, qualitative),
            next_round: 1,
            ..Default::default()
        }
    }
}

#[async_trait]
impl AssessmentApi for FakeApi {
    async fn questions(&self, phase: Phase, _system_id: i64) -> Result<Vec<Question>, ApiError> {
        let questions = match phase {
            Phase::Quantitative => self.quantitative.clone(),
            Phase::Qualitative => self.qualitative.clone(),
        };
        Ok(questions)
    }

    async fn next_round(&self, _system_id: i64) -> Result<u32, ApiError> {
        if take_failure(&self.fail_next_round_lookups) {
            return Err(ApiError::backend(500, "round lookup rejected".to_string()));
        }
        Ok(self.next_round)
    }

    async fn has_assessment(&self, _system_id: i64, _user_id: i64) -> Result<bool, ApiError> {
        Ok(*self.registered.lock().unwrap())
    }

    async fn register_assessment(
        &self,
        _system_id: i64,
        _user_id: i64,
        _profile: &AssessmentProfile,
    ) -> Result<(), ApiError> {
        *self.registered.lock().unwrap() = true;
        Ok(())
    }

    async fn submit_responses(
        &self,
        phase: Phase,
        responses: &[ResponseRecord],
    ) -> Result<(), ApiError> {
        if take_failure(&self.fail_next_submissions) {
            return Err(ApiError::backend(500, "submission rejected".to_string()));
        }
        self.submissions
            .lock()
            .unwrap()
            .push((phase, responses.to_vec()));
        Ok(())
    }

    async fn complete_round(&self, system_id: i64, user_id: i64) -> Result<(), ApiError> {
        if take_failure(&self.fail_next_completions) {
            return Err(ApiError::backend(502, "completion rejected".to_string()));
        }
        self.completed.lock().unwrap().push((system_id, user_id));
        Ok(())
    }

    async fn upload_response_file(
        &self,
        file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        if take_failure(&self.fail_next_uploads) {
            return Err(ApiError::backend(500, "upload rejected".to_string()));
        }
        Ok(format!("/uploads/responses/{file_name}"))
    }
}

fn take_failure(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

pub fn make_questions(phase: Phase, count: usize) -> Vec<Question> {
    (1..=count)
        .map(|n| Question {
            id: match phase {
                Phase::Quantitative => 100 + n as i64,
                Phase::Qualitative => 500 + n as i64,
            },
            question_number: n as u32,
            prompt: format!("{phase} question {n}"),
            evaluation_criteria: String::new(),
            legal_basis: matches!(phase, Phase::Quantitative).then(|| format!("Art. {n}")),
            indicator_definition: None,
            reference_info: None,
            category_id: None,
        })
        .collect()
}

pub fn full_profile() -> AssessmentProfile {
    AssessmentProfile {
        organization: "public-institution".to_string(),
        user_group: "under-10k".to_string(),
        personal_info_system: "yes".to_string(),
        member_info_homepage: "yes".to_string(),
        external_data_provision: "no".to_string(),
        cctv_operation: "yes".to_string(),
        task_outsourcing: "no".to_string(),
        personal_info_disposal: "yes".to_string(),
    }
}
