use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::{
    client::AssessmentApi,
    error::ApiError,
    types::{
        ApiErrorBody, AssessmentProfile, AssessmentRegistration, CompleteRound, CsrfToken, Phase,
        Question, ResponseRecord, ResponseSubmission, RoundInfo, UploadedFile,
    },
};

/// Header carrying the CSRF token on mutating calls
const CSRF_HEADER: &str = "X-CSRF-Token";

/// HTTP client for the assessment backend
///
/// Keeps the session cookie in an in-client cookie store and fetches the
/// CSRF token once on first mutating call, reusing it for the client's
/// lifetime.
pub struct HttpAssessmentApi {
    base_url: String,
    http_client: reqwest::Client,
    csrf: OnceCell<String>,
}

impl HttpAssessmentApi {
    /// Create a new client against the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(ApiError::invalid_request("base URL cannot be empty"));
        }
        let base_url = base_url.trim_end_matches('/').to_string();

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Network { source: e })?;

        Ok(Self {
            base_url,
            http_client,
            csrf: OnceCell::new(),
        })
    }

    /// CSRF token for mutating calls, fetched once per client
    async fn csrf_token(&self) -> Result<String, ApiError> {
        let token = self
            .csrf
            .get_or_try_init(|| async {
                let url = format!("{}/csrf-token", self.base_url);
                let response = self
                    .http_client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| ApiError::Network { source: e })?;
                let body: CsrfToken = parse_json(response).await?;
                tracing::debug!("obtained CSRF token");
                Ok::<_, ApiError>(body.csrf_token)
            })
            .await?;
        Ok(token.clone())
    }
}

#[async_trait]
impl AssessmentApi for HttpAssessmentApi {
    async fn questions(&self, phase: Phase, system_id: i64) -> Result<Vec<Question>, ApiError> {
        let url = format!("{}/selftest/{}-questions", self.base_url, phase.as_str());

        let response = self
            .http_client
            .get(&url)
            .query(&[("systemId", system_id)])
            .send()
            .await
            .map_err(|e| ApiError::Network { source: e })?;

        parse_json(response).await
    }

    async fn next_round(&self, system_id: i64) -> Result<u32, ApiError> {
        let url = format!("{}/selftest/round/{}", self.base_url, system_id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Network { source: e })?;

        let info: RoundInfo = parse_json(response).await?;
        Ok(info.diagnosis_round)
    }

    async fn has_assessment(&self, system_id: i64, user_id: i64) -> Result<bool, ApiError> {
        let url = format!("{}/selftest", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("systemId", system_id), ("userId", user_id)])
            .send()
            .await
            .map_err(|e| ApiError::Network { source: e })?;

        // The backend answers 404 or a null body when nothing is registered
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let body: serde_json::Value = parse_json(response).await?;
        Ok(!body.is_null())
    }

    async fn register_assessment(
        &self,
        system_id: i64,
        user_id: i64,
        profile: &AssessmentProfile,
    ) -> Result<(), ApiError> {
        let token = self.csrf_token().await?;
        let url = format!("{}/selftest/self-assessment", self.base_url);
        let body = AssessmentRegistration {
            system_id,
            user_id,
            profile: profile.clone(),
        };

        let response = self
            .http_client
            .post(&url)
            .header(CSRF_HEADER, token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network { source: e })?;

        expect_success(response).await
    }

    async fn submit_responses(
        &self,
        phase: Phase,
        responses: &[ResponseRecord],
    ) -> Result<(), ApiError> {
        let token = self.csrf_token().await?;
        let url = format!("{}/selftest/{}-responses", self.base_url, phase.as_str());
        let body = ResponseSubmission {
            responses: responses.to_vec(),
        };

        tracing::debug!(%phase, count = responses.len(), "submitting response batch");

        let response = self
            .http_client
            .post(&url)
            .header(CSRF_HEADER, token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network { source: e })?;

        expect_success(response).await
    }

    async fn complete_round(&self, system_id: i64, user_id: i64) -> Result<(), ApiError> {
        let token = self.csrf_token().await?;
        let url = format!("{}/result/complete-selftest", self.base_url);
        let body = CompleteRound { user_id, system_id };

        let response = self
            .http_client
            .post(&url)
            .header(CSRF_HEADER, token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network { source: e })?;

        expect_success(response).await
    }

    async fn upload_response_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let token = self.csrf_token().await?;
        let url = format!("{}/upload/response-file", self.base_url);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(&url)
            .header(CSRF_HEADER, token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network { source: e })?;

        let uploaded: UploadedFile = parse_json(response).await?;
        Ok(uploaded.url)
    }
}

/// Decode a success body or map the error status onto the taxonomy
async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to parse response: {e}")))
    } else {
        Err(error_for_status(status, response).await)
    }
}

/// Check status only, for endpoints whose body the engine never reads
async fn expect_success(response: reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(error_for_status(status, response).await)
    }
}

async fn error_for_status(status: reqwest::StatusCode, response: reqwest::Response) -> ApiError {
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    // Prefer the structured message when the backend sent one
    let message = serde_json::from_str::<ApiErrorBody>(&error_text)
        .map(|body| body.message)
        .unwrap_or(error_text);

    match status {
        reqwest::StatusCode::BAD_REQUEST => ApiError::invalid_request(message),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            ApiError::session_expired(message)
        }
        reqwest::StatusCode::NOT_FOUND => ApiError::not_found(message),
        _ => ApiError::backend(status.as_u16(), message),
    }
}
