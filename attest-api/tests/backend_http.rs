use attest_api::client::AssessmentApi;
use attest_api::error::ApiError;
use attest_api::http::HttpAssessmentApi;
use attest_api::types::{AssessmentProfile, Phase, ResponseRecord};
use mockito::Matcher;
use serde_json::json;

// Tests run against a local mock backend; no network access required.
// Run with: cargo test --test backend_http

async fn mock_csrf(server: &mut mockito::Server) -> mockito::Mock {
    server
        .mock("GET", "/csrf-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"csrfToken": "test-token"}"#)
        .create_async()
        .await
}

fn sample_record(question_id: i64) -> ResponseRecord {
    ResponseRecord {
        system_id: 12,
        user_id: 7,
        diagnosis_round: 1,
        question_id,
        response: "fulfilled".to_string(),
        additional_comment: String::new(),
        file_path: None,
    }
}

#[tokio::test]
async fn test_fetch_quantitative_questions() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/selftest/quantitative-questions")
        .match_query(Matcher::UrlEncoded("systemId".into(), "12".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {
                    "id": 101,
                    "question_number": 1,
                    "prompt": "Access to personal data is restricted to authorized staff",
                    "evaluation_criteria": "<p>Check the permission matrix</p>",
                    "legal_basis": "Art. 29",
                    "category_id": 3
                },
                {
                    "id": 102,
                    "question_number": 2,
                    "prompt": "Access logs are retained for at least one year",
                    "evaluation_criteria": "<p>Check retention settings</p>",
                    "legal_basis": "Art. 28",
                    "category_id": 3
                }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    let questions = api.questions(Phase::Quantitative, 12).await.unwrap();

    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].id, 101);
    assert_eq!(questions[0].question_number, 1);
    assert_eq!(questions[0].legal_basis.as_deref(), Some("Art. 29"));
    assert!(questions[0].indicator_definition.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_qualitative_questions() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/selftest/qualitative-questions")
        .match_query(Matcher::UrlEncoded("systemId".into(), "12".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {
                    "id": 501,
                    "question_number": 1,
                    // older rows use "indicator" for the survey prompt text
                    "indicator": "Privacy governance maturity",
                    "evaluation_criteria": "<p>Judge overall maturity</p>",
                    "indicator_definition": "How governance duties are assigned",
                    "reference_info": "Internal audit guide"
                }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    let questions = api.questions(Phase::Qualitative, 12).await.unwrap();

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].id, 501);
    assert_eq!(questions[0].prompt, "Privacy governance maturity");
    assert_eq!(
        questions[0].indicator_definition.as_deref(),
        Some("How governance duties are assigned")
    );
    assert!(questions[0].legal_basis.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_next_round() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/selftest/round/12")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"diagnosisRound": 3}"#)
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    let round = api.next_round(12).await.unwrap();

    assert_eq!(round, 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_has_assessment_variants() {
    let mut server = mockito::Server::new_async().await;
    let registered = server
        .mock("GET", "/selftest")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("systemId".into(), "12".into()),
            Matcher::UrlEncoded("userId".into(), "7".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"systemId": 12, "userId": 7, "organization": "public-institution"}"#)
        .create_async()
        .await;
    let empty = server
        .mock("GET", "/selftest")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("systemId".into(), "12".into()),
            Matcher::UrlEncoded("userId".into(), "8".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("null")
        .create_async()
        .await;
    let missing = server
        .mock("GET", "/selftest")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("systemId".into(), "12".into()),
            Matcher::UrlEncoded("userId".into(), "9".into()),
        ]))
        .with_status(404)
        .with_body(r#"{"message": "no assessment"}"#)
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    assert!(api.has_assessment(12, 7).await.unwrap());
    assert!(!api.has_assessment(12, 8).await.unwrap());
    assert!(!api.has_assessment(12, 9).await.unwrap());

    registered.assert_async().await;
    empty.assert_async().await;
    missing.assert_async().await;
}

#[tokio::test]
async fn test_register_assessment_sends_profile_and_csrf() {
    let mut server = mockito::Server::new_async().await;
    let csrf = mock_csrf(&mut server).await;
    let mock = server
        .mock("POST", "/selftest/self-assessment")
        .match_header("x-csrf-token", "test-token")
        .match_body(Matcher::Json(json!({
            "systemId": 12,
            "userId": 7,
            "organization": "public-institution",
            "userGroup": "under-10k",
            "personalInfoSystem": "yes",
            "memberInfoHomepage": "yes",
            "externalDataProvision": "no",
            "cctvOperation": "yes",
            "taskOutsourcing": "no",
            "personalInfoDisposal": "yes"
        })))
        .with_status(201)
        .with_body(r#"{"message": "registered"}"#)
        .create_async()
        .await;

    let profile = AssessmentProfile {
        organization: "public-institution".to_string(),
        user_group: "under-10k".to_string(),
        personal_info_system: "yes".to_string(),
        member_info_homepage: "yes".to_string(),
        external_data_provision: "no".to_string(),
        cctv_operation: "yes".to_string(),
        task_outsourcing: "no".to_string(),
        personal_info_disposal: "yes".to_string(),
    };

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    api.register_assessment(12, 7, &profile).await.unwrap();

    csrf.assert_async().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_responses_body_shape() {
    let mut server = mockito::Server::new_async().await;
    let _csrf = mock_csrf(&mut server).await;
    let mock = server
        .mock("POST", "/selftest/quantitative-responses")
        .match_header("x-csrf-token", "test-token")
        .match_body(Matcher::Json(json!({
            "responses": [
                {
                    "systemId": 12,
                    "userId": 7,
                    "diagnosisRound": 1,
                    "questionId": 1,
                    "response": "needs_consultation",
                    "additionalComment": "need legal review",
                    "filePath": "/uploads/responses/evidence.pdf"
                },
                {
                    "systemId": 12,
                    "userId": 7,
                    "diagnosisRound": 1,
                    "questionId": 2,
                    "response": "fulfilled",
                    "additionalComment": ""
                }
            ]
        })))
        .with_status(200)
        .with_body(r#"{"message": "saved"}"#)
        .create_async()
        .await;

    let first = ResponseRecord {
        response: "needs_consultation".to_string(),
        additional_comment: "need legal review".to_string(),
        file_path: Some("/uploads/responses/evidence.pdf".to_string()),
        ..sample_record(1)
    };
    let second = sample_record(2);

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    api.submit_responses(Phase::Quantitative, &[first, second])
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_csrf_token_fetched_once() {
    let mut server = mockito::Server::new_async().await;
    let csrf = server
        .mock("GET", "/csrf-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"csrfToken": "test-token"}"#)
        .expect(1)
        .create_async()
        .await;
    let submit = server
        .mock("POST", "/selftest/qualitative-responses")
        .match_header("x-csrf-token", "test-token")
        .with_status(200)
        .with_body(r#"{"message": "saved"}"#)
        .expect(2)
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    let batch = vec![sample_record(1)];
    api.submit_responses(Phase::Qualitative, &batch).await.unwrap();
    api.submit_responses(Phase::Qualitative, &batch).await.unwrap();

    csrf.assert_async().await;
    submit.assert_async().await;
}

#[tokio::test]
async fn test_complete_round_body() {
    let mut server = mockito::Server::new_async().await;
    let _csrf = mock_csrf(&mut server).await;
    let mock = server
        .mock("POST", "/result/complete-selftest")
        .match_header("x-csrf-token", "test-token")
        .match_body(Matcher::Json(json!({"userId": 7, "systemId": 12})))
        .with_status(200)
        .with_body(r#"{"message": "completed"}"#)
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    api.complete_round(12, 7).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_upload_response_file() {
    let mut server = mockito::Server::new_async().await;
    let _csrf = mock_csrf(&mut server).await;
    let mock = server
        .mock("POST", "/upload/response-file")
        .match_header("x-csrf-token", "test-token")
        .match_header(
            "content-type",
            Matcher::Regex("multipart/form-data".to_string()),
        )
        .match_body(Matcher::Regex(r#"filename="evidence.pdf""#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"url": "/uploads/responses/1700000000-evidence.pdf"}"#)
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    let url = api
        .upload_response_file("evidence.pdf", b"fake pdf bytes".to_vec())
        .await
        .unwrap();

    assert_eq!(url, "/uploads/responses/1700000000-evidence.pdf");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_mapping_invalid_request() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/selftest/quantitative-questions")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"message": "systemId is required"}"#)
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    let err = api.questions(Phase::Quantitative, 12).await.unwrap_err();

    match err {
        ApiError::InvalidRequest { message } => assert_eq!(message, "systemId is required"),
        other => panic!("Expected InvalidRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_mapping_session_expired() {
    let mut server = mockito::Server::new_async().await;
    let _csrf = mock_csrf(&mut server).await;
    let _mock = server
        .mock("POST", "/result/complete-selftest")
        .with_status(403)
        .with_body(r#"{"message": "invalid csrf token"}"#)
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    let err = api.complete_round(12, 7).await.unwrap_err();

    assert!(matches!(err, ApiError::SessionExpired { .. }));
    assert!(err.is_terminal());
}

#[tokio::test]
async fn test_error_mapping_backend_plain_text() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/selftest/round/12")
        .with_status(500)
        .with_body("internal server error")
        .create_async()
        .await;

    let api = HttpAssessmentApi::new(server.url()).unwrap();
    let err = api.next_round(12).await.unwrap_err();

    match err {
        ApiError::Backend { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "internal server error");
        }
        other => panic!("Expected Backend, got {other:?}"),
    }
    assert!(!api.next_round(12).await.unwrap_err().is_terminal());
}
