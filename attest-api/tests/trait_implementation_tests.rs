use attest_api::client::AssessmentApi;
use attest_api::http::HttpAssessmentApi;

#[test]
fn test_http_client_implements_trait() {
    fn assert_implements_trait<T: AssessmentApi>() {}

    assert_implements_trait::<HttpAssessmentApi>();
}

#[test]
fn test_trait_object_usage() {
    // The engine holds the backend behind a trait object
    let _api: Box<dyn AssessmentApi> =
        Box::new(HttpAssessmentApi::new("http://localhost:3000").unwrap());
}

#[test]
fn test_trait_object_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<Box<dyn AssessmentApi>>();
    assert_send_sync::<std::sync::Arc<dyn AssessmentApi>>();
}
