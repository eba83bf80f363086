use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::RecommendationService;
use shared_models::error::AppError;
use shared_models::triage::{TriageMetadata, TriageMode};
use shared_utils::test_utils::{MockBackendResponses, TestConfig};

fn service_for(server: &MockServer) -> RecommendationService {
    let config = TestConfig::with_base_url(server.uri()).to_app_config();
    RecommendationService::new(&config).unwrap()
}

#[tokio::test]
async fn test_recommendations_keep_backend_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recommend"))
        .and(body_json(json!({ "symptoms": "chest pain, sweating" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::doctor("Dr. Meera Nair", "Cardiologist", 71.0),
            MockBackendResponses::doctor("Dr. Arjun Shah", "General Physician", 94.0),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let doctors = service.recommend("  chest pain, sweating ").await.unwrap();

    assert_eq!(doctors.len(), 2);
    assert_eq!(doctors[0].name, "Dr. Meera Nair");
    assert_eq!(doctors[0].specialization.as_deref(), Some("Cardiologist"));
    assert_eq!(doctors[0].initials(), "DMN");
    assert_eq!(doctors[1].match_score, Some(94.0));
    assert_eq!(
        doctors[1].location().as_deref(),
        Some("City Care Hospital, Central")
    );
}

#[tokio::test]
async fn test_blank_symptoms_skip_the_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    assert!(service.recommend("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failure_is_an_error_or_an_empty_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recommend"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);

    assert_matches!(
        service.recommend("fever").await,
        Err(AppError::Server { status: 500, message }) if message == "database offline"
    );
    assert!(service.recommend_or_empty("fever").await.is_empty());
}

#[tokio::test]
async fn test_metadata_doctors_are_used_without_a_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let metadata: TriageMetadata = serde_json::from_value(MockBackendResponses::medical_metadata(
        "high",
        &["chest pain"],
        "Cardiologist",
    ))
    .unwrap();

    let service = service_for(&mock_server);
    let doctors = service.for_metadata(&metadata).await.unwrap();

    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].name, "Dr. Meera Nair");
}

#[tokio::test]
async fn test_metadata_without_doctors_queries_by_symptoms() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recommend"))
        .and(body_json(json!({ "symptoms": "headache nausea" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockBackendResponses::doctor("Dr. Kavya Iyer", "Neurologist", 88.0),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let metadata = TriageMetadata {
        mode: TriageMode::Medical,
        symptoms: vec!["headache".to_string(), "nausea".to_string()],
        ..Default::default()
    };

    let service = service_for(&mock_server);
    let doctors = service.for_metadata(&metadata).await.unwrap();

    assert_eq!(doctors[0].specialization.as_deref(), Some("Neurologist"));
}
