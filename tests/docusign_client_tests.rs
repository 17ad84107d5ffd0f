//! Unit tests for the DocuSign REST client

use docusign_gateway::docusign::models::{CustomFields, Signer, TextCustomField};
use docusign_gateway::DocuSignError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{
    build_test_client, build_test_config_with_mock_server, create_envelope_json, envelope_path,
    setup_mock_server_with_token, DUMMY_ACCESS_TOKEN, DUMMY_ENVELOPE_ID,
};

fn rest_path(suffix: &str) -> String {
    envelope_path(&format!("/{}{}", DUMMY_ENVELOPE_ID, suffix))
}

// ============================================================================
// REQUEST CONSTRUCTION TESTS
// ============================================================================

/// What is tested: Calls go to {base}/v2.1/accounts/{account}/envelopes/{id} with the bearer token
/// Why: Every operation depends on the account URL and authentication header
#[tokio::test]
async fn test_get_envelope_url_and_auth() {
    let mock_server = setup_mock_server_with_token().await;
    Mock::given(method("GET"))
        .and(path(rest_path("")))
        .and(header("authorization", format!("Bearer {}", DUMMY_ACCESS_TOKEN).as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(create_envelope_json(DUMMY_ENVELOPE_ID, "delivered")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    let client = build_test_client(&build_test_config_with_mock_server(&mock_server.uri()));

    let envelope = client.get_envelope(DUMMY_ENVELOPE_ID).await.unwrap();
    assert_eq!(envelope.envelope_id, DUMMY_ENVELOPE_ID);
    assert_eq!(envelope.status, "delivered");
    assert_eq!(envelope.email_subject.as_deref(), Some("Please sign this document"));
}

/// What is tested: A trailing slash on the base path does not produce an empty path segment
/// Why: Operators paste base paths with and without the slash
#[tokio::test]
async fn test_base_path_trailing_slash() {
    let mock_server = setup_mock_server_with_token().await;
    Mock::given(method("GET"))
        .and(path(rest_path("")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(create_envelope_json(DUMMY_ENVELOPE_ID, "sent")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    let mut config = build_test_config_with_mock_server(&mock_server.uri());
    config.docusign.base_path.push('/');
    let client = build_test_client(&config);

    assert!(client.get_envelope(DUMMY_ENVELOPE_ID).await.is_ok());
}

/// What is tested: Custom fields are posted in DocuSign's shape
/// Why: Optional attributes must be omitted, not sent as null
#[tokio::test]
async fn test_create_custom_fields_body() {
    let mock_server = setup_mock_server_with_token().await;
    Mock::given(method("POST"))
        .and(path(rest_path("/custom_fields")))
        .and(body_json(json!({
            "textCustomFields": [ { "name": "Department", "value": "Sales" } ],
            "listCustomFields": []
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "textCustomFields": [ { "fieldId": "10", "name": "Department", "value": "Sales" } ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    let client = build_test_client(&build_test_config_with_mock_server(&mock_server.uri()));

    let fields = CustomFields {
        text_custom_fields: vec![TextCustomField {
            name: "Department".to_string(),
            value: Some("Sales".to_string()),
            ..TextCustomField::default()
        }],
        list_custom_fields: Vec::new(),
    };
    let created = client.create_custom_fields(DUMMY_ENVELOPE_ID, &fields).await.unwrap();
    assert_eq!(created.text_custom_fields[0].field_id.as_deref(), Some("10"));
    assert!(created.list_custom_fields.is_empty());
}

// ============================================================================
// ERROR MAPPING TESTS
// ============================================================================

/// What is tested: An error body with errorCode and message maps to DocuSignError::Api
/// Why: Handlers report the provider's message to the caller
#[tokio::test]
async fn test_api_error_mapping() {
    let mock_server = setup_mock_server_with_token().await;
    Mock::given(method("GET"))
        .and(path(rest_path("/recipients")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errorCode": "USER_AUTHENTICATION_FAILED",
            "message": "One or both of Username and Password are invalid."
        })))
        .mount(&mock_server)
        .await;
    let client = build_test_client(&build_test_config_with_mock_server(&mock_server.uri()));

    match client.list_recipients(DUMMY_ENVELOPE_ID).await.unwrap_err() {
        DocuSignError::Api {
            status,
            error_code,
            message,
        } => {
            assert_eq!(status, 401);
            assert_eq!(error_code.as_deref(), Some("USER_AUTHENTICATION_FAILED"));
            assert_eq!(message, "One or both of Username and Password are invalid.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

/// What is tested: A non-JSON error body becomes the error message
/// Why: Gateways in front of DocuSign sometimes answer with plain text
#[tokio::test]
async fn test_api_error_plain_text_body() {
    let mock_server = setup_mock_server_with_token().await;
    Mock::given(method("GET"))
        .and(path(rest_path("/documents")))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;
    let client = build_test_client(&build_test_config_with_mock_server(&mock_server.uri()));

    let err = client.list_documents(DUMMY_ENVELOPE_ID).await.unwrap_err();
    assert!(matches!(err, DocuSignError::Api { status: 503, .. }));
    assert!(err.to_string().contains("Service Unavailable"));
}

/// What is tested: A token failure stops the call before the REST API is reached
/// Why: No unauthenticated request may be sent
#[tokio::test]
async fn test_token_failure_skips_rest_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(rest_path("")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    let client = build_test_client(&build_test_config_with_mock_server(&mock_server.uri()));

    let err = client.get_envelope(DUMMY_ENVELOPE_ID).await.unwrap_err();
    assert!(matches!(err, DocuSignError::OAuth { status: 400, .. }));
}

/// What is tested: A recipient update rejected inside a 200 response is an error
/// Why: DocuSign reports per-recipient failures in recipientUpdateResults
#[tokio::test]
async fn test_update_recipient_embedded_error() {
    let mock_server = setup_mock_server_with_token().await;
    Mock::given(method("PUT"))
        .and(path(rest_path("/recipients")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recipientUpdateResults": [ {
                "recipientId": "1",
                "errorDetails": {
                    "errorCode": "RECIPIENT_UPDATE_FAILED",
                    "message": "Recipient has already signed."
                }
            } ]
        })))
        .mount(&mock_server)
        .await;
    let client = build_test_client(&build_test_config_with_mock_server(&mock_server.uri()));

    let signer = Signer {
        recipient_id: "1".to_string(),
        name: Some("New Name".to_string()),
        ..Signer::default()
    };
    let err = client.update_recipient(DUMMY_ENVELOPE_ID, &signer).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("RECIPIENT_UPDATE_FAILED"));
    assert!(message.contains("recipient 1: Recipient has already signed."));
}

/// What is tested: A void rejected inside a 200 response is an error
/// Why: Completed envelopes cannot be voided and DocuSign says so in errorDetails
#[tokio::test]
async fn test_void_embedded_error() {
    let mock_server = setup_mock_server_with_token().await;
    Mock::given(method("PUT"))
        .and(path(rest_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "envelopeId": DUMMY_ENVELOPE_ID,
            "errorDetails": {
                "errorCode": "ENVELOPE_CANNOT_VOID_INVALID_STATE",
                "message": "Only envelopes in the 'Sent' or 'Delivered' states may be voided."
            }
        })))
        .mount(&mock_server)
        .await;
    let client = build_test_client(&build_test_config_with_mock_server(&mock_server.uri()));

    let err = client.void_envelope(DUMMY_ENVELOPE_ID, "test").await.unwrap_err();
    assert!(err.to_string().contains("ENVELOPE_CANNOT_VOID_INVALID_STATE"));
}

/// What is tested: Document download returns the raw bytes
/// Why: PDFs are passed through unchanged
#[tokio::test]
async fn test_get_document_bytes() {
    let pdf = b"%PDF-1.7\n%binary\xff\xfe".to_vec();
    let mock_server = setup_mock_server_with_token().await;
    Mock::given(method("GET"))
        .and(path(rest_path("/documents/combined")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(pdf.clone(), "application/pdf"))
        .mount(&mock_server)
        .await;
    let client = build_test_client(&build_test_config_with_mock_server(&mock_server.uri()));

    let bytes = client.get_document(DUMMY_ENVELOPE_ID, "combined").await.unwrap();
    assert_eq!(bytes, pdf);
}
