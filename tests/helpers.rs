//! Shared test helpers for integration tests
//!
//! This module provides constants, configuration builders and request
//! builders used across the test files.
//!
//! The module is organized into several categories:
//! - **Constants**: Dummy credentials and envelope ids, plus the throwaway RSA key pair
//! - **Configuration Builders**: Configs and clients pointed at a mock server
//! - **Request Builders**: Multipart bodies for the signature endpoint

use docusign_gateway::config::{Config, DocuSignCredentials};
use docusign_gateway::DocuSignClient;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Dummy integration key (client id)
pub const DUMMY_INTEGRATION_KEY: &str = "00000000-0000-0000-0000-000000000001";

/// Dummy impersonated user id
pub const DUMMY_USER_ID: &str = "00000000-0000-0000-0000-000000000002";

/// Dummy account id
pub const DUMMY_ACCOUNT_ID: &str = "00000000-0000-0000-0000-000000000003";

/// Dummy envelope id
pub const DUMMY_ENVELOPE_ID: &str = "00000000-0000-0000-0000-00000000000a";

/// Second dummy envelope id (bulk status)
#[allow(dead_code)]
pub const DUMMY_ENVELOPE_ID_2: &str = "00000000-0000-0000-0000-00000000000b";

/// Access token returned by the mocked OAuth server
pub const DUMMY_ACCESS_TOKEN: &str = "dummy-access-token";

/// Throwaway RSA key pair (PKCS#1 private key, SPKI public key). Test use only.
pub const TEST_PRIVATE_KEY: &str = include_str!("fixtures/test_rsa_key.pem");
#[allow(dead_code)]
pub const TEST_PUBLIC_KEY: &str = include_str!("fixtures/test_rsa_key.pub.pem");

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

/// Build a configuration whose REST and OAuth endpoints point at a mock server.
///
/// The REST base path is `{uri}/restapi`, so envelope calls land on
/// `/restapi/v2.1/accounts/{account}/envelopes...` (see [`envelope_path`]).
#[allow(dead_code)]
pub fn build_test_config_with_mock_server(mock_server_uri: &str) -> Config {
    let mut config = Config::default();
    config.docusign.base_path = format!("{}/restapi", mock_server_uri);
    config.docusign.oauth_base_url = mock_server_uri.to_string();
    config.docusign.request_timeout_secs = 5;
    config.api.upload_dir = std::env::temp_dir()
        .join("docusign-gateway-tests")
        .to_string_lossy()
        .into_owned();
    config
}

/// Credentials using the dummy ids and the fixture key.
#[allow(dead_code)]
pub fn test_credentials() -> DocuSignCredentials {
    DocuSignCredentials {
        integration_key: DUMMY_INTEGRATION_KEY.to_string(),
        user_id: DUMMY_USER_ID.to_string(),
        account_id: DUMMY_ACCOUNT_ID.to_string(),
        private_key: TEST_PRIVATE_KEY.to_string(),
    }
}

/// DocuSign client for a test configuration.
#[allow(dead_code)]
pub fn build_test_client(config: &Config) -> DocuSignClient {
    DocuSignClient::new(&config.docusign, &test_credentials()).expect("test client")
}

/// Mock-server path of an envelope resource, e.g. `envelope_path("/abc/recipients")`.
#[allow(dead_code)]
pub fn envelope_path(suffix: &str) -> String {
    format!("/restapi/v2.1/accounts/{}/envelopes{}", DUMMY_ACCOUNT_ID, suffix)
}

// ============================================================================
// REQUEST BUILDERS
// ============================================================================

const MULTIPART_BOUNDARY: &str = "----docusign-gateway-test-boundary";

/// Build a multipart/form-data body.
///
/// # Arguments
///
/// * `fields` - Text fields as (name, value)
/// * `file` - Optional `htmlFile` part as (filename, content)
///
/// # Returns
///
/// The `Content-Type` header value and the body bytes
#[allow(dead_code)]
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str)>) -> (String, Vec<u8>) {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            MULTIPART_BOUNDARY, name, value
        ));
    }
    if let Some((filename, content)) = file {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"htmlFile\"; filename=\"{}\"\r\nContent-Type: text/html\r\n\r\n{}\r\n",
            MULTIPART_BOUNDARY, filename, content
        ));
    }
    body.push_str(&format!("--{}--\r\n", MULTIPART_BOUNDARY));

    (
        format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        body.into_bytes(),
    )
}
