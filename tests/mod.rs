//! Test module organization
//!
//! This module re-exports test helpers for use in test files.

mod helpers;

#[allow(unused_imports)]
pub use helpers::{
    build_test_client, build_test_config_with_mock_server, envelope_path, multipart_body,
    test_credentials, DUMMY_ACCESS_TOKEN, DUMMY_ACCOUNT_ID, DUMMY_ENVELOPE_ID,
    DUMMY_ENVELOPE_ID_2, DUMMY_INTEGRATION_KEY, DUMMY_USER_ID, TEST_PRIVATE_KEY,
    TEST_PUBLIC_KEY,
};

#[allow(unused_imports)]
pub use helpers_mock_server::{
    create_envelope_json, create_recipients_json, setup_mock_server_with_token,
    setup_mock_token_endpoint,
};
