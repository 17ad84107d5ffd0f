//! DocuSign Gateway Library
//!
//! This crate provides a small HTTP service that sends uploaded HTML documents
//! for signature through the DocuSign eSignature REST API and exposes
//! pass-through endpoints for inspecting and managing the resulting envelopes.
//! It authenticates with the JWT-bearer grant using an RSA key held in the
//! environment.

pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod docusign;
pub mod envelope;
pub mod error;
pub mod workflow;

// Re-export commonly used types
pub use config::{ApiConfig, Config, DocuSignConfig, DocuSignCredentials};
pub use docusign::DocuSignClient;
pub use error::DocuSignError;
