//! REST API Server Module
//!
//! This module provides the HTTP surface of the gateway: the multipart
//! signature endpoint, the envelope pass-through endpoints and the health
//! check. All routes share one [`DocuSignClient`](crate::docusign::DocuSignClient).

// Shared structures, rejections, rejection handler and route wiring
mod generic;

// Envelope pass-through endpoints
pub mod envelopes;

// Multipart document upload and envelope creation
pub mod signature;

// Re-export ApiServer for convenience
pub use generic::ApiServer;
// Re-export response shapes for testing
#[allow(unused_imports)]
pub use generic::{ErrorResponse, HealthResponse};
