//! Generic API structures and server setup
//!
//! This module contains the shared error shapes, custom rejections, warp
//! filter helpers, the rejection handler and the [`ApiServer`] that wires every
//! route together.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};
use warp::hyper::body::Bytes;
use warp::{
    http::{Method, StatusCode},
    Filter, Rejection, Reply,
};

use crate::config::Config;
use crate::docusign::DocuSignClient;
use crate::error::DocuSignError;

// ============================================================================
// SHARED RESPONSE STRUCTURES
// ============================================================================

/// Error body returned for every failed request.
///
/// Caller errors carry only `error`; upstream failures add `details` with the
/// provider's message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

// ============================================================================
// CUSTOM REJECTION TYPES
// ============================================================================

/// Caller input error, answered with 400 before any outbound call.
#[derive(Debug)]
pub struct BadRequest(pub String);

impl warp::reject::Reject for BadRequest {}

/// DocuSign (or local I/O around a DocuSign call) failed; answered with 500.
#[derive(Debug)]
pub struct UpstreamFailure {
    /// Short description of the operation that failed
    pub error: String,
    /// Underlying message
    pub details: String,
}

impl warp::reject::Reject for UpstreamFailure {}

/// Shorthand for rejecting with [`BadRequest`].
pub fn bad_request(message: impl Into<String>) -> Rejection {
    warp::reject::custom(BadRequest(message.into()))
}

/// Logs a DocuSign failure and converts it into an [`UpstreamFailure`] rejection.
///
/// # Arguments
///
/// * `operation` - Message returned to the caller in `error`
/// * `envelope_id` - Envelope the call concerned, if any (logged only)
/// * `err` - The provider error; its message becomes `details`
pub fn upstream_failure(operation: &str, envelope_id: Option<&str>, err: DocuSignError) -> Rejection {
    match envelope_id {
        Some(id) => error!("{} (envelope {}): {}", operation, id, err),
        None => error!("{}: {}", operation, err),
    }
    warp::reject::custom(UpstreamFailure {
        error: operation.to_string(),
        details: err.to_string(),
    })
}

/// Parses a JSON request body.
pub fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Rejection> {
    serde_json::from_slice::<T>(body).map_err(|e| {
        debug!("Rejected JSON body: {}", String::from_utf8_lossy(body));
        bad_request(format!("Invalid JSON: {}", e))
    })
}

/// Parses a JSON request body, treating an empty body as the default value.
pub fn parse_optional_json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, Rejection> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_json_body(body)
}

// ============================================================================
// WARP FILTER HELPERS
// ============================================================================

/// Creates a warp filter that provides the DocuSign client to handlers.
pub fn with_client(
    client: Arc<DocuSignClient>,
) -> impl Filter<Extract = (Arc<DocuSignClient>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || client.clone())
}

/// Creates a warp filter that provides the service configuration to handlers.
pub fn with_config(
    config: Arc<Config>,
) -> impl Filter<Extract = (Arc<Config>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || config.clone())
}

// ============================================================================
// CORS CONFIGURATION
// ============================================================================

/// Creates a CORS filter based on the configured allowed origins.
fn create_cors_filter(allowed_origins: &[String]) -> warp::cors::Builder {
    let methods = vec![
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if allowed_origins.iter().any(|o| o == "*") {
        warp::cors()
            .allow_any_origin()
            .allow_methods(methods)
            .allow_headers(vec!["content-type"])
    } else {
        let origins: Vec<&str> = allowed_origins.iter().map(|s| s.as_str()).collect();
        warp::cors()
            .allow_origins(origins)
            .allow_methods(methods)
            .allow_headers(vec!["content-type"])
    }
}

// ============================================================================
// REJECTION HANDLER
// ============================================================================

/// Global rejection handler for all API routes.
///
/// Converts every rejection into an [`ErrorResponse`] with the matching status.
pub async fn handle_rejection(rej: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, error, details) = if let Some(err) = rej.find::<BadRequest>() {
        (StatusCode::BAD_REQUEST, err.0.clone(), None)
    } else if let Some(err) = rej.find::<UpstreamFailure>() {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            err.error.clone(),
            Some(err.details.clone()),
        )
    } else if let Some(err) = rej.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", err), None)
    } else if rej.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Upload exceeds the maximum allowed size".to_string(), None)
    } else if rej.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected multipart/form-data".to_string(),
            None,
        )
    } else if let Some(err) = rej.find::<warp::reject::MissingHeader>() {
        (StatusCode::BAD_REQUEST, format!("Missing request header '{}'", err.name()), None)
    } else if let Some(err) = rej.find::<warp::reject::InvalidHeader>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request header '{}'", err.name()), None)
    } else if rej.is_not_found() {
        (StatusCode::NOT_FOUND, "Endpoint not found".to_string(), None)
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string(), None)
    } else {
        error!("Unhandled rejection: {:?}", rej);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorResponse { error, details }),
        status,
    ))
}

// ============================================================================
// API SERVER IMPLEMENTATION
// ============================================================================

/// REST API server for the DocuSign gateway.
pub struct ApiServer {
    /// Service configuration
    config: Arc<Config>,
    /// DocuSign client shared by all handlers
    client: Arc<DocuSignClient>,
}

impl ApiServer {
    /// Creates a new API server.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `client` - DocuSign client built from the same configuration
    pub fn new(config: Config, client: DocuSignClient) -> Self {
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
        }
    }

    /// Starts the API server and serves requests until the process stops.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Server stopped
    /// * `Err(anyhow::Error)` - The listen address is invalid
    pub async fn run(&self) -> Result<()> {
        let addr: std::net::SocketAddr = format!("{}:{}", self.config.api.host, self.config.api.port)
            .parse()
            .context("Failed to parse API server address")?;

        info!("DocuSign gateway listening on http://{}", addr);
        info!("Health check: http://{}/api/health", addr);
        info!("Main endpoint: POST http://{}/api/docusign-signature", addr);

        let routes = self.create_routes();
        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Creates all API routes for the server.
    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        use super::{envelopes, signature};

        let client = self.client.clone();
        let config = self.config.clone();

        // GET /api/health
        let health = warp::path!("api" / "health").and(warp::get()).map(|| {
            warp::reply::json(&HealthResponse {
                status: "OK".to_string(),
                timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            })
        });

        // POST /api/docusign-signature (multipart)
        let create_signature = warp::path!("api" / "docusign-signature")
            .and(warp::post())
            .and(warp::multipart::form().max_length(self.config.api.max_upload_bytes))
            .and(with_client(client.clone()))
            .and(with_config(config.clone()))
            .and_then(signature::create_signature_handler);

        // Envelope reads
        let status = warp::path!("api" / "envelope" / String / "status")
            .and(warp::get())
            .and(with_client(client.clone()))
            .and_then(envelopes::get_status_handler);

        let documents = warp::path!("api" / "envelope" / String / "documents")
            .and(warp::get())
            .and(with_client(client.clone()))
            .and_then(envelopes::list_documents_handler);

        let document = warp::path!("api" / "envelope" / String / "documents" / String)
            .and(warp::get())
            .and(with_client(client.clone()))
            .and_then(envelopes::download_document_handler);

        let audit_trail = warp::path!("api" / "envelope" / String / "audit-trail")
            .and(warp::get())
            .and(with_client(client.clone()))
            .and_then(envelopes::audit_trail_handler);

        let recipients = warp::path!("api" / "envelope" / String / "recipients")
            .and(warp::get())
            .and(with_client(client.clone()))
            .and_then(envelopes::list_recipients_handler);

        let get_custom_fields = warp::path!("api" / "envelope" / String / "custom-fields")
            .and(warp::get())
            .and(with_client(client.clone()))
            .and_then(envelopes::get_custom_fields_handler);

        let workflow = warp::path!("api" / "envelope" / String / "workflow")
            .and(warp::get())
            .and(with_client(client.clone()))
            .and_then(envelopes::workflow_handler);

        // Envelope mutations
        let void = warp::path!("api" / "envelope" / String / "void")
            .and(warp::post())
            .and(warp::body::bytes())
            .and(with_client(client.clone()))
            .and_then(envelopes::void_handler);

        let resend = warp::path!("api" / "envelope" / String / "resend")
            .and(warp::post())
            .and(with_client(client.clone()))
            .and_then(envelopes::resend_handler);

        let add_recipients = warp::path!("api" / "envelope" / String / "recipients")
            .and(warp::post())
            .and(warp::body::bytes())
            .and(with_client(client.clone()))
            .and_then(envelopes::add_recipients_handler);

        let update_recipient = warp::path!("api" / "envelope" / String / "recipients" / String)
            .and(warp::put())
            .and(warp::body::bytes())
            .and(with_client(client.clone()))
            .and_then(envelopes::update_recipient_handler);

        let create_custom_fields = warp::path!("api" / "envelope" / String / "custom-fields")
            .and(warp::post())
            .and(warp::body::bytes())
            .and(with_client(client.clone()))
            .and_then(envelopes::create_custom_fields_handler);

        let signing_url = warp::path!("api" / "envelope" / String / "signing-url")
            .and(warp::post())
            .and(warp::body::bytes())
            .and(with_client(client.clone()))
            .and(with_config(config.clone()))
            .and_then(envelopes::signing_url_handler);

        let expiration = warp::path!("api" / "envelope" / String / "expiration")
            .and(warp::put())
            .and(warp::body::bytes())
            .and(with_client(client.clone()))
            .and_then(envelopes::update_expiration_handler);

        let comments = warp::path!("api" / "envelope" / String / "comments")
            .and(warp::post())
            .and(warp::body::bytes())
            .and_then(envelopes::add_comment_handler);

        let bulk_status = warp::path!("api" / "envelopes" / "bulk-status")
            .and(warp::post())
            .and(warp::body::bytes())
            .and(with_client(client))
            .and_then(envelopes::bulk_status_handler);

        let reads = status
            .or(documents)
            .or(document)
            .or(audit_trail)
            .or(recipients)
            .or(get_custom_fields)
            .or(workflow)
            .boxed();

        let writes = void
            .or(resend)
            .or(add_recipients)
            .or(update_recipient)
            .or(create_custom_fields)
            .or(signing_url)
            .or(expiration)
            .or(comments)
            .or(bulk_status)
            .boxed();

        // Combine all routes and apply rejection handler
        health
            .or(create_signature)
            .or(reads)
            .or(writes)
            .with(create_cors_filter(&self.config.api.cors_origins))
            .recover(handle_rejection)
    }

    /// Public method for testing - exposes routes for integration tests
    #[allow(dead_code)] // Used by tests
    pub fn test_routes(&self) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        self.create_routes()
    }
}
