//! Envelope endpoints
//!
//! Pass-through handlers for `/api/envelope/{id}/...` and
//! `/api/envelopes/bulk-status`. Each handler validates its input, performs
//! one or more calls through [`DocuSignClient`] and maps the provider's
//! response into a flat JSON shape. Input errors are rejected with
//! [`BadRequest`](super::generic::BadRequest) before any outbound call.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use warp::hyper::body::Bytes;
use warp::{Rejection, Reply};

use super::generic::{bad_request, parse_json_body, parse_optional_json_body, upstream_failure};
use crate::config::Config;
use crate::docusign::models::{
    CarbonCopy, CustomFields, EnvelopeDocument, Expirations, ListCustomField, Notification,
    RecipientInfo, RecipientViewRequest, Recipients, Signer, TextCustomField,
};
use crate::docusign::{DocuSignClient, CERTIFICATE_DOCUMENT_ID};
use crate::workflow::{WorkflowProgress, WorkflowStep};

/// Void reason used when the caller gives none.
pub const DEFAULT_VOID_REASON: &str = "Voided via API";

/// First recipient id assigned to added signers.
pub const SIGNER_ID_BASE: u32 = 100;
/// First recipient id assigned to added carbon copies.
pub const CARBON_COPY_ID_BASE: u32 = 200;

/// Nominal lifetime of an embedded signing URL, reported to the caller.
pub const SIGNING_URL_EXPIRY: &str = "5 minutes";

const COMMENT_NOTE: &str = "Comments are echoed back only and are not stored";

// ============================================================================
// REQUEST STRUCTURES
// ============================================================================

/// A JSON value callers may send either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextOrNumber {
    Text(String),
    Number(i64),
}

impl fmt::Display for TextOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextOrNumber::Text(s) => f.write_str(s.trim()),
            TextOrNumber::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Renders an optional scalar, treating blank text as absent.
fn scalar(value: &Option<TextOrNumber>) -> Option<String> {
    value.as_ref().map(ToString::to_string).filter(|v| !v.is_empty())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[derive(Debug, Default, Deserialize)]
pub struct VoidRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Recipient entry of `POST /api/envelope/{id}/recipients`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<TextOrNumber>,
    #[serde(default)]
    pub routing_order: Option<TextOrNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRecipientsRequest {
    #[serde(default)]
    pub signers: Vec<RecipientInput>,
    #[serde(default)]
    pub carbon_copies: Vec<RecipientInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipientRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub routing_order: Option<TextOrNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningUrlRequest {
    #[serde(default)]
    pub recipient_id: Option<TextOrNumber>,
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub client_user_id: Option<String>,
}

/// Expiration policy, in days.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationRequest {
    #[serde(default)]
    pub expire_enabled: Option<bool>,
    #[serde(default)]
    pub expire_after: Option<u32>,
    #[serde(default)]
    pub expire_warn: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub visible_to: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    #[serde(default)]
    pub envelope_ids: Vec<String>,
}

// ============================================================================
// RESPONSE STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeStatusResponse {
    pub envelope_id: String,
    pub status: String,
    pub created_date_time: Option<String>,
    pub last_modified_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsResponse {
    pub envelope_id: String,
    pub documents: Vec<EnvelopeDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientsResponse {
    pub envelope_id: String,
    pub signers: Vec<RecipientInfo>,
    pub carbon_copies: Vec<RecipientInfo>,
    pub recipient_count: Option<String>,
    pub current_routing_order: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidResponse {
    pub success: bool,
    pub envelope_id: String,
    pub status: String,
    pub reason: String,
}

/// Acknowledgement of a mutation that returns nothing of interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    pub envelope_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldsResponse {
    pub envelope_id: String,
    pub text_custom_fields: Vec<TextCustomField>,
    pub list_custom_fields: Vec<ListCustomField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningUrlResponse {
    pub success: bool,
    pub envelope_id: String,
    pub recipient_id: String,
    pub signing_url: String,
    pub expires_in: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationResponse {
    pub success: bool,
    pub envelope_id: String,
    pub expire_enabled: bool,
    pub expire_after: Option<u32>,
    pub expire_warn: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub text: String,
    pub visible_to: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub success: bool,
    pub envelope_id: String,
    pub comment: Comment,
    pub persisted: bool,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResponse {
    pub envelope_id: String,
    pub status: String,
    pub current_step: WorkflowStep,
    #[serde(flatten)]
    pub progress: WorkflowProgress,
    pub current_routing_order: Option<String>,
    pub signers: Vec<RecipientInfo>,
    pub carbon_copies: Vec<RecipientInfo>,
}

/// One line of the bulk status result. `status` is `null` when the lookup failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusEntry {
    pub envelope_id: String,
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkStatusSummary {
    pub total: usize,
    pub successful: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStatusResponse {
    pub results: Vec<BulkStatusEntry>,
    pub summary: BulkStatusSummary,
}

// ============================================================================
// HELPERS
// ============================================================================

/// Replaces characters that are unsafe in a `Content-Disposition` filename.
fn sanitize_filename_part(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn pdf_reply(bytes: Vec<u8>, filename: String) -> impl Reply {
    let reply = warp::reply::with_header(bytes, "content-type", "application/pdf");
    warp::reply::with_header(
        reply,
        "content-disposition",
        format!("attachment; filename=\"{}\"", filename),
    )
}

fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Builds provider signers from caller input, assigning ids and routing order by index.
pub fn assign_signers(inputs: &[RecipientInput]) -> Result<Vec<Signer>, String> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let (email, name) = match (non_blank(&input.email), non_blank(&input.name)) {
                (Some(email), Some(name)) => (email, name),
                _ => return Err(format!("Signer {} requires email and name", i + 1)),
            };
            Ok(Signer {
                recipient_id: scalar(&input.recipient_id)
                    .unwrap_or_else(|| (SIGNER_ID_BASE + i as u32).to_string()),
                email: Some(email),
                name: Some(name),
                routing_order: Some(scalar(&input.routing_order).unwrap_or_else(|| (i + 1).to_string())),
                tabs: None,
            })
        })
        .collect()
}

/// Builds provider carbon copies from caller input, assigning ids and routing order by index.
pub fn assign_carbon_copies(inputs: &[RecipientInput]) -> Result<Vec<CarbonCopy>, String> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let (email, name) = match (non_blank(&input.email), non_blank(&input.name)) {
                (Some(email), Some(name)) => (email, name),
                _ => return Err(format!("Carbon copy {} requires email and name", i + 1)),
            };
            Ok(CarbonCopy {
                recipient_id: scalar(&input.recipient_id)
                    .unwrap_or_else(|| (CARBON_COPY_ID_BASE + i as u32).to_string()),
                email,
                name,
                routing_order: scalar(&input.routing_order).unwrap_or_else(|| (i + 1).to_string()),
            })
        })
        .collect()
}

/// Validates an expiration request and converts it into the provider's notification.
pub fn expiration_notification(request: &ExpirationRequest) -> Result<Notification, String> {
    if request.expire_after.is_none() && request.expire_enabled.is_none() {
        return Err("expireAfter or expireEnabled is required".to_string());
    }
    if request.expire_after == Some(0) {
        return Err("expireAfter must be at least 1 day".to_string());
    }
    if let (Some(after), Some(warn)) = (request.expire_after, request.expire_warn) {
        if warn >= after {
            return Err("expireWarn must be less than expireAfter".to_string());
        }
    }

    Ok(Notification {
        use_account_defaults: Some("false".to_string()),
        expirations: Some(Expirations {
            expire_enabled: Some(request.expire_enabled.unwrap_or(true).to_string()),
            expire_after: request.expire_after.map(|d| d.to_string()),
            expire_warn: request.expire_warn.map(|d| d.to_string()),
        }),
    })
}

// ============================================================================
// READ HANDLERS
// ============================================================================

/// Handler for `GET /api/envelope/{id}/status`.
pub async fn get_status_handler(
    envelope_id: String,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let envelope = client
        .get_envelope(&envelope_id)
        .await
        .map_err(|e| upstream_failure("Failed to get envelope status", Some(&envelope_id), e))?;

    Ok(warp::reply::json(&EnvelopeStatusResponse {
        envelope_id: envelope.envelope_id,
        status: envelope.status,
        created_date_time: envelope.created_date_time,
        last_modified_date_time: envelope.last_modified_date_time,
        sent_date_time: envelope.sent_date_time,
        completed_date_time: envelope.completed_date_time,
        email_subject: envelope.email_subject,
    }))
}

/// Handler for `GET /api/envelope/{id}/documents`.
pub async fn list_documents_handler(
    envelope_id: String,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let result = client
        .list_documents(&envelope_id)
        .await
        .map_err(|e| upstream_failure("Failed to list envelope documents", Some(&envelope_id), e))?;

    Ok(warp::reply::json(&DocumentsResponse {
        envelope_id,
        documents: result.envelope_documents,
    }))
}

/// Handler for `GET /api/envelope/{id}/documents/{docId}`. Replies with the PDF.
pub async fn download_document_handler(
    envelope_id: String,
    document_id: String,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let bytes = client
        .get_document(&envelope_id, &document_id)
        .await
        .map_err(|e| upstream_failure("Failed to download document", Some(&envelope_id), e))?;

    debug!("Downloaded document {} of envelope {} ({} bytes)", document_id, envelope_id, bytes.len());
    let filename = format!(
        "envelope-{}-document-{}.pdf",
        sanitize_filename_part(&envelope_id),
        sanitize_filename_part(&document_id)
    );
    Ok(pdf_reply(bytes, filename))
}

/// Handler for `GET /api/envelope/{id}/audit-trail`. Replies with the certificate PDF.
pub async fn audit_trail_handler(
    envelope_id: String,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let bytes = client
        .get_document(&envelope_id, CERTIFICATE_DOCUMENT_ID)
        .await
        .map_err(|e| upstream_failure("Failed to download audit trail", Some(&envelope_id), e))?;

    let filename = format!("envelope-{}-audit-trail.pdf", sanitize_filename_part(&envelope_id));
    Ok(pdf_reply(bytes, filename))
}

/// Handler for `GET /api/envelope/{id}/recipients`.
pub async fn list_recipients_handler(
    envelope_id: String,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let recipients = client
        .list_recipients(&envelope_id)
        .await
        .map_err(|e| upstream_failure("Failed to list recipients", Some(&envelope_id), e))?;

    Ok(warp::reply::json(&RecipientsResponse {
        envelope_id,
        signers: recipients.signers,
        carbon_copies: recipients.carbon_copies,
        recipient_count: recipients.recipient_count,
        current_routing_order: recipients.current_routing_order,
    }))
}

/// Handler for `GET /api/envelope/{id}/custom-fields`.
pub async fn get_custom_fields_handler(
    envelope_id: String,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let fields = client
        .get_custom_fields(&envelope_id)
        .await
        .map_err(|e| upstream_failure("Failed to get custom fields", Some(&envelope_id), e))?;

    Ok(warp::reply::json(&CustomFieldsResponse {
        envelope_id,
        text_custom_fields: fields.text_custom_fields,
        list_custom_fields: fields.list_custom_fields,
    }))
}

/// Handler for `GET /api/envelope/{id}/workflow`.
///
/// Fetches the envelope and its recipients concurrently and derives the
/// workflow step and progress from them.
pub async fn workflow_handler(
    envelope_id: String,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let (envelope, recipients) = tokio::try_join!(
        client.get_envelope(&envelope_id),
        client.list_recipients(&envelope_id)
    )
    .map_err(|e| upstream_failure("Failed to get workflow status", Some(&envelope_id), e))?;

    let progress = WorkflowProgress::from_recipients(&recipients);
    Ok(warp::reply::json(&WorkflowResponse {
        envelope_id: envelope.envelope_id,
        current_step: WorkflowStep::from_status(&envelope.status),
        status: envelope.status,
        progress,
        current_routing_order: recipients.current_routing_order,
        signers: recipients.signers,
        carbon_copies: recipients.carbon_copies,
    }))
}

// ============================================================================
// MUTATION HANDLERS
// ============================================================================

/// Handler for `POST /api/envelope/{id}/void`. The body is optional.
pub async fn void_handler(
    envelope_id: String,
    body: Bytes,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let request: VoidRequest = parse_optional_json_body(&body)?;
    let reason = non_blank(&request.reason).unwrap_or_else(|| DEFAULT_VOID_REASON.to_string());

    client
        .void_envelope(&envelope_id, &reason)
        .await
        .map_err(|e| upstream_failure("Failed to void envelope", Some(&envelope_id), e))?;

    info!("Voided envelope {}: {}", envelope_id, reason);
    Ok(warp::reply::json(&VoidResponse {
        success: true,
        envelope_id,
        status: "voided".to_string(),
        reason,
    }))
}

/// Handler for `POST /api/envelope/{id}/resend`.
pub async fn resend_handler(
    envelope_id: String,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    client
        .resend_envelope(&envelope_id)
        .await
        .map_err(|e| upstream_failure("Failed to resend envelope", Some(&envelope_id), e))?;

    info!("Resent envelope {}", envelope_id);
    Ok(warp::reply::json(&ActionResponse {
        success: true,
        envelope_id,
        message: "Envelope resent successfully".to_string(),
    }))
}

/// Handler for `POST /api/envelope/{id}/recipients`.
pub async fn add_recipients_handler(
    envelope_id: String,
    body: Bytes,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let request: AddRecipientsRequest = parse_json_body(&body)?;
    if request.signers.is_empty() && request.carbon_copies.is_empty() {
        return Err(bad_request("At least one signer or carbon copy is required"));
    }

    let recipients = Recipients {
        signers: assign_signers(&request.signers).map_err(bad_request)?,
        carbon_copies: assign_carbon_copies(&request.carbon_copies).map_err(bad_request)?,
    };

    let added = client
        .add_recipients(&envelope_id, &recipients)
        .await
        .map_err(|e| upstream_failure("Failed to add recipients", Some(&envelope_id), e))?;

    info!(
        "Added {} signer(s) and {} carbon copy recipient(s) to envelope {}",
        recipients.signers.len(),
        recipients.carbon_copies.len(),
        envelope_id
    );
    Ok(warp::reply::json(&RecipientsResponse {
        envelope_id,
        signers: added.signers,
        carbon_copies: added.carbon_copies,
        recipient_count: added.recipient_count,
        current_routing_order: added.current_routing_order,
    }))
}

/// Handler for `PUT /api/envelope/{id}/recipients/{recipientId}`.
pub async fn update_recipient_handler(
    envelope_id: String,
    recipient_id: String,
    body: Bytes,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let request: UpdateRecipientRequest = parse_json_body(&body)?;
    let signer = Signer {
        recipient_id: recipient_id.clone(),
        email: non_blank(&request.email),
        name: non_blank(&request.name),
        routing_order: scalar(&request.routing_order),
        tabs: None,
    };
    if signer.email.is_none() && signer.name.is_none() && signer.routing_order.is_none() {
        return Err(bad_request("At least one of name, email or routingOrder is required"));
    }

    client
        .update_recipient(&envelope_id, &signer)
        .await
        .map_err(|e| upstream_failure("Failed to update recipient", Some(&envelope_id), e))?;

    Ok(warp::reply::json(&ActionResponse {
        success: true,
        envelope_id,
        message: format!("Recipient {} updated successfully", recipient_id),
    }))
}

/// Handler for `POST /api/envelope/{id}/custom-fields`.
pub async fn create_custom_fields_handler(
    envelope_id: String,
    body: Bytes,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let fields: CustomFields = parse_json_body(&body)?;
    if fields.text_custom_fields.is_empty() && fields.list_custom_fields.is_empty() {
        return Err(bad_request("At least one custom field is required"));
    }
    let unnamed = fields.text_custom_fields.iter().any(|f| f.name.trim().is_empty())
        || fields.list_custom_fields.iter().any(|f| f.name.trim().is_empty());
    if unnamed {
        return Err(bad_request("Every custom field requires a name"));
    }

    let created = client
        .create_custom_fields(&envelope_id, &fields)
        .await
        .map_err(|e| upstream_failure("Failed to create custom fields", Some(&envelope_id), e))?;

    Ok(warp::reply::json(&CustomFieldsResponse {
        envelope_id,
        text_custom_fields: created.text_custom_fields,
        list_custom_fields: created.list_custom_fields,
    }))
}

/// Handler for `POST /api/envelope/{id}/signing-url`.
///
/// When `email` or `userName` is omitted, both are taken from the envelope's
/// signer with the requested recipient id.
pub async fn signing_url_handler(
    envelope_id: String,
    body: Bytes,
    client: Arc<DocuSignClient>,
    config: Arc<Config>,
) -> Result<impl Reply, Rejection> {
    let request: SigningUrlRequest = parse_json_body(&body)?;
    let Some(recipient_id) = scalar(&request.recipient_id) else {
        return Err(bad_request("recipientId is required"));
    };

    let (email, user_name) = match (non_blank(&request.email), non_blank(&request.user_name)) {
        (Some(email), Some(user_name)) => (email, user_name),
        (email, user_name) => {
            let recipients = client
                .list_recipients(&envelope_id)
                .await
                .map_err(|e| upstream_failure("Failed to create signing URL", Some(&envelope_id), e))?;
            let signer = recipients
                .signers
                .into_iter()
                .find(|s| s.recipient_id == recipient_id)
                .ok_or_else(|| bad_request(format!("Recipient {} not found on envelope", recipient_id)))?;
            match (email.or(signer.email), user_name.or(signer.name)) {
                (Some(email), Some(user_name)) => (email, user_name),
                _ => return Err(bad_request(format!("Recipient {} has no email or name", recipient_id))),
            }
        }
    };

    let view = RecipientViewRequest {
        return_url: non_blank(&request.return_url)
            .unwrap_or_else(|| config.docusign.signing_return_url.clone()),
        authentication_method: "none".to_string(),
        email,
        user_name,
        recipient_id: recipient_id.clone(),
        client_user_id: non_blank(&request.client_user_id),
    };

    let url = client
        .create_recipient_view(&envelope_id, &view)
        .await
        .map_err(|e| upstream_failure("Failed to create signing URL", Some(&envelope_id), e))?;

    Ok(warp::reply::json(&SigningUrlResponse {
        success: true,
        envelope_id,
        recipient_id,
        signing_url: url.url,
        expires_in: SIGNING_URL_EXPIRY.to_string(),
    }))
}

/// Handler for `PUT /api/envelope/{id}/expiration`.
pub async fn update_expiration_handler(
    envelope_id: String,
    body: Bytes,
    client: Arc<DocuSignClient>,
) -> Result<impl Reply, Rejection> {
    let request: ExpirationRequest = parse_json_body(&body)?;
    let notification = expiration_notification(&request).map_err(bad_request)?;

    client
        .update_expiration(&envelope_id, &notification)
        .await
        .map_err(|e| upstream_failure("Failed to update expiration", Some(&envelope_id), e))?;

    Ok(warp::reply::json(&ExpirationResponse {
        success: true,
        envelope_id,
        expire_enabled: request.expire_enabled.unwrap_or(true),
        expire_after: request.expire_after,
        expire_warn: request.expire_warn,
    }))
}

/// Handler for `POST /api/envelope/{id}/comments`.
///
/// Comments are not stored anywhere; the handler validates and echoes them.
pub async fn add_comment_handler(envelope_id: String, body: Bytes) -> Result<impl Reply, Rejection> {
    let request: CommentRequest = parse_json_body(&body)?;
    let Some(text) = non_blank(&request.text) else {
        return Err(bad_request("Comment text is required"));
    };

    Ok(warp::reply::json(&CommentResponse {
        success: true,
        envelope_id,
        comment: Comment {
            text,
            visible_to: request.visible_to.unwrap_or_else(|| vec!["all".to_string()]),
            timestamp: timestamp_now(),
        },
        persisted: false,
        note: COMMENT_NOTE.to_string(),
    }))
}

/// Handler for `POST /api/envelopes/bulk-status`.
///
/// Looks up every id concurrently. A failed lookup becomes an entry with a
/// `null` status and the error message; it never fails the whole batch.
pub async fn bulk_status_handler(body: Bytes, client: Arc<DocuSignClient>) -> Result<impl Reply, Rejection> {
    let request: BulkStatusRequest = parse_json_body(&body)?;
    if request.envelope_ids.is_empty() {
        return Err(bad_request("envelopeIds must be a non-empty array"));
    }

    let lookups = request.envelope_ids.iter().map(|id| {
        let client = client.clone();
        async move {
            match client.get_envelope(id).await {
                Ok(envelope) => BulkStatusEntry {
                    envelope_id: id.clone(),
                    status: Some(envelope.status),
                    last_modified_date_time: envelope.last_modified_date_time,
                    error: None,
                },
                Err(e) => {
                    debug!("Bulk status lookup failed for {}: {}", id, e);
                    BulkStatusEntry {
                        envelope_id: id.clone(),
                        status: None,
                        last_modified_date_time: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        }
    });
    let results = join_all(lookups).await;

    let errors = results.iter().filter(|r| r.error.is_some()).count();
    let summary = BulkStatusSummary {
        total: results.len(),
        successful: results.len() - errors,
        errors,
    };
    info!(
        "Bulk status: {} envelope(s), {} failed",
        summary.total, summary.errors
    );

    Ok(warp::reply::json(&BulkStatusResponse { results, summary }))
}
