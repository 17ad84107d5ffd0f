//! DocuSign eSignature REST (v2.1) request and response structures.
//!
//! Only the fields this gateway reads or writes are modelled. DocuSign encodes
//! numbers and booleans as JSON strings in most places, and these structures
//! keep that representation. Optional request fields are skipped when unset so
//! an omitted value never reaches the provider as `null`.

use serde::{Deserialize, Serialize};

// ============================================================================
// ENVELOPE DEFINITION (CREATE)
// ============================================================================

/// Envelope creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDefinition {
    pub email_subject: String,
    pub documents: Vec<Document>,
    pub recipients: Recipients,
    /// `"sent"` sends immediately, `"created"` would save a draft
    pub status: String,
}

/// A document carried inline in an envelope request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_base64: String,
    pub name: String,
    pub file_extension: String,
    pub document_id: String,
}

/// Recipient collection used by create, add and update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipients {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signers: Vec<Signer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub carbon_copies: Vec<CarbonCopy>,
}

/// Signer entry in a request. Partial updates leave fields unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub recipient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Tabs>,
}

/// Carbon-copy recipient entry in a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonCopy {
    pub recipient_id: String,
    pub email: String,
    pub name: String,
    pub routing_order: String,
}

/// Tabs attached to a signer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tabs {
    #[serde(default)]
    pub sign_here_tabs: Vec<Tab>,
    #[serde(default)]
    pub date_signed_tabs: Vec<Tab>,
    #[serde(default)]
    pub full_name_tabs: Vec<Tab>,
}

/// A placed field.
///
/// Exactly one of the two placement groups is populated: page/X/Y for
/// absolute placement, or the anchor fields for anchor placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub document_id: String,
    pub recipient_id: String,
    pub tab_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_x_offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_y_offset: Option<String>,
}

/// Response to envelope creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSummary {
    pub envelope_id: String,
    pub status: String,
    #[serde(default)]
    pub status_date_time: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

// ============================================================================
// ENVELOPE STATE
// ============================================================================

/// Envelope as returned by `GET /envelopes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub envelope_id: String,
    pub status: String,
    #[serde(default)]
    pub created_date_time: Option<String>,
    #[serde(default)]
    pub last_modified_date_time: Option<String>,
    #[serde(default)]
    pub sent_date_time: Option<String>,
    #[serde(default)]
    pub completed_date_time: Option<String>,
    #[serde(default)]
    pub email_subject: Option<String>,
    #[serde(default)]
    pub voided_reason: Option<String>,
}

/// Partial envelope update used to void or resend.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voided_reason: Option<String>,
}

/// Response to an envelope update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeUpdateSummary {
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub error_details: Option<ErrorDetails>,
}

// ============================================================================
// DOCUMENTS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDocumentsResult {
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub envelope_documents: Vec<EnvelopeDocument>,
}

/// Document metadata within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDocument {
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

// ============================================================================
// RECIPIENTS
// ============================================================================

/// Recipients of an envelope as returned by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeRecipients {
    #[serde(default)]
    pub signers: Vec<RecipientInfo>,
    #[serde(default)]
    pub carbon_copies: Vec<RecipientInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_routing_order: Option<String>,
}

/// One recipient with its signing progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientInfo {
    pub recipient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declined_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declined_reason: Option<String>,
    /// Per-recipient failure reported inside an otherwise successful response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
}

/// Response to `PUT /envelopes/{id}/recipients`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientsUpdateSummary {
    #[serde(default)]
    pub recipient_update_results: Vec<RecipientUpdateResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientUpdateResult {
    pub recipient_id: String,
    #[serde(default)]
    pub error_details: Option<ErrorDetails>,
}

// ============================================================================
// CUSTOM FIELDS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFields {
    #[serde(default)]
    pub text_custom_fields: Vec<TextCustomField>,
    #[serde(default)]
    pub list_custom_fields: Vec<ListCustomField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextCustomField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCustomField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub list_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<String>,
}

// ============================================================================
// NOTIFICATION (EXPIRATION)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_account_defaults: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expirations: Option<Expirations>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expirations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_enabled: Option<String>,
    /// Days after sending before the envelope expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_after: Option<String>,
    /// Days before expiry that a warning is sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_warn: Option<String>,
}

// ============================================================================
// EMBEDDED SIGNING
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientViewRequest {
    pub return_url: String,
    pub authentication_method: String,
    pub email: String,
    pub user_name: String,
    pub recipient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipientViewUrl {
    pub url: String,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Error body returned by the REST API (`{"errorCode": ..., "message": ...}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
