//! DocuSign eSignature REST Client Module
//!
//! This module provides a typed client for the subset of the DocuSign
//! eSignature REST API (v2.1) the gateway exposes. Every call obtains a bearer
//! token from the [`JwtTokenProvider`], performs a single request against the
//! configured account, and turns non-success responses into
//! [`DocuSignError::Api`] carrying the provider's message.

pub mod models;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::auth::JwtTokenProvider;
use crate::config::{DocuSignConfig, DocuSignCredentials};
use crate::error::DocuSignError;
use models::{
    CustomFields, Envelope, EnvelopeDefinition, EnvelopeDocumentsResult, EnvelopeRecipients,
    EnvelopeSummary, EnvelopeUpdate, EnvelopeUpdateSummary, ErrorDetails, Notification,
    RecipientInfo, RecipientViewRequest, RecipientViewUrl, Recipients, RecipientsUpdateSummary,
    Signer,
};

/// Reserved document id of the envelope's certificate of completion (audit trail).
pub const CERTIFICATE_DOCUMENT_ID: &str = "certificate";

/// REST API version segment.
const API_VERSION: &str = "v2.1";

/// Builds the HTTP client shared by the OAuth and REST calls.
pub fn build_http_client(config: &DocuSignConfig) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .no_proxy()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))
}

// ============================================================================
// CLIENT
// ============================================================================

/// Client for one DocuSign account.
pub struct DocuSignClient {
    client: Client,
    /// `{base_path}/v2.1/accounts/{account_id}`
    account_url: Url,
    tokens: JwtTokenProvider,
}

impl DocuSignClient {
    /// Creates a client for the configured account.
    ///
    /// # Arguments
    ///
    /// * `config` - DocuSign settings
    /// * `credentials` - Resolved credentials (account id, key, etc.)
    ///
    /// # Returns
    ///
    /// * `Ok(DocuSignClient)` - Client ready to use
    /// * `Err(anyhow::Error)` - Base path, OAuth URL or private key is invalid
    pub fn new(config: &DocuSignConfig, credentials: &DocuSignCredentials) -> anyhow::Result<Self> {
        let client = build_http_client(config)?;

        let mut account_url = Url::parse(&config.base_path)
            .map_err(|e| anyhow::anyhow!("Invalid DocuSign base path '{}': {}", config.base_path, e))?;
        account_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("DocuSign base path '{}' cannot be a base URL", config.base_path))?
            .pop_if_empty()
            .extend([API_VERSION, "accounts", credentials.account_id.as_str()]);

        let tokens = JwtTokenProvider::new(config, credentials, client.clone())?;

        Ok(Self {
            client,
            account_url,
            tokens,
        })
    }

    /// Token provider used by this client.
    pub fn tokens(&self) -> &JwtTokenProvider {
        &self.tokens
    }

    /// URL below the account, e.g. `["envelopes", id, "recipients"]`.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.account_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    /// Attaches a fresh bearer token, sends, and maps error statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Response, DocuSignError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let details = serde_json::from_str::<ErrorDetails>(&body).unwrap_or_default();
        Err(DocuSignError::Api {
            status: status.as_u16(),
            error_code: details.error_code,
            message: details.message.unwrap_or(if body.is_empty() {
                status.to_string()
            } else {
                body
            }),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DocuSignError> {
        Ok(self.send(request).await?.json::<T>().await?)
    }

    // ------------------------------------------------------------------------
    // Envelopes
    // ------------------------------------------------------------------------

    /// Creates (and, with status `sent`, sends) an envelope.
    pub async fn create_envelope(
        &self,
        definition: &EnvelopeDefinition,
    ) -> Result<EnvelopeSummary, DocuSignError> {
        debug!("Creating envelope '{}'", definition.email_subject);
        let request = self.client.post(self.url(&["envelopes"])).json(definition);
        let summary: EnvelopeSummary = self.send_json(request).await?;
        if summary.envelope_id.is_empty() {
            return Err(DocuSignError::UnexpectedResponse(
                "envelope created without an envelopeId".to_string(),
            ));
        }
        Ok(summary)
    }

    pub async fn get_envelope(&self, envelope_id: &str) -> Result<Envelope, DocuSignError> {
        let request = self.client.get(self.url(&["envelopes", envelope_id]));
        self.send_json(request).await
    }

    /// Voids an in-flight envelope.
    pub async fn void_envelope(
        &self,
        envelope_id: &str,
        reason: &str,
    ) -> Result<EnvelopeUpdateSummary, DocuSignError> {
        let update = EnvelopeUpdate {
            status: Some("voided".to_string()),
            voided_reason: Some(reason.to_string()),
        };
        let request = self.client.put(self.url(&["envelopes", envelope_id])).json(&update);
        check_update(self.send_json(request).await?)
    }

    /// Re-sends the notification emails for pending recipients.
    pub async fn resend_envelope(&self, envelope_id: &str) -> Result<EnvelopeUpdateSummary, DocuSignError> {
        let mut url = self.url(&["envelopes", envelope_id]);
        url.query_pairs_mut().append_pair("resend_envelope", "true");
        let request = self.client.put(url).json(&EnvelopeUpdate::default());
        check_update(self.send_json(request).await?)
    }

    // ------------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------------

    pub async fn list_documents(&self, envelope_id: &str) -> Result<EnvelopeDocumentsResult, DocuSignError> {
        let request = self.client.get(self.url(&["envelopes", envelope_id, "documents"]));
        self.send_json(request).await
    }

    /// Downloads a document as PDF bytes. Use [`CERTIFICATE_DOCUMENT_ID`] for the audit trail.
    pub async fn get_document(&self, envelope_id: &str, document_id: &str) -> Result<Vec<u8>, DocuSignError> {
        let request = self
            .client
            .get(self.url(&["envelopes", envelope_id, "documents", document_id]));
        let bytes = self.send(request).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    // ------------------------------------------------------------------------
    // Recipients
    // ------------------------------------------------------------------------

    pub async fn list_recipients(&self, envelope_id: &str) -> Result<EnvelopeRecipients, DocuSignError> {
        let request = self.client.get(self.url(&["envelopes", envelope_id, "recipients"]));
        self.send_json(request).await
    }

    /// Adds signers and carbon copies to an envelope.
    ///
    /// DocuSign reports per-recipient failures inside a 201 response; the
    /// first one found is returned as an error.
    pub async fn add_recipients(
        &self,
        envelope_id: &str,
        recipients: &Recipients,
    ) -> Result<EnvelopeRecipients, DocuSignError> {
        let request = self
            .client
            .post(self.url(&["envelopes", envelope_id, "recipients"]))
            .json(recipients);
        let added: EnvelopeRecipients = self.send_json(request).await?;

        let failed = added
            .signers
            .iter()
            .chain(added.carbon_copies.iter())
            .find_map(|r: &RecipientInfo| r.error_details.as_ref().map(|e| (r.recipient_id.as_str(), e)));
        if let Some((recipient_id, details)) = failed {
            return Err(recipient_error(recipient_id, details));
        }
        Ok(added)
    }

    /// Updates a single signer's name, email or routing order.
    pub async fn update_recipient(
        &self,
        envelope_id: &str,
        signer: &Signer,
    ) -> Result<RecipientsUpdateSummary, DocuSignError> {
        let body = Recipients {
            signers: vec![signer.clone()],
            carbon_copies: Vec::new(),
        };
        let request = self
            .client
            .put(self.url(&["envelopes", envelope_id, "recipients"]))
            .json(&body);
        let summary: RecipientsUpdateSummary = self.send_json(request).await?;

        if let Some(result) = summary
            .recipient_update_results
            .iter()
            .find(|r| r.error_details.as_ref().is_some_and(|e| e.error_code.as_deref() != Some("SUCCESS")))
        {
            if let Some(details) = &result.error_details {
                return Err(recipient_error(&result.recipient_id, details));
            }
        }
        Ok(summary)
    }

    /// Requests an embedded signing URL for a recipient.
    pub async fn create_recipient_view(
        &self,
        envelope_id: &str,
        view: &RecipientViewRequest,
    ) -> Result<RecipientViewUrl, DocuSignError> {
        let request = self
            .client
            .post(self.url(&["envelopes", envelope_id, "views", "recipient"]))
            .json(view);
        self.send_json(request).await
    }

    // ------------------------------------------------------------------------
    // Custom fields and notification
    // ------------------------------------------------------------------------

    pub async fn get_custom_fields(&self, envelope_id: &str) -> Result<CustomFields, DocuSignError> {
        let request = self.client.get(self.url(&["envelopes", envelope_id, "custom_fields"]));
        self.send_json(request).await
    }

    pub async fn create_custom_fields(
        &self,
        envelope_id: &str,
        fields: &CustomFields,
    ) -> Result<CustomFields, DocuSignError> {
        let request = self
            .client
            .post(self.url(&["envelopes", envelope_id, "custom_fields"]))
            .json(fields);
        self.send_json(request).await
    }

    /// Replaces the envelope's expiration settings.
    pub async fn update_expiration(
        &self,
        envelope_id: &str,
        notification: &Notification,
    ) -> Result<Notification, DocuSignError> {
        let request = self
            .client
            .put(self.url(&["envelopes", envelope_id, "notification"]))
            .json(notification);
        self.send_json(request).await
    }
}

fn check_update(summary: EnvelopeUpdateSummary) -> Result<EnvelopeUpdateSummary, DocuSignError> {
    match &summary.error_details {
        Some(details) if details.error_code.is_some() => Err(DocuSignError::Api {
            status: 200,
            error_code: details.error_code.clone(),
            message: details.message.clone().unwrap_or_else(|| "Envelope update failed".to_string()),
        }),
        _ => Ok(summary),
    }
}

fn recipient_error(recipient_id: &str, details: &ErrorDetails) -> DocuSignError {
    DocuSignError::Api {
        status: 200,
        error_code: details.error_code.clone(),
        message: format!(
            "recipient {}: {}",
            recipient_id,
            details.message.as_deref().unwrap_or("request rejected")
        ),
    }
}
