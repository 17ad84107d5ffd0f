//! Signature request endpoint
//!
//! `POST /api/docusign-signature` accepts a multipart form with an HTML file
//! and the signer's details, adds a signature section to the document when it
//! has none, and sends it to DocuSign as a new envelope.
//!
//! The uploaded file is staged on disk for the duration of the request only.
//! [`StagedUpload`] owns a [`NamedTempFile`], so the file is removed when the
//! handler returns, whether the envelope was sent or not.

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use warp::multipart::{FormData, Part};
use warp::{Buf, Rejection, Reply};

use super::generic::{bad_request, upstream_failure, UpstreamFailure};
use crate::config::Config;
use crate::docusign::DocuSignClient;
use crate::envelope::html::ensure_signature_section;
use crate::envelope::{build_envelope_definition, SignaturePosition, SignatureRequest};

/// Form field carrying the document.
pub const FILE_FIELD: &str = "htmlFile";

/// Name used when the upload has no filename.
pub const DEFAULT_DOCUMENT_NAME: &str = "document.html";

const PROCESS_FAILURE: &str = "Failed to process document";

/// Successful response of the signature endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResponse {
    pub success: bool,
    pub message: String,
    pub envelope_id: String,
    pub status: String,
    pub recipient_email: String,
}

/// Uploaded file held in a temporary file until dropped.
pub struct StagedUpload {
    pub original_name: Option<String>,
    file: NamedTempFile,
}

impl StagedUpload {
    /// Reads the staged content back from disk.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }
}

/// Fields collected from the multipart form.
#[derive(Default)]
struct SignatureForm {
    email: Option<String>,
    signer_name: Option<String>,
    page_number: Option<String>,
    x_position: Option<String>,
    y_position: Option<String>,
    upload: Option<StagedUpload>,
}

async fn read_part(part: Part) -> Result<Vec<u8>, warp::Error> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, mut chunk| async move {
            while chunk.has_remaining() {
                let bytes = chunk.chunk();
                let len = bytes.len();
                acc.extend_from_slice(bytes);
                chunk.advance(len);
            }
            Ok(acc)
        })
        .await
}

async fn stage_upload(
    upload_dir: &str,
    original_name: Option<String>,
    content: Vec<u8>,
) -> std::io::Result<StagedUpload> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let dir = upload_dir.to_string();
    let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&content)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;
    Ok(StagedUpload { original_name, file })
}

fn text_value(bytes: Vec<u8>) -> Option<String> {
    let value = String::from_utf8_lossy(&bytes).trim().to_string();
    (!value.is_empty()).then_some(value)
}

async fn read_form(mut form: FormData, upload_dir: &str) -> Result<SignatureForm, Rejection> {
    let mut fields = SignatureForm::default();

    while let Some(part) = form
        .try_next()
        .await
        .map_err(|e| bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = part.name().to_string();
        let filename = part.filename().map(str::to_string);
        let data = read_part(part)
            .await
            .map_err(|e| bad_request(format!("Invalid multipart body: {}", e)))?;

        match name.as_str() {
            FILE_FIELD => {
                debug!("Received upload '{}' ({} bytes)", filename.as_deref().unwrap_or("-"), data.len());
                let filename = filename.filter(|n| !n.trim().is_empty());
                let staged = stage_upload(upload_dir, filename, data).await.map_err(|e| {
                    warp::reject::custom(UpstreamFailure {
                        error: PROCESS_FAILURE.to_string(),
                        details: format!("Failed to stage upload: {}", e),
                    })
                })?;
                fields.upload = Some(staged);
            }
            "email" => fields.email = text_value(data),
            "signerName" => fields.signer_name = text_value(data),
            "signaturePageNumber" => fields.page_number = text_value(data),
            "signatureXPosition" => fields.x_position = text_value(data),
            "signatureYPosition" => fields.y_position = text_value(data),
            other => debug!("Ignoring unexpected form field '{}'", other),
        }
    }

    Ok(fields)
}

/// Handler for `POST /api/docusign-signature`.
///
/// # Returns
///
/// * `Ok(warp::Reply)` - Envelope created and sent
/// * `Err(BadRequest)` - Missing email, signer name or file, or an invalid position
/// * `Err(UpstreamFailure)` - Staging, authentication or envelope creation failed
pub async fn create_signature_handler(
    form: FormData,
    client: Arc<DocuSignClient>,
    config: Arc<Config>,
) -> Result<impl Reply, Rejection> {
    let form = read_form(form, &config.api.upload_dir).await?;

    let (Some(email), Some(signer_name)) = (form.email.clone(), form.signer_name.clone()) else {
        return Err(bad_request("Email and signer name are required"));
    };
    let Some(upload) = form.upload.as_ref() else {
        return Err(bad_request("HTML file is required"));
    };

    let position = SignaturePosition::from_form(
        form.page_number.as_deref(),
        form.x_position.as_deref(),
        form.y_position.as_deref(),
    )
    .map_err(|e| bad_request(e.to_string()))?;

    let content = upload.read().await.map_err(|e| {
        warp::reject::custom(UpstreamFailure {
            error: PROCESS_FAILURE.to_string(),
            details: format!("Failed to read staged upload: {}", e),
        })
    })?;
    let html = String::from_utf8_lossy(&content);
    let enhanced = ensure_signature_section(&html);

    let request = SignatureRequest {
        document_name: upload
            .original_name
            .clone()
            .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string()),
        content: enhanced.as_bytes().to_vec(),
        signer_email: email.clone(),
        signer_name,
        position,
    };
    let definition = build_envelope_definition(&request, &config.docusign.email_subject);

    let summary = client
        .create_envelope(&definition)
        .await
        .map_err(|e| upstream_failure(PROCESS_FAILURE, None, e))?;

    info!("Envelope {} sent to {}", summary.envelope_id, email);

    Ok(warp::reply::json(&SignatureResponse {
        success: true,
        message: "Document sent for signature successfully".to_string(),
        envelope_id: summary.envelope_id,
        status: summary.status,
        recipient_email: email,
    }))
}
