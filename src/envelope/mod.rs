//! Envelope Assembly Module
//!
//! Turns an uploaded document and a signer into a DocuSign envelope
//! definition with three tabs (signature, date signed, full name).
//!
//! ## Tab placement
//!
//! The caller may pin the signature to a page and X/Y position. Because the
//! page count of an HTML document is unknown until DocuSign renders it, the
//! default is anchor placement: every tab is positioned relative to the
//! [`SIGNATURE_ANCHOR`] text that [`html::ensure_signature_section`] adds at
//! the end of the document. The date tab always sits 200 units right of the
//! signature and the name tab 50 units above it, in both modes.

pub mod html;

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

use crate::docusign::models::{Document, EnvelopeDefinition, Recipients, Signer, Tab, Tabs};

/// Anchor text the tabs attach to in anchor mode.
pub const SIGNATURE_ANCHOR: &str = "{{signature}}";

/// Page values that select anchor placement on the last page.
pub const ANCHOR_PAGE_SENTINELS: [&str; 2] = ["last", "999"];

pub const DEFAULT_X_POSITION: i64 = 100;
pub const DEFAULT_Y_POSITION: i64 = 700;

/// Horizontal distance from the signature tab to the date tab.
pub const DATE_TAB_X_OFFSET: i64 = 200;
/// Vertical distance from the signature tab to the full-name tab.
pub const NAME_TAB_Y_OFFSET: i64 = -50;

/// Largest absolute coordinate accepted from the caller.
pub const MAX_COORDINATE: i64 = 100_000;

const DOCUMENT_ID: &str = "1";
const DOCUMENT_FILE_EXTENSION: &str = "html";
const SIGNER_RECIPIENT_ID: &str = "1";
const SIGNER_ROUTING_ORDER: &str = "1";
const ANCHOR_UNITS: &str = "pixels";

// ============================================================================
// POSITIONING
// ============================================================================

/// Invalid positioning field supplied by the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("signaturePageNumber must be a positive integer, \"last\" or \"999\" (got '{0}')")]
    InvalidPage(String),
    #[error("{field} must be an integer (got '{value}')")]
    InvalidCoordinate { field: &'static str, value: String },
    #[error("{field} must be between -{max} and {max} (got '{value}')", max = MAX_COORDINATE)]
    CoordinateOutOfRange { field: &'static str, value: String },
}

/// Where the signature tab goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePosition {
    /// A page number, or one of [`ANCHOR_PAGE_SENTINELS`]
    pub page_number: String,
    pub x_position: i64,
    pub y_position: i64,
}

impl Default for SignaturePosition {
    fn default() -> Self {
        Self {
            page_number: ANCHOR_PAGE_SENTINELS[0].to_string(),
            x_position: DEFAULT_X_POSITION,
            y_position: DEFAULT_Y_POSITION,
        }
    }
}

impl SignaturePosition {
    /// Parses the optional form fields of the signature endpoint.
    ///
    /// Absent or blank values fall back to the defaults.
    ///
    /// # Arguments
    ///
    /// * `page` - `signaturePageNumber`
    /// * `x` - `signatureXPosition`
    /// * `y` - `signatureYPosition`
    ///
    /// # Returns
    ///
    /// * `Ok(SignaturePosition)` - Parsed position
    /// * `Err(PositionError)` - A supplied value is not usable
    pub fn from_form(
        page: Option<&str>,
        x: Option<&str>,
        y: Option<&str>,
    ) -> Result<Self, PositionError> {
        let defaults = Self::default();

        let page_number = match non_blank(page) {
            None => defaults.page_number,
            Some(p) if ANCHOR_PAGE_SENTINELS.contains(&p) => p.to_string(),
            Some(p) => match p.parse::<u32>() {
                Ok(n) if n > 0 => n.to_string(),
                _ => return Err(PositionError::InvalidPage(p.to_string())),
            },
        };

        Ok(Self {
            page_number,
            x_position: parse_coordinate("signatureXPosition", x, defaults.x_position)?,
            y_position: parse_coordinate("signatureYPosition", y, defaults.y_position)?,
        })
    }

    /// Whether tabs are placed relative to the anchor text.
    pub fn uses_anchor(&self) -> bool {
        ANCHOR_PAGE_SENTINELS.contains(&self.page_number.as_str())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_coordinate(
    field: &'static str,
    value: Option<&str>,
    default: i64,
) -> Result<i64, PositionError> {
    match non_blank(value) {
        None => Ok(default),
        Some(v) => {
            let parsed: i64 = v.parse().map_err(|_| PositionError::InvalidCoordinate {
                field,
                value: v.to_string(),
            })?;
            if !(-MAX_COORDINATE..=MAX_COORDINATE).contains(&parsed) {
                return Err(PositionError::CoordinateOutOfRange {
                    field,
                    value: v.to_string(),
                });
            }
            Ok(parsed)
        }
    }
}

// ============================================================================
// TABS
// ============================================================================

/// Builds the signature, date-signed and full-name tabs for a position.
pub fn signature_tabs(position: &SignaturePosition) -> Tabs {
    let place = |label: &str, dx: i64, dy: i64| -> Tab {
        let mut tab = Tab {
            document_id: DOCUMENT_ID.to_string(),
            recipient_id: SIGNER_RECIPIENT_ID.to_string(),
            tab_label: label.to_string(),
            ..Tab::default()
        };
        if position.uses_anchor() {
            tab.anchor_string = Some(SIGNATURE_ANCHOR.to_string());
            tab.anchor_units = Some(ANCHOR_UNITS.to_string());
            tab.anchor_x_offset = Some(dx.to_string());
            tab.anchor_y_offset = Some(dy.to_string());
        } else {
            tab.page_number = Some(position.page_number.clone());
            tab.x_position = Some(position.x_position.saturating_add(dx).to_string());
            tab.y_position = Some(position.y_position.saturating_add(dy).to_string());
        }
        tab
    };

    Tabs {
        sign_here_tabs: vec![place("SignHereTab", 0, 0)],
        date_signed_tabs: vec![place("DateSignedTab", DATE_TAB_X_OFFSET, 0)],
        full_name_tabs: vec![place("FullNameTab", 0, NAME_TAB_Y_OFFSET)],
    }
}

// ============================================================================
// ENVELOPE
// ============================================================================

/// Everything needed to send one document to one signer.
#[derive(Debug, Clone)]
pub struct SignatureRequest {
    pub document_name: String,
    pub content: Vec<u8>,
    pub signer_email: String,
    pub signer_name: String,
    pub position: SignaturePosition,
}

/// Assembles the envelope definition for a signature request.
///
/// The envelope is created with status `sent`, so DocuSign emails the signer
/// immediately.
///
/// # Arguments
///
/// * `request` - Document, signer and tab position
/// * `email_subject` - Subject of the signing email
pub fn build_envelope_definition(request: &SignatureRequest, email_subject: &str) -> EnvelopeDefinition {
    let document = Document {
        document_base64: general_purpose::STANDARD.encode(&request.content),
        name: request.document_name.clone(),
        file_extension: DOCUMENT_FILE_EXTENSION.to_string(),
        document_id: DOCUMENT_ID.to_string(),
    };

    let signer = Signer {
        recipient_id: SIGNER_RECIPIENT_ID.to_string(),
        email: Some(request.signer_email.clone()),
        name: Some(request.signer_name.clone()),
        routing_order: Some(SIGNER_ROUTING_ORDER.to_string()),
        tabs: Some(signature_tabs(&request.position)),
    };

    EnvelopeDefinition {
        email_subject: email_subject.to_string(),
        documents: vec![document],
        recipients: Recipients {
            signers: vec![signer],
            carbon_copies: Vec::new(),
        },
        status: "sent".to_string(),
    }
}
