//! Unit tests for envelope assembly, tab placement and signature section injection

use base64::{engine::general_purpose, Engine as _};
use docusign_gateway::docusign::models::Tab;
use docusign_gateway::envelope::html::{ensure_signature_section, SIGNATURE_SECTION_MARKER};
use docusign_gateway::envelope::{
    build_envelope_definition, signature_tabs, PositionError, SignaturePosition, SignatureRequest,
    MAX_COORDINATE, SIGNATURE_ANCHOR,
};
use std::borrow::Cow;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn position(page: &str, x: i64, y: i64) -> SignaturePosition {
    SignaturePosition {
        page_number: page.to_string(),
        x_position: x,
        y_position: y,
    }
}

fn has_anchor_fields(tab: &Tab) -> bool {
    tab.anchor_string.is_some()
        || tab.anchor_units.is_some()
        || tab.anchor_x_offset.is_some()
        || tab.anchor_y_offset.is_some()
}

fn has_absolute_fields(tab: &Tab) -> bool {
    tab.page_number.is_some() || tab.x_position.is_some() || tab.y_position.is_some()
}

fn number(value: &Option<String>) -> i64 {
    value.as_deref().unwrap().parse().unwrap()
}

// ============================================================================
// POSITION PARSING TESTS
// ============================================================================

/// What is tested: Absent and blank form fields give the anchor default ("last", 100, 700)
/// Why: Most callers do not know the rendered page count
#[test]
fn test_position_defaults() {
    let parsed = SignaturePosition::from_form(None, Some(""), Some("  ")).unwrap();
    assert_eq!(parsed, position("last", 100, 700));
    assert!(parsed.uses_anchor());
}

/// What is tested: "999" is treated like "last"
/// Why: Both values select anchor placement
#[test]
fn test_position_999_uses_anchor() {
    let parsed = SignaturePosition::from_form(Some("999"), None, None).unwrap();
    assert!(parsed.uses_anchor());
}

/// What is tested: A numeric page with coordinates selects absolute placement
/// Why: Callers who know the layout can pin the signature
#[test]
fn test_position_explicit_page() {
    let parsed = SignaturePosition::from_form(Some("3"), Some("120"), Some("-40")).unwrap();
    assert_eq!(parsed, position("3", 120, -40));
    assert!(!parsed.uses_anchor());
}

/// What is tested: Zero, negative and non-numeric pages are rejected
/// Why: DocuSign pages are numbered from 1
#[test]
fn test_position_invalid_page() {
    for page in ["0", "-1", "first", "1.5"] {
        assert_eq!(
            SignaturePosition::from_form(Some(page), None, None),
            Err(PositionError::InvalidPage(page.to_string())),
            "page {}",
            page
        );
    }
}

/// What is tested: Non-integer coordinates are rejected and name the field
/// Why: The caller needs to know which value to fix
#[test]
fn test_position_invalid_coordinate() {
    let err = SignaturePosition::from_form(Some("1"), Some("12.5"), None).unwrap_err();
    assert_eq!(
        err,
        PositionError::InvalidCoordinate {
            field: "signatureXPosition",
            value: "12.5".to_string()
        }
    );
    assert!(err.to_string().contains("signatureXPosition"));
}

/// What is tested: Coordinates beyond the accepted range are rejected, the bounds themselves are accepted
/// Why: Values near the integer limits would overflow when the date and name offsets are applied
#[test]
fn test_position_coordinate_out_of_range() {
    let err = SignaturePosition::from_form(Some("1"), Some("9223372036854775807"), Some("700")).unwrap_err();
    assert_eq!(
        err,
        PositionError::CoordinateOutOfRange {
            field: "signatureXPosition",
            value: "9223372036854775807".to_string()
        }
    );

    let err = SignaturePosition::from_form(Some("1"), None, Some("-9223372036854775808")).unwrap_err();
    assert!(matches!(
        err,
        PositionError::CoordinateOutOfRange { field: "signatureYPosition", .. }
    ));

    let max = MAX_COORDINATE.to_string();
    let min = (-MAX_COORDINATE).to_string();
    let parsed = SignaturePosition::from_form(Some("1"), Some(&max), Some(&min)).unwrap();
    assert_eq!(parsed, position("1", MAX_COORDINATE, -MAX_COORDINATE));
}

/// What is tested: Tabs for a position at the integer limits are built without overflowing
/// Why: Positions constructed directly bypass form parsing
#[test]
fn test_tabs_at_integer_limits() {
    let tabs = signature_tabs(&position("1", i64::MAX, i64::MIN));
    assert_eq!(number(&tabs.date_signed_tabs[0].x_position), i64::MAX);
    assert_eq!(number(&tabs.full_name_tabs[0].y_position), i64::MIN);
}

// ============================================================================
// TAB PLACEMENT TESTS
// ============================================================================

/// What is tested: Anchor and absolute placement are mutually exclusive on every tab
/// Why: DocuSign would otherwise combine both and misplace the fields
#[test]
fn test_placement_modes_are_exclusive() {
    for page in ["last", "999", "1", "2", "17"] {
        let tabs = signature_tabs(&position(page, 100, 700));
        let all: Vec<&Tab> = tabs
            .sign_here_tabs
            .iter()
            .chain(&tabs.date_signed_tabs)
            .chain(&tabs.full_name_tabs)
            .collect();
        assert_eq!(all.len(), 3);

        let anchored = page == "last" || page == "999";
        for tab in all {
            assert_eq!(has_anchor_fields(tab), anchored, "page {} tab {}", page, tab.tab_label);
            assert_eq!(has_absolute_fields(tab), !anchored, "page {} tab {}", page, tab.tab_label);
        }
    }
}

/// What is tested: Absolute mode puts the date 200 right of and the name 50 above the signature
/// Why: The three fields form one visual block
#[test]
fn test_absolute_offsets() {
    for (x, y) in [(100, 700), (0, 0), (350, 120), (-20, 45)] {
        let tabs = signature_tabs(&position("2", x, y));
        let sign = &tabs.sign_here_tabs[0];
        let date = &tabs.date_signed_tabs[0];
        let name = &tabs.full_name_tabs[0];

        assert_eq!(number(&sign.x_position), x);
        assert_eq!(number(&sign.y_position), y);
        assert_eq!(number(&date.x_position), number(&sign.x_position) + 200);
        assert_eq!(number(&date.y_position), number(&sign.y_position));
        assert_eq!(number(&name.x_position), number(&sign.x_position));
        assert_eq!(number(&name.y_position), number(&sign.y_position) - 50);
        assert_eq!(sign.page_number.as_deref(), Some("2"));
    }
}

/// What is tested: Anchor mode uses the same relative offsets on the anchor text
/// Why: The layout must not depend on the placement mode
#[test]
fn test_anchor_offsets() {
    let tabs = signature_tabs(&position("last", 100, 700));
    let sign = &tabs.sign_here_tabs[0];
    let date = &tabs.date_signed_tabs[0];
    let name = &tabs.full_name_tabs[0];

    for tab in [sign, date, name] {
        assert_eq!(tab.anchor_string.as_deref(), Some(SIGNATURE_ANCHOR));
        assert_eq!(tab.anchor_units.as_deref(), Some("pixels"));
        assert_eq!(tab.document_id, "1");
        assert_eq!(tab.recipient_id, "1");
    }
    assert_eq!(number(&date.anchor_x_offset), number(&sign.anchor_x_offset) + 200);
    assert_eq!(number(&date.anchor_y_offset), number(&sign.anchor_y_offset));
    assert_eq!(number(&name.anchor_x_offset), number(&sign.anchor_x_offset));
    assert_eq!(number(&name.anchor_y_offset), number(&sign.anchor_y_offset) - 50);
}

/// What is tested: Tabs carry the fixed labels
/// Why: Labels identify the fields in DocuSign reports
#[test]
fn test_tab_labels() {
    let tabs = signature_tabs(&SignaturePosition::default());
    assert_eq!(tabs.sign_here_tabs[0].tab_label, "SignHereTab");
    assert_eq!(tabs.date_signed_tabs[0].tab_label, "DateSignedTab");
    assert_eq!(tabs.full_name_tabs[0].tab_label, "FullNameTab");
}

// ============================================================================
// SIGNATURE SECTION INJECTION TESTS
// ============================================================================

/// What is tested: A document without the marker gets the block appended with the anchor text
/// Why: Anchor placement needs the anchor text in the document
#[test]
fn test_injection_appends_block() {
    let html = "<html><body><p>Agreement</p></body></html>";
    let enhanced = ensure_signature_section(html);

    assert!(enhanced.starts_with(html));
    assert!(enhanced.contains(SIGNATURE_SECTION_MARKER));
    assert!(enhanced.contains(SIGNATURE_ANCHOR));
    assert!(enhanced.contains("Full Name:"));
    assert!(enhanced.contains("Signature:"));
    assert!(enhanced.contains("Date:"));
}

/// What is tested: Injection is idempotent and leaves marked documents untouched
/// Why: Documents that already have a signature section must not get a second one
#[test]
fn test_injection_is_idempotent() {
    let marked = "<div class=\"signature-section\">Sign here</div>";
    assert!(matches!(ensure_signature_section(marked), Cow::Borrowed(_)));
    assert_eq!(ensure_signature_section(marked), marked);

    let once = ensure_signature_section("<p>Plain</p>").into_owned();
    let twice = ensure_signature_section(&once);
    assert_eq!(twice, once);
    assert_eq!(once.matches(SIGNATURE_SECTION_MARKER).count(), 1);
}

// ============================================================================
// ENVELOPE DEFINITION TESTS
// ============================================================================

/// What is tested: The envelope carries the base64 document, one signer with tabs and status "sent"
/// Why: This is the body DocuSign receives on envelope creation
#[test]
fn test_build_envelope_definition() {
    let request = SignatureRequest {
        document_name: "contract.html".to_string(),
        content: b"<p>Contract</p>".to_vec(),
        signer_email: "jane@example.com".to_string(),
        signer_name: "Jane Doe".to_string(),
        position: SignaturePosition::default(),
    };

    let definition = build_envelope_definition(&request, "Please sign this document");

    assert_eq!(definition.email_subject, "Please sign this document");
    assert_eq!(definition.status, "sent");
    assert_eq!(definition.documents.len(), 1);
    let document = &definition.documents[0];
    assert_eq!(document.document_id, "1");
    assert_eq!(document.name, "contract.html");
    assert_eq!(document.file_extension, "html");
    assert_eq!(
        general_purpose::STANDARD.decode(&document.document_base64).unwrap(),
        b"<p>Contract</p>"
    );

    assert_eq!(definition.recipients.signers.len(), 1);
    assert!(definition.recipients.carbon_copies.is_empty());
    let signer = &definition.recipients.signers[0];
    assert_eq!(signer.recipient_id, "1");
    assert_eq!(signer.routing_order.as_deref(), Some("1"));
    assert_eq!(signer.email.as_deref(), Some("jane@example.com"));
    assert_eq!(signer.name.as_deref(), Some("Jane Doe"));
    assert_eq!(signer.tabs.as_ref(), Some(&signature_tabs(&request.position)));
}

/// What is tested: Serialized tabs omit the unused placement group entirely
/// Why: Null anchor or position fields must never reach DocuSign
#[test]
fn test_serialized_tabs_omit_unused_fields() {
    let anchored = serde_json::to_value(signature_tabs(&SignaturePosition::default())).unwrap();
    let sign = &anchored["signHereTabs"][0];
    assert!(sign.get("pageNumber").is_none());
    assert!(sign.get("xPosition").is_none());
    assert_eq!(sign["anchorXOffset"], "0");

    let absolute = serde_json::to_value(signature_tabs(&position("1", 10, 20))).unwrap();
    let date = &absolute["dateSignedTabs"][0];
    assert!(date.get("anchorString").is_none());
    assert_eq!(date["xPosition"], "210");
    assert_eq!(date["documentId"], "1");
}
