//! Signature section injection for uploaded HTML.
//!
//! This is a plain text operation. The HTML is not parsed or sanitized;
//! DocuSign renders the document itself.

use std::borrow::Cow;

use super::SIGNATURE_ANCHOR;

/// Substring that marks an existing signature section.
pub const SIGNATURE_SECTION_MARKER: &str = "signature-section";

/// Ensures the document contains a signature section.
///
/// Returns the input unchanged when it already contains
/// [`SIGNATURE_SECTION_MARKER`], so applying it twice never adds a second
/// block. Otherwise a block with blank lines for name, signature and date is
/// appended. The block carries the [`SIGNATURE_ANCHOR`] text that anchor-based
/// tab placement looks for.
pub fn ensure_signature_section(html: &str) -> Cow<'_, str> {
    if html.contains(SIGNATURE_SECTION_MARKER) {
        return Cow::Borrowed(html);
    }

    let mut enhanced = String::with_capacity(html.len() + SIGNATURE_BLOCK_LEN_HINT);
    enhanced.push_str(html);
    enhanced.push_str(&signature_block());
    Cow::Owned(enhanced)
}

const SIGNATURE_BLOCK_LEN_HINT: usize = 1024;

fn signature_block() -> String {
    format!(
        r#"
<div class="{marker}" style="margin-top: 50px; padding: 20px; border-top: 1px solid #ccc;">
  <h3>Signature Required</h3>
  <p>Please provide your signature, name, and date below:</p>
  <div style="margin-top: 30px;">
    <div style="margin-bottom: 20px;">
      <label>Full Name: </label>
      <div style="border-bottom: 1px solid #000; width: 200px; display: inline-block;"></div>
    </div>
    <div style="margin-bottom: 20px;">
      <label>Signature: </label>
      <span style="color: #fff;">{anchor}</span>
      <div style="border-bottom: 1px solid #000; width: 200px; display: inline-block;"></div>
    </div>
    <div style="margin-bottom: 20px;">
      <label>Date: </label>
      <div style="border-bottom: 1px solid #000; width: 200px; display: inline-block;"></div>
    </div>
  </div>
</div>
"#,
        marker = SIGNATURE_SECTION_MARKER,
        anchor = SIGNATURE_ANCHOR,
    )
}
