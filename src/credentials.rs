//! Private Key Normalization Module
//!
//! The DocuSign RSA private key usually arrives through an environment
//! variable or a `.env` file, where multi-line values are commonly stored
//! with literal `\n` escapes and wrapped in quotes. This module turns such a
//! value back into a clean PEM string and checks that it looks like an RSA
//! private key before anything tries to sign with it.

use anyhow::Result;

/// Header marker every accepted key must contain.
pub const RSA_PRIVATE_KEY_MARKER: &str = "BEGIN RSA PRIVATE KEY";

/// Number of characters shown when reporting an invalid key value.
const PREVIEW_LEN: usize = 50;

/// Normalizes a raw private-key configuration value into a PEM string.
///
/// Each literal two-character `\n` sequence becomes a real line break, then
/// one leading and one trailing quote character (`"` or `'`) are removed
/// if present.
///
/// # Arguments
///
/// * `raw` - The value as read from the environment
///
/// # Returns
///
/// The normalized PEM text
pub fn normalize_private_key(raw: &str) -> String {
    let unescaped = if raw.contains("\\n") {
        raw.replace("\\n", "\n")
    } else {
        raw.to_string()
    };

    let without_leading = unescaped
        .strip_prefix(['"', '\''])
        .unwrap_or(&unescaped);
    let trimmed = without_leading
        .strip_suffix(['"', '\''])
        .unwrap_or(without_leading);

    trimmed.to_string()
}

/// Checks that a normalized key carries the RSA private key header.
///
/// # Arguments
///
/// * `pem` - Normalized PEM text
///
/// # Returns
///
/// * `Ok(())` - The header marker is present
/// * `Err(anyhow::Error)` - The value is not an RSA private key; the error
///   includes a truncated preview of the value
pub fn validate_private_key(pem: &str) -> Result<()> {
    if pem.contains(RSA_PRIVATE_KEY_MARKER) {
        return Ok(());
    }

    let preview: String = pem.chars().take(PREVIEW_LEN).collect();
    Err(anyhow::anyhow!(
        "DocuSign private key must be a valid RSA private key starting with \
         -----{}-----. Current value appears to be: {}...",
        RSA_PRIVATE_KEY_MARKER,
        preview
    ))
}
