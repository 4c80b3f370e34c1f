//! URL-safe Base64 (RFC 4648 §5) used for record ids.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::error::{LidoError, Result};

/// Encode bytes with the URL-safe alphabet.
///
/// # Examples
/// ```
/// use lido_indexer::encode::base64_url_encode;
///
/// assert_eq!(base64_url_encode("DE-Mb112/lido/7?", false), "REUtTWIxMTIvbGlkby83Pw");
/// assert_eq!(base64_url_encode("DE-Mb112/lido/7?", true), "REUtTWIxMTIvbGlkby83Pw==");
/// ```
pub fn base64_url_encode(data: impl AsRef<[u8]>, pad: bool) -> String {
    if pad {
        URL_SAFE.encode(data)
    } else {
        URL_SAFE_NO_PAD.encode(data)
    }
}

/// Decode URL-safe Base64, with or without padding.
pub fn base64_url_decode(data: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .map_err(|e| LidoError::Config(format!("invalid base64 '{data}': {e}")))
}
