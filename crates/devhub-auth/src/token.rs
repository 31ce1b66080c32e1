//! Random one-time tokens and public handles.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// A 32-byte random token, URL-safe base64 without padding.
pub fn confirmation_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

/// A 16-byte random handle, lowercase hex (32 characters).
pub fn public_code() -> String {
    rand::random::<[u8; 16]>()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
