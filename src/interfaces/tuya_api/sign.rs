//! Request signing for the cloud API.
//!
//! Every call carries an HMAC-SHA256 signature over a canonical string, hex
//! encoded in lowercase and keyed by the access secret. Token requests sign
//! `client_id + t`; authenticated requests also include the token and a
//! request description.
//!
//! The request description leaves the content-hash line empty instead of
//! hashing the body. This API tier accepts it; the general vendor signing
//! scheme asks for a SHA256 of the body there.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::ApiError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGN_METHOD: &str = "HMAC-SHA256";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

pub fn token_string_to_sign(access_id: &str, timestamp: &str) -> String {
    format!("{access_id}{timestamp}")
}

pub fn request_string_to_sign(
    access_id: &str,
    token: &str,
    timestamp: &str,
    method: Method,
    body: &str,
    path: &str,
) -> String {
    format!(
        "{access_id}{token}{timestamp}{}\n\n{body}\n{path}",
        method.as_str()
    )
}

/// Lowercase hex HMAC-SHA256 of `payload`. The error path only exists because
/// the keyed constructor is fallible by signature.
pub fn sign(secret: &str, payload: &str) -> Result<String, ApiError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| ApiError::InvalidSecret)?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Shortened signature for log output.
pub fn redact(signature: &str) -> String {
    let shown = signature.get(..16).unwrap_or(signature);
    format!("{shown}...")
}
