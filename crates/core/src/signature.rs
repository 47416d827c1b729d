//! Request signing for signed uploads

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Parameters that travel with a signed request but are never part of the signed string
pub const UNSIGNED_FIELDS: &[&str] = &["file", "api_key", "resource_type", "cloud_name", "signature"];

/// Digest used to sign requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        }
    }

    fn hex_digest(&self, payload: &[u8]) -> String {
        match self {
            SignatureAlgorithm::Sha1 => format!("{:x}", Sha1::digest(payload)),
            SignatureAlgorithm::Sha256 => format!("{:x}", Sha256::digest(payload)),
        }
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            other => Err(Error::InvalidInput(format!(
                "unknown signature algorithm '{}' (expected sha1 or sha256)",
                other
            ))),
        }
    }
}

/// Build the canonical string that gets hashed: `a=1&b=2`, keys sorted,
/// empty values and transport-only fields left out.
pub fn string_to_sign(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(key, value)| !value.is_empty() && !UNSIGNED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign request parameters with the API secret.
///
/// Returns the lowercase hex digest of the canonical parameter string followed
/// by the secret.
pub fn sign_params(
    params: &BTreeMap<String, String>,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let payload = format!("{}{}", string_to_sign(params), api_secret);
    algorithm.hex_digest(payload.as_bytes())
}

/// Check the `signature` the service returns alongside an uploaded asset
pub fn verify_response_signature(
    public_id: &str,
    version: i64,
    signature: &str,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> bool {
    let payload = format!("public_id={}&version={}{}", public_id, version, api_secret);
    algorithm.hex_digest(payload.as_bytes()) == signature.to_lowercase()
}

/// Current UTC time in whole seconds, as sent in the `timestamp` field
pub fn unix_timestamp() -> Result<String> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::InvalidInput(format!("Time error: {}", e)))?
        .as_secs();
    Ok(secs.to_string())
}
