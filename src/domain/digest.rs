//! Hex digest primitives shared by both gateway adapters.
//!
//! Every function here is pure and returns lowercase hexadecimal.

use crate::error::{GatewayError, Result};
use hmac::{Hmac, Mac};
use md5::Md5;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Unkeyed digest used when signing a canonical string that already carries the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha512,
    Md5,
}

impl DigestAlgorithm {
    pub fn hex(self, input: &str) -> String {
        match self {
            DigestAlgorithm::Sha512 => sha512_hex(input),
            DigestAlgorithm::Md5 => md5_hex(input),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = GatewayError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sha512" | "sha-512" => Ok(DigestAlgorithm::Sha512),
            "md5" => Ok(DigestAlgorithm::Md5),
            other => Err(GatewayError::DigestConfig(format!(
                "unsupported digest algorithm '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::Sha512 => write!(f, "sha512"),
            DigestAlgorithm::Md5 => write!(f, "md5"),
        }
    }
}

pub fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

pub fn hmac_sha256_hex(key: &[u8], input: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| GatewayError::DigestConfig(format!("invalid HMAC key: {e}")))?;
    mac.update(input.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Dispatches on an algorithm name: `sha512`, `md5` or `hmac-sha256`.
///
/// Unknown names, and `hmac-sha256` without a key, fail with
/// [`GatewayError::DigestConfig`].
pub fn digest_hex(algorithm: &str, key: Option<&str>, input: &str) -> Result<String> {
    match algorithm.trim().to_ascii_lowercase().as_str() {
        "hmac-sha256" | "hmac_sha256" => {
            let key = key.ok_or_else(|| {
                GatewayError::DigestConfig("hmac-sha256 requires a key".to_string())
            })?;
            hmac_sha256_hex(key.as_bytes(), input)
        }
        other => Ok(other.parse::<DigestAlgorithm>()?.hex(input)),
    }
}

/// Compares two hex digests ignoring ASCII case, in time independent of where they differ.
pub fn hex_eq_ignore_case(computed: &str, received: &str) -> bool {
    let computed = computed.to_ascii_lowercase();
    let received = received.trim().to_ascii_lowercase();
    computed.as_bytes().ct_eq(received.as_bytes()).into()
}
