//! PayGate PayWeb3 checksums.
//!
//! Initiate requests and their replies are both authenticated with MD5 over a
//! separator-free concatenation plus the encryption key, but over different field
//! orders. Every name in an order is included, missing values as empty segments.

use super::canonical::{CanonicalOrder, InclusionPolicy, SigningContext};
use super::digest::{DigestAlgorithm, hex_eq_ignore_case, hmac_sha256_hex, md5_hex};
use super::fields::FieldMap;
use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const INITIATE_ORDER: CanonicalOrder = CanonicalOrder::new(&[
    "PAYGATE_ID",
    "REFERENCE",
    "AMOUNT",
    "CURRENCY",
    "RETURN_URL",
    "TRANSACTION_DATE",
    "LOCALE",
    "COUNTRY",
    "EMAIL",
    "NOTIFY_URL",
]);

/// [`INITIATE_ORDER`] without `RETURN_URL`, for remotes that leave it out of the checksum.
pub const INITIATE_ORDER_WITHOUT_RETURN_URL: CanonicalOrder = CanonicalOrder::new(&[
    "PAYGATE_ID",
    "REFERENCE",
    "AMOUNT",
    "CURRENCY",
    "TRANSACTION_DATE",
    "LOCALE",
    "COUNTRY",
    "EMAIL",
    "NOTIFY_URL",
]);

pub const REPLY_ORDER: CanonicalOrder =
    CanonicalOrder::new(&["PAYGATE_ID", "PAY_REQUEST_ID", "REFERENCE"]);

pub const CHECKSUM_FIELD: &str = "CHECKSUM";
pub const ERROR_FIELD: &str = "ERROR";
pub const PAY_REQUEST_ID_FIELD: &str = "PAY_REQUEST_ID";

fn md5_context<'a>(fields: &'a FieldMap, order: CanonicalOrder, key: &'a str) -> SigningContext<'a> {
    SigningContext {
        fields,
        order,
        policy: InclusionPolicy::IncludeAll,
        secret: key,
        algorithm: DigestAlgorithm::Md5,
        case_fold: false,
    }
}

pub fn build_initiate_checksum(fields: &FieldMap, key: &str) -> String {
    build_initiate_checksum_with_order(fields, INITIATE_ORDER, key)
}

pub fn build_initiate_checksum_with_order(
    fields: &FieldMap,
    order: CanonicalOrder,
    key: &str,
) -> String {
    md5_context(fields, order, key).sign()
}

pub fn build_initiate_reply_checksum(reply: &FieldMap, key: &str) -> String {
    md5_context(reply, REPLY_ORDER, key).sign()
}

/// Outcome of checking one initiate reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyVerdict {
    Verified { pay_request_id: String },
    Rejected { reason: String },
}

impl ReplyVerdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, ReplyVerdict::Verified { .. })
    }
}

/// Checks an initiate reply: an explicit `ERROR` rejects it outright, otherwise its
/// `CHECKSUM` must match the reply checksum and its `REFERENCE` must be ours.
pub fn verify_initiate_reply(reply: &FieldMap, expected_reference: &str, key: &str) -> ReplyVerdict {
    if let Some(error) = reply.text(ERROR_FIELD).filter(|e| !e.is_empty()) {
        return ReplyVerdict::Rejected { reason: error };
    }

    let received = reply.text(CHECKSUM_FIELD).unwrap_or_default();
    let computed = build_initiate_reply_checksum(reply, key);
    if !hex_eq_ignore_case(&computed, &received) {
        return ReplyVerdict::Rejected {
            reason: "reply checksum mismatch".to_string(),
        };
    }

    let reference = reply.text("REFERENCE").unwrap_or_default();
    if reference != expected_reference {
        return ReplyVerdict::Rejected {
            reason: format!("reply reference '{reference}' does not match '{expected_reference}'"),
        };
    }

    match reply.text(PAY_REQUEST_ID_FIELD).filter(|id| !id.is_empty()) {
        Some(pay_request_id) => ReplyVerdict::Verified { pay_request_id },
        None => ReplyVerdict::Rejected {
            reason: "reply carries no PAY_REQUEST_ID".to_string(),
        },
    }
}

/// Signature scheme for the legacy PayPage redirect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureMethod {
    #[default]
    HmacSha256,
    Md5,
}

impl FromStr for SignatureMethod {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hmac-sha256" | "hmac_sha256" => Ok(SignatureMethod::HmacSha256),
            "md5" => Ok(SignatureMethod::Md5),
            other => Err(GatewayError::DigestConfig(format!(
                "unsupported signature method '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureMethod::HmacSha256 => write!(f, "HMAC-SHA256"),
            SignatureMethod::Md5 => write!(f, "MD5"),
        }
    }
}

/// `k=v` pairs sorted by key and joined with `&`, unescaped.
pub fn paypage_canonical(params: &FieldMap) -> String {
    let mut pairs: Vec<(&String, String)> = params
        .iter()
        .map(|(name, value)| (name, value.to_string()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn sign_paypage_request(params: &FieldMap, key: &str, method: SignatureMethod) -> Result<String> {
    let canonical = paypage_canonical(params);
    match method {
        SignatureMethod::HmacSha256 => hmac_sha256_hex(key.as_bytes(), &canonical),
        SignatureMethod::Md5 => Ok(md5_hex(&format!("{canonical}{key}"))),
    }
}
