//! Ozow hash-redirect signing.
//!
//! The request hash is SHA-512 over the present fields in [`OZOW_ORDER`] followed by
//! the private key, with the whole string lowercased before hashing.

use super::canonical::{CanonicalOrder, InclusionPolicy, SigningContext};
use super::digest::{DigestAlgorithm, hex_eq_ignore_case};
use super::fields::FieldMap;

pub const OZOW_ORDER: CanonicalOrder = CanonicalOrder::new(&[
    "SiteCode",
    "CountryCode",
    "CurrencyCode",
    "Amount",
    "TransactionReference",
    "BankReference",
    "Optional1",
    "Optional2",
    "Optional3",
    "Optional4",
    "Optional5",
    "Customer",
    "CancelUrl",
    "ErrorUrl",
    "SuccessUrl",
    "NotifyUrl",
    "IsTest",
]);

pub const HASH_CHECK_FIELD: &str = "HashCheck";

/// Field names an inbound callback may carry its hash under, in lookup order.
pub const CALLBACK_HASH_FIELDS: [&str; 2] = ["Hash", "HashCheck"];

pub const BANK_REFERENCE_MAX_CHARS: usize = 20;

fn signing_context<'a>(fields: &'a FieldMap, private_key: &'a str) -> SigningContext<'a> {
    SigningContext {
        fields,
        order: OZOW_ORDER,
        policy: InclusionPolicy::SkipAbsent,
        secret: private_key,
        algorithm: DigestAlgorithm::Sha512,
        case_fold: true,
    }
}

/// The lowercased string that [`build_hash`] digests. Contains the private key.
pub fn hash_source(fields: &FieldMap, private_key: &str) -> String {
    signing_context(fields, private_key).canonical_string()
}

pub fn build_hash(fields: &FieldMap, private_key: &str) -> String {
    signing_context(fields, private_key).sign()
}

pub fn verify_hash(received_fields: &FieldMap, received_hash: &str, private_key: &str) -> bool {
    let computed = build_hash(received_fields, private_key);
    hex_eq_ignore_case(&computed, received_hash)
}

/// Hash carried by a callback payload under either accepted field name.
pub fn callback_hash(payload: &FieldMap) -> Option<String> {
    CALLBACK_HASH_FIELDS
        .iter()
        .filter_map(|name| payload.text(name))
        .find(|hash| !hash.is_empty())
}
