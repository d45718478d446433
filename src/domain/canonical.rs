//! Canonical field ordering and the signing context built on it.
//!
//! Both processors sign a separator-free concatenation of field values in a fixed
//! order with the secret appended last. They differ in how a field missing from the
//! map is treated, which is captured by [`InclusionPolicy`].

use super::digest::DigestAlgorithm;
use super::fields::FieldMap;

/// A fixed sequence of field names. Orders are compile-time constants, never built from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalOrder {
    names: &'static [&'static str],
}

impl CanonicalOrder {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionPolicy {
    /// Keys missing from the map contribute nothing.
    SkipAbsent,
    /// Every name contributes, missing keys as an empty segment.
    IncludeAll,
}

/// Concatenates the values of `fields` in `order` and appends `secret`.
pub fn build_canonical_string(
    order: CanonicalOrder,
    fields: &FieldMap,
    policy: InclusionPolicy,
    secret: &str,
) -> String {
    let mut out = String::new();
    for name in order.names() {
        let segment = match policy {
            InclusionPolicy::SkipAbsent => match fields.text(name) {
                Some(value) => value,
                None => continue,
            },
            InclusionPolicy::IncludeAll => fields.text(name).unwrap_or_default(),
        };
        out.push_str(&segment);
    }
    out.push_str(secret);
    out
}

/// Everything needed to sign one field set. Built fresh per request or reply.
#[derive(Debug, Clone, Copy)]
pub struct SigningContext<'a> {
    pub fields: &'a FieldMap,
    pub order: CanonicalOrder,
    pub policy: InclusionPolicy,
    pub secret: &'a str,
    pub algorithm: DigestAlgorithm,
    /// Lowercase the whole concatenation (values and secret) before hashing.
    pub case_fold: bool,
}

impl SigningContext<'_> {
    pub fn canonical_string(&self) -> String {
        let src = build_canonical_string(self.order, self.fields, self.policy, self.secret);
        if self.case_fold {
            src.to_lowercase()
        } else {
            src
        }
    }

    pub fn sign(&self) -> String {
        self.algorithm.hex(&self.canonical_string())
    }
}
