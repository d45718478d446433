//! Initiate payload variants.
//!
//! PayGate's accepted field set for the initiate request is not pinned down, so an
//! initiate may be attempted with a short, ordered list of payload variants. Each
//! variant is a small, explicit deviation from the base payload.

use super::canonical::CanonicalOrder;
use super::fields::FieldMap;
use super::format::{MajorAmount, TRANSACTION_DATE_FORMAT, TRANSACTION_DATE_MINUTES_FORMAT};
use super::paygate::{INITIATE_ORDER, INITIATE_ORDER_WITHOUT_RETURN_URL};
use crate::error::{GatewayError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The merchant-side inputs of one initiate request, before any variant is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct InitiatePayload {
    pub paygate_id: String,
    pub reference: String,
    pub amount: MajorAmount,
    pub currency: String,
    pub return_url: String,
    pub transaction_date: NaiveDateTime,
    pub locale: String,
    pub country: String,
    pub email: String,
    pub notify_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    #[default]
    Seconds,
    Minutes,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiateVariant {
    pub name: String,
    #[serde(default = "default_true")]
    pub include_notify_url: bool,
    /// Replaces the configured locale when set.
    #[serde(default)]
    pub locale: Option<String>,
    /// Replaces the configured country when set.
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub date_precision: DatePrecision,
    #[serde(default = "default_true")]
    pub checksum_includes_return_url: bool,
}

impl InitiateVariant {
    pub fn canonical(name: &str) -> Self {
        Self {
            name: name.to_string(),
            include_notify_url: true,
            locale: None,
            country: None,
            date_precision: DatePrecision::Seconds,
            checksum_includes_return_url: true,
        }
    }

    pub fn checksum_order(&self) -> CanonicalOrder {
        if self.checksum_includes_return_url {
            INITIATE_ORDER
        } else {
            INITIATE_ORDER_WITHOUT_RETURN_URL
        }
    }

    /// Fields to POST (checksum excluded) for `payload` under this variant.
    pub fn apply(&self, payload: &InitiatePayload) -> FieldMap {
        let date_format = match self.date_precision {
            DatePrecision::Seconds => TRANSACTION_DATE_FORMAT,
            DatePrecision::Minutes => TRANSACTION_DATE_MINUTES_FORMAT,
        };

        let mut fields = FieldMap::new();
        fields.insert("PAYGATE_ID", payload.paygate_id.as_str());
        fields.insert("REFERENCE", payload.reference.as_str());
        fields.insert("AMOUNT", payload.amount.to_minor_units());
        fields.insert("CURRENCY", payload.currency.as_str());
        fields.insert("RETURN_URL", payload.return_url.as_str());
        fields.insert(
            "TRANSACTION_DATE",
            payload.transaction_date.format(date_format).to_string(),
        );
        fields.insert("LOCALE", self.locale.as_deref().unwrap_or(&payload.locale));
        fields.insert("COUNTRY", self.country.as_deref().unwrap_or(&payload.country));
        fields.insert("EMAIL", payload.email.as_str());
        if self.include_notify_url
            && let Some(notify_url) = payload.notify_url.as_deref().filter(|u| !u.is_empty())
        {
            fields.insert("NOTIFY_URL", notify_url);
        }
        fields
    }
}

/// The built-in variants, in the order they are attempted.
pub fn builtin_variants() -> Vec<InitiateVariant> {
    vec![
        InitiateVariant::canonical("canonical"),
        InitiateVariant {
            include_notify_url: false,
            ..InitiateVariant::canonical("without-notify-url")
        },
        InitiateVariant {
            locale: Some("en".to_string()),
            country: Some("ZA".to_string()),
            ..InitiateVariant::canonical("short-locale-country")
        },
        InitiateVariant {
            date_precision: DatePrecision::Minutes,
            ..InitiateVariant::canonical("minute-precision-date")
        },
        InitiateVariant {
            checksum_includes_return_url: false,
            ..InitiateVariant::canonical("checksum-without-return-url")
        },
    ]
}

/// Picks built-in variants by name, in the order given.
pub fn select_builtin(names: &[&str]) -> Result<Vec<InitiateVariant>> {
    let builtins = builtin_variants();
    names
        .iter()
        .map(|name| {
            builtins
                .iter()
                .find(|v| v.name == *name)
                .cloned()
                .ok_or_else(|| GatewayError::Config(format!("unknown initiate variant '{name}'")))
        })
        .collect()
}

/// What happened when one variant was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptDiagnostic {
    pub variant: String,
    pub checksum: String,
    pub outcome: String,
}
