//! Processor notify handling.
//!
//! Verification outcomes are forwarded to the order store and failures to the
//! webhook-failure log. The processor is always acknowledged with `200 OK`, so a
//! rejected or unprocessable notify never provokes redelivery.

use crate::config::SecretKey;
use crate::domain::fields::FieldMap;
use crate::domain::ozow::{callback_hash, verify_hash};
use crate::domain::ports::{
    OrderStatusStoreBox, OrderUpdate, Provider, WebhookFailure, WebhookFailureLogBox,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

const MAX_REASON_DETAIL: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verification {
    fn ok() -> Self {
        Self {
            verified: true,
            reason: None,
        }
    }

    fn failed(reason: &str) -> Self {
        Self {
            verified: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Checks an Ozow callback against its `Hash` (or `HashCheck`) field.
pub fn verify_ozow_notify(payload: &FieldMap, private_key: &str) -> Verification {
    match callback_hash(payload) {
        None => Verification::failed("missing_hash"),
        Some(hash) if verify_hash(payload, &hash, private_key) => Verification::ok(),
        Some(_) => Verification::failed("hash_mismatch"),
    }
}

/// The HTTP response a notify endpoint returns to the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    pub status: u16,
    pub body: &'static str,
}

impl Acknowledgement {
    pub const OK: Self = Self {
        status: 200,
        body: "OK",
    };
}

pub struct NotifyDispatcher {
    ozow_private_key: SecretKey,
    orders: OrderStatusStoreBox,
    failures: WebhookFailureLogBox,
}

impl NotifyDispatcher {
    pub fn new(
        ozow_private_key: SecretKey,
        orders: OrderStatusStoreBox,
        failures: WebhookFailureLogBox,
    ) -> Self {
        Self {
            ozow_private_key,
            orders,
            failures,
        }
    }

    pub async fn handle_ozow(&self, payload: FieldMap) -> Acknowledgement {
        let verification = verify_ozow_notify(&payload, self.ozow_private_key.expose());
        if let Some(reason) = verification.reason {
            tracing::warn!(%reason, "Ozow notify failed verification");
            self.record_failure(Provider::Ozow, payload, reason).await;
            return Acknowledgement::OK;
        }

        let Some(reference) = non_empty(&payload, &["TransactionReference", "transactionReference"])
        else {
            tracing::warn!("Verified Ozow notify carries no TransactionReference");
            self.record_failure(Provider::Ozow, payload, "missing_reference".to_string())
                .await;
            return Acknowledgement::OK;
        };
        let status = payload.first_text(&["Status", "status"]).unwrap_or_default();
        let completed = status.to_lowercase().contains("success");
        tracing::info!(%reference, %status, "Ozow notify verified");

        let update = OrderUpdate {
            provider: Provider::Ozow,
            reference,
            transaction_status: status,
            completed,
            paid_at: completed.then(Utc::now),
            amount: amount_of(&payload, &["Amount", "amount"]),
        };
        self.forward(update, payload).await;
        Acknowledgement::OK
    }

    pub async fn handle_paygate(&self, payload: FieldMap) -> Acknowledgement {
        let status = payload.text("TRANSACTION_STATUS").unwrap_or_default();
        let reference = non_empty(&payload, &["REFERENCE", "ORDER_ID", "order_id", "ORDER_NUMBER"]);
        tracing::info!(%status, reference = ?reference, "PayGate notify received");

        if status != "1" {
            return Acknowledgement::OK;
        }
        let Some(reference) = reference else {
            self.record_failure(Provider::PayGate, payload, "missing_reference".to_string())
                .await;
            return Acknowledgement::OK;
        };

        let update = OrderUpdate {
            provider: Provider::PayGate,
            reference,
            transaction_status: status,
            completed: true,
            paid_at: Some(Utc::now()),
            amount: amount_of(&payload, &["AMOUNT", "amount"]),
        };
        self.forward(update, payload).await;
        Acknowledgement::OK
    }

    async fn forward(&self, update: OrderUpdate, payload: FieldMap) {
        let provider = update.provider;
        let reference = update.reference.clone();
        match self.orders.apply(update).await {
            Ok(true) => tracing::info!(%reference, "Order updated from notify"),
            Ok(false) => {
                tracing::warn!(%reference, "Notify matched no order");
                self.record_failure(provider, payload, "invoice_not_found".to_string())
                    .await;
            }
            Err(e) => {
                tracing::warn!(%reference, error = %e, "Order update from notify failed");
                let detail: String = e.to_string().chars().take(MAX_REASON_DETAIL).collect();
                self.record_failure(provider, payload, format!("update_error:{detail}"))
                    .await;
            }
        }
    }

    async fn record_failure(&self, provider: Provider, payload: FieldMap, reason: String) {
        let failure = WebhookFailure {
            provider,
            payload,
            reason,
            retries: 0,
        };
        if let Err(e) = self.failures.record(failure).await {
            tracing::error!(error = %e, "Failed to record webhook failure");
        }
    }
}

fn non_empty(payload: &FieldMap, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| payload.text(name))
        .find(|value| !value.trim().is_empty())
}

fn amount_of(payload: &FieldMap, names: &[&str]) -> Option<Decimal> {
    non_empty(payload, names).and_then(|raw| Decimal::from_str(raw.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ozow::build_hash;

    fn signed_payload(key: &str) -> FieldMap {
        let mut payload: FieldMap = [
            ("SiteCode", "TST-001"),
            ("TransactionReference", "INV-5"),
            ("Amount", "25.00"),
            ("Status", "Complete"),
        ]
        .into_iter()
        .collect();
        let hash = build_hash(&payload, key);
        payload.insert("Hash", hash);
        payload
    }

    #[test]
    fn test_verify_ozow_notify() {
        assert_eq!(verify_ozow_notify(&signed_payload("k"), "k"), Verification::ok());
        assert_eq!(
            verify_ozow_notify(&signed_payload("k"), "other"),
            Verification::failed("hash_mismatch")
        );

        let mut unsigned = signed_payload("k");
        unsigned.remove("Hash");
        assert_eq!(verify_ozow_notify(&unsigned, "k"), Verification::failed("missing_hash"));
    }

    #[test]
    fn test_verify_tolerates_hash_check_name() {
        let mut payload = signed_payload("k");
        let hash = payload.remove("Hash").unwrap();
        payload.insert("HashCheck", hash);
        assert!(verify_ozow_notify(&payload, "k").verified);
    }

    #[test]
    fn test_tampered_field_fails() {
        let mut payload = signed_payload("k");
        payload.insert("Amount", "2500.00");
        assert!(!verify_ozow_notify(&payload, "k").verified);
    }

    #[test]
    fn test_amount_of() {
        let payload: FieldMap = [("AMOUNT", " 3299 "), ("bad", "x")].into_iter().collect();
        assert_eq!(amount_of(&payload, &["AMOUNT"]), Some(Decimal::from(3299)));
        assert_eq!(amount_of(&payload, &["bad"]), None);
        assert_eq!(amount_of(&payload, &["missing"]), None);
    }
}
