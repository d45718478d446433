use crate::domain::ports::{OrderStatusStore, OrderUpdate, WebhookFailure, WebhookFailureLog};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
}

/// The payment-related state of one stored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub reference: String,
    pub status: OrderStatus,
    pub transaction_status: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub transaction_amount: Option<Decimal>,
}

impl OrderRecord {
    pub fn pending(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            status: OrderStatus::Pending,
            transaction_status: None,
            paid_at: None,
            transaction_amount: None,
        }
    }
}

/// A thread-safe in-memory order store keyed by order reference.
///
/// Updates only touch orders that were inserted beforehand; unknown references
/// report no match, as a real invoice table would.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, OrderRecord>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: OrderRecord) {
        let mut orders = self.orders.write().await;
        orders.insert(order.reference.clone(), order);
    }

    pub async fn get(&self, reference: &str) -> Option<OrderRecord> {
        let orders = self.orders.read().await;
        orders.get(reference).cloned()
    }
}

#[async_trait]
impl OrderStatusStore for InMemoryOrderStore {
    async fn apply(&self, update: OrderUpdate) -> Result<bool> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(&update.reference) else {
            return Ok(false);
        };
        order.transaction_status = Some(update.transaction_status);
        if update.completed {
            order.status = OrderStatus::Completed;
            order.paid_at = update.paid_at;
        }
        if update.amount.is_some() {
            order.transaction_amount = update.amount;
        }
        Ok(true)
    }
}

/// A thread-safe in-memory webhook-failure log, kept in arrival order.
#[derive(Default, Clone)]
pub struct InMemoryFailureLog {
    failures: Arc<RwLock<Vec<WebhookFailure>>>,
}

impl InMemoryFailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<WebhookFailure> {
        self.failures.read().await.clone()
    }
}

#[async_trait]
impl WebhookFailureLog for InMemoryFailureLog {
    async fn record(&self, failure: WebhookFailure) -> Result<()> {
        let mut failures = self.failures.write().await;
        failures.push(failure);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fields::FieldMap;
    use crate::domain::ports::Provider;
    use rust_decimal_macros::dec;

    fn update(reference: &str, completed: bool) -> OrderUpdate {
        OrderUpdate {
            provider: Provider::Ozow,
            reference: reference.to_string(),
            transaction_status: if completed { "Complete" } else { "Pending" }.to_string(),
            completed,
            paid_at: completed.then(Utc::now),
            amount: Some(dec!(25.00)),
        }
    }

    #[tokio::test]
    async fn test_in_memory_order_store() {
        let store = InMemoryOrderStore::new();
        store.insert(OrderRecord::pending("INV-1")).await;

        assert!(store.apply(update("INV-1", false)).await.unwrap());
        let order = store.get("INV-1").await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.transaction_status.as_deref(), Some("Pending"));

        assert!(store.apply(update("INV-1", true)).await.unwrap());
        let order = store.get("INV-1").await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.paid_at.is_some());
        assert_eq!(order.transaction_amount, Some(dec!(25.00)));
    }

    #[tokio::test]
    async fn test_unknown_reference_does_not_match() {
        let store = InMemoryOrderStore::new();
        assert!(!store.apply(update("INV-404", true)).await.unwrap());
        assert!(store.get("INV-404").await.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_failure_log() {
        let log = InMemoryFailureLog::new();
        log.record(WebhookFailure {
            provider: Provider::PayGate,
            payload: FieldMap::new(),
            reason: "invoice_not_found".to_string(),
            retries: 0,
        })
        .await
        .unwrap();

        let all = log.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reason, "invoice_not_found");
    }
}
