use super::fields::FieldMap;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Form-encodes `fields`, POSTs them to the initiate endpoint and parses the
/// `key=value` reply. Implementations own the request timeout.
#[async_trait]
pub trait InitiateTransport: Send + Sync {
    async fn post_form(&self, fields: &[(String, String)]) -> Result<FieldMap>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ozow,
    PayGate,
}

/// A status change for the order identified by `reference`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub provider: Provider,
    pub reference: String,
    pub transaction_status: String,
    pub completed: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookFailure {
    pub provider: Provider,
    pub payload: FieldMap,
    pub reason: String,
    pub retries: u32,
}

#[async_trait]
pub trait OrderStatusStore: Send + Sync {
    /// Applies `update`; `Ok(false)` when no order has that reference.
    async fn apply(&self, update: OrderUpdate) -> Result<bool>;
}

#[async_trait]
pub trait WebhookFailureLog: Send + Sync {
    async fn record(&self, failure: WebhookFailure) -> Result<()>;
}

pub type InitiateTransportBox = Box<dyn InitiateTransport>;
pub type OrderStatusStoreBox = Box<dyn OrderStatusStore>;
pub type WebhookFailureLogBox = Box<dyn WebhookFailureLog>;
