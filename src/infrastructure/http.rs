//! reqwest-backed clients for the processors' HTTP endpoints.

use crate::config::{OzowConfig, PayGateConfig};
use crate::domain::fields::FieldMap;
use crate::domain::ports::InitiateTransport;
use crate::error::{GatewayError, Result};
use crate::interfaces::form::parse_form_body;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 2000;

/// POSTs initiate requests as `application/x-www-form-urlencoded`.
pub struct HttpInitiateTransport {
    client: Client,
    endpoint: String,
}

impl HttpInitiateTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &PayGateConfig) -> Result<Self> {
        Self::new(config.initiate_url.clone(), config.timeout())
    }
}

#[async_trait]
impl InitiateTransport for HttpInitiateTransport {
    async fn post_form(&self, fields: &[(String, String)]) -> Result<FieldMap> {
        let response = self.client.post(&self.endpoint).form(fields).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::RemoteStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }
        tracing::debug!(endpoint = %self.endpoint, %status, "Initiate reply received");
        Ok(parse_form_body(&body))
    }
}

/// Looks up Ozow transactions through the merchant API.
pub struct OzowStatusClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl OzowStatusClient {
    pub fn new(config: &OzowConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.expose().to_string(),
        })
    }

    pub async fn transaction_by_reference(&self, reference: &str) -> Result<serde_json::Value> {
        if reference.trim().is_empty() {
            return Err(GatewayError::MissingRequiredField("reference"));
        }
        let url = format!("{}/Transaction/GetTransactionByReference", self.api_url);
        let response = self
            .client
            .get(&url)
            .query(&[("TransactionReference", reference)])
            .header("ApiKey", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(GatewayError::RemoteStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }
        Ok(response.json().await?)
    }
}
