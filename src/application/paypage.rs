use crate::config::PayGateConfig;
use crate::domain::fields::FieldMap;
use crate::domain::format::MajorAmount;
use crate::domain::paygate::{SignatureMethod, sign_paypage_request};
use crate::error::{GatewayError, Result};
use serde::Serialize;

/// A PayPage redirect request signed over its key-sorted parameters.
#[derive(Debug, Clone, Serialize)]
pub struct SignedPayPage {
    pub endpoint: String,
    pub fields: FieldMap,
    pub signature: String,
    pub signature_method: SignatureMethod,
}

pub fn build_paypage_request(
    config: &PayGateConfig,
    order_id: &str,
    amount: MajorAmount,
    description: &str,
    timestamp_millis: i64,
) -> Result<SignedPayPage> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
        return Err(GatewayError::MissingRequiredField("order_id"));
    }

    let mut fields = FieldMap::new();
    fields.insert("PAYGATE_ID", config.paygate_id.as_str());
    fields.insert("REFERENCE", order_id);
    fields.insert("AMOUNT", amount.to_minor_units());
    fields.insert("CURRENCY", config.currency.as_str());
    fields.insert("RETURN_URL", config.return_url.as_str());
    fields.insert("NOTIFY_URL", config.notify_url.clone().unwrap_or_default());
    fields.insert("DESCRIPTION", description);
    fields.insert("TIMESTAMP", timestamp_millis.to_string());

    let signature = sign_paypage_request(
        &fields,
        config.encryption_key.expose(),
        config.signature_method,
    )?;

    Ok(SignedPayPage {
        endpoint: config.paypage_url.clone(),
        fields,
        signature,
        signature_method: config.signature_method,
    })
}
