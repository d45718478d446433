use crate::config::OzowConfig;
use crate::domain::fields::FieldMap;
use crate::domain::format::MajorAmount;
use crate::domain::ozow::{BANK_REFERENCE_MAX_CHARS, HASH_CHECK_FIELD, OZOW_ORDER, build_hash};
use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize, Serializer};

/// What a storefront sends to start an Ozow payment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: String,
    pub amount: Option<MajorAmountInput>,
    #[serde(default)]
    pub bank_reference: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub optional: [Option<String>; 5],
}

/// Amount as received from a caller, either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MajorAmountInput {
    Number(serde_json::Number),
    Text(String),
}

impl MajorAmountInput {
    fn parse(&self) -> Result<MajorAmount> {
        match self {
            MajorAmountInput::Number(n) => n.to_string().parse(),
            MajorAmountInput::Text(s) => s.parse(),
        }
    }
}

/// A signed form the browser auto-submits to the processor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedForm {
    pub action: String,
    pub method: &'static str,
    /// Field name/value pairs in canonical order, hash last. Serialized as a JSON object
    /// whose keys keep that order.
    #[serde(serialize_with = "serialize_ordered_fields")]
    pub fields: Vec<(String, String)>,
}

fn serialize_ordered_fields<S: Serializer>(
    fields: &[(String, String)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(fields.iter().map(|(name, value)| (name, value)))
}

impl SignedForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Builds signed Ozow redirect forms from checkout requests.
pub struct OzowCheckout<'a> {
    config: &'a OzowConfig,
}

impl<'a> OzowCheckout<'a> {
    pub fn new(config: &'a OzowConfig) -> Self {
        Self { config }
    }

    /// The field map that gets hashed and posted, without `HashCheck`.
    pub fn fields(&self, request: &CheckoutRequest) -> Result<FieldMap> {
        let order_id = request.order_id.trim();
        if order_id.is_empty() {
            return Err(GatewayError::MissingRequiredField("order_id"));
        }
        let amount = request
            .amount
            .as_ref()
            .ok_or(GatewayError::MissingRequiredField("amount"))?
            .parse()?;

        let bank_reference: String = request
            .bank_reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(order_id)
            .chars()
            .take(BANK_REFERENCE_MAX_CHARS)
            .collect();
        let customer = match request.customer.as_deref() {
            Some(c) => c.replace(['<', '>'], ""),
            None => "customer".to_string(),
        };

        let config = self.config;
        let mut fields = FieldMap::new();
        fields.insert("SiteCode", config.site_code.as_str());
        fields.insert("CountryCode", config.country_code.as_str());
        fields.insert("CurrencyCode", config.currency_code.as_str());
        fields.insert("Amount", amount.to_two_decimals());
        fields.insert("TransactionReference", order_id);
        fields.insert("BankReference", bank_reference);
        fields.insert("Customer", customer);
        fields.insert("CancelUrl", config.cancel_url.as_str());
        fields.insert("ErrorUrl", config.error_url.as_str());
        fields.insert("SuccessUrl", config.success_url.as_str());
        fields.insert("NotifyUrl", config.notify_url.as_str());
        fields.insert("IsTest", if config.is_test { "true" } else { "false" });

        // Optional1..5 only when non-blank; an empty key would still be posted.
        for (i, (requested, configured)) in request.optional.iter().zip(&config.optional).enumerate() {
            let value = [requested, configured]
                .into_iter()
                .flatten()
                .find(|v| !v.trim().is_empty());
            if let Some(value) = value {
                fields.insert(format!("Optional{}", i + 1), value.as_str());
            }
        }

        Ok(fields)
    }

    pub fn build(&self, request: &CheckoutRequest) -> Result<SignedForm> {
        let fields = self.fields(request)?;
        let private_key = self.config.private_key.expose();
        let hash = build_hash(&fields, private_key);

        tracing::info!(
            reference = %request.order_id.trim(),
            site_code = %self.config.site_code,
            key_hint = %self.config.private_key.hint(),
            "Built Ozow checkout form"
        );

        let mut ordered: Vec<(String, String)> = OZOW_ORDER
            .names()
            .iter()
            .filter_map(|name| fields.text(name).map(|value| (name.to_string(), value)))
            .collect();
        ordered.push((HASH_CHECK_FIELD.to_string(), hash));

        Ok(SignedForm {
            action: self.config.endpoint.clone(),
            method: "POST",
            fields: ordered,
        })
    }
}
