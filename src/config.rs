//! Explicit gateway configuration.
//!
//! Process environment is read once, at the edge, by [`GatewayConfig::from_env`].
//! Everything downstream receives an immutable [`GatewayConfig`].

use crate::domain::callback_url::prepare_callback_url;
use crate::domain::paygate::SignatureMethod;
use crate::domain::variant::{InitiateVariant, builtin_variants, select_builtin};
use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::time::Duration;

/// A secret that never appears in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First and last four characters, for log lines that must not carry the secret.
    pub fn hint(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.is_empty() {
            "(none)".to_string()
        } else if chars.len() <= 8 {
            "***".to_string()
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        }
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({})", self.hint())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OzowConfig {
    pub site_code: String,
    pub private_key: SecretKey,
    #[serde(default)]
    pub api_key: SecretKey,
    #[serde(default = "OzowConfig::default_country_code")]
    pub country_code: String,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    #[serde(default)]
    pub is_test: bool,
    #[serde(default)]
    pub cancel_url: String,
    #[serde(default)]
    pub error_url: String,
    #[serde(default)]
    pub success_url: String,
    #[serde(default)]
    pub notify_url: String,
    /// Defaults for `Optional1`..`Optional5` when a checkout request carries none.
    #[serde(default)]
    pub optional: [Option<String>; 5],
    #[serde(default = "OzowConfig::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "OzowConfig::default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl OzowConfig {
    fn default_country_code() -> String {
        "ZA".to_string()
    }

    fn default_endpoint() -> String {
        "https://pay.ozow.com".to_string()
    }

    fn default_api_url() -> String {
        "https://api.ozow.com".to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cleans the four callback URLs, logging any value that had to change.
    pub fn normalized(mut self) -> Self {
        for (name, url) in [
            ("cancel_url", &mut self.cancel_url),
            ("error_url", &mut self.error_url),
            ("success_url", &mut self.success_url),
            ("notify_url", &mut self.notify_url),
        ] {
            let (cleaned, changed) = prepare_callback_url(url);
            if changed {
                tracing::warn!(
                    field = name,
                    raw = %url,
                    normalized = %cleaned,
                    "Ozow callback URL was normalized; configure full https:// URLs"
                );
                *url = cleaned;
            }
        }
        self
    }
}

fn default_currency() -> String {
    "ZAR".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayGateConfig {
    pub paygate_id: String,
    pub encryption_key: SecretKey,
    #[serde(default)]
    pub return_url: String,
    #[serde(default)]
    pub notify_url: Option<String>,
    #[serde(default = "PayGateConfig::default_initiate_url")]
    pub initiate_url: String,
    #[serde(default = "PayGateConfig::default_paypage_url")]
    pub paypage_url: String,
    #[serde(default = "PayGateConfig::default_locale")]
    pub locale: String,
    #[serde(default = "PayGateConfig::default_country")]
    pub country: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub signature_method: SignatureMethod,
    #[serde(default = "builtin_variants")]
    pub variants: Vec<InitiateVariant>,
}

impl PayGateConfig {
    fn default_initiate_url() -> String {
        "https://secure.paygate.co.za/payweb3/initiate.trans".to_string()
    }

    fn default_paypage_url() -> String {
        "https://secure.paygate.co.za/paypage".to_string()
    }

    fn default_locale() -> String {
        "en-za".to_string()
    }

    fn default_country() -> String {
        "ZAF".to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub ozow: OzowConfig,
    pub paygate: PayGateConfig,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let mut config: GatewayConfig = serde_json::from_reader(reader)?;
        config.ozow = config.ozow.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from any variable lookup, applying the documented defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let ozow = OzowConfig {
            site_code: or("OZOW_SITE_CODE", ""),
            private_key: SecretKey::new(or("OZOW_PRIVATE_KEY", "")),
            api_key: SecretKey::new(or("OZOW_API_KEY", "")),
            country_code: or("OZOW_COUNTRY_CODE", "ZA"),
            currency_code: or("OZOW_CURRENCY_CODE", "ZAR"),
            is_test: var("OZOW_IS_TEST").is_some_and(|v| v.eq_ignore_ascii_case("true")),
            cancel_url: or("OZOW_CANCEL_URL", ""),
            error_url: or("OZOW_ERROR_URL", ""),
            success_url: or("OZOW_SUCCESS_URL", ""),
            notify_url: or("OZOW_NOTIFY_URL", ""),
            optional: std::array::from_fn(|i| var(&format!("OZOW_OPTIONAL{}", i + 1))),
            endpoint: or("OZOW_ENDPOINT", "https://pay.ozow.com"),
            api_url: or("OZOW_API_URL", "https://api.ozow.com"),
            timeout_secs: timeout_secs(var("OZOW_TIMEOUT_SECS"), "OZOW_TIMEOUT_SECS")?,
        }
        .normalized();

        let paygate_timeout_secs = timeout_secs(var("PAYGATE_TIMEOUT_SECS"), "PAYGATE_TIMEOUT_SECS")?;
        let signature_method = match var("PAYGATE_SIGNATURE_TYPE") {
            Some(raw) => raw.parse()?,
            None => SignatureMethod::default(),
        };
        let variants = match var("PAYGATE_VARIANTS") {
            Some(raw) => {
                let names: Vec<&str> = raw.split(',').map(str::trim).filter(|n| !n.is_empty()).collect();
                select_builtin(&names)?
            }
            None => builtin_variants(),
        };

        let paygate = PayGateConfig {
            paygate_id: or("PAYGATE_ID", ""),
            encryption_key: SecretKey::new(or("PAYGATE_ENCRYPTION_KEY", "")),
            return_url: or("PAYGATE_RETURN_URL", ""),
            notify_url: var("PAYGATE_NOTIFY_URL"),
            initiate_url: or("PAYGATE_INITIATE_URL", &PayGateConfig::default_initiate_url()),
            paypage_url: or("PAYGATE_PAYPAGE_URL", &PayGateConfig::default_paypage_url()),
            locale: or("PAYGATE_LOCALE", "en-za"),
            country: or("PAYGATE_COUNTRY", "ZAF"),
            currency: or("PAYGATE_CURRENCY", "ZAR"),
            timeout_secs: paygate_timeout_secs,
            signature_method,
            variants,
        };

        let config = Self { ozow, paygate };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.paygate.variants.is_empty() {
            return Err(GatewayError::Config(
                "at least one initiate variant is required".to_string(),
            ));
        }
        if self.paygate.timeout_secs == 0 {
            return Err(GatewayError::Config(
                "PayGate timeout must be at least one second".to_string(),
            ));
        }
        if self.ozow.timeout_secs == 0 {
            return Err(GatewayError::Config(
                "Ozow timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

fn timeout_secs(raw: Option<String>, name: &str) -> Result<u64> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| GatewayError::Config(format!("{name} must be an integer, got '{raw}'"))),
        None => Ok(default_timeout_secs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.ozow.country_code, "ZA");
        assert_eq!(config.ozow.currency_code, "ZAR");
        assert!(!config.ozow.is_test);
        assert_eq!(config.paygate.locale, "en-za");
        assert_eq!(config.paygate.country, "ZAF");
        assert_eq!(config.paygate.timeout(), Duration::from_secs(30));
        assert_eq!(config.ozow.timeout(), Duration::from_secs(30));
        assert_eq!(config.paygate.signature_method, SignatureMethod::HmacSha256);
        assert_eq!(config.paygate.variants, builtin_variants());
        assert_eq!(config.paygate.notify_url, None);
    }

    #[test]
    fn test_env_values_and_url_normalization() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("OZOW_SITE_CODE", "TST-001"),
            ("OZOW_IS_TEST", "TRUE"),
            ("OZOW_NOTIFY_URL", "://shop.example.com/ozow/notify"),
            ("OZOW_SUCCESS_URL", "https://https://shop.example.com/ok"),
            ("OZOW_OPTIONAL2", "campaign"),
            ("PAYGATE_VARIANTS", "minute-precision-date, canonical"),
            ("PAYGATE_SIGNATURE_TYPE", "md5"),
        ]))
        .unwrap();

        assert_eq!(config.ozow.site_code, "TST-001");
        assert!(config.ozow.is_test);
        assert_eq!(config.ozow.notify_url, "https://shop.example.com/ozow/notify");
        assert_eq!(config.ozow.success_url, "https://shop.example.com/ok");
        assert_eq!(config.ozow.optional[1].as_deref(), Some("campaign"));
        assert_eq!(config.ozow.optional[0], None);
        assert_eq!(config.paygate.variants.len(), 2);
        assert_eq!(config.paygate.variants[0].name, "minute-precision-date");
        assert_eq!(config.paygate.signature_method, SignatureMethod::Md5);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[("PAYGATE_TIMEOUT_SECS", "soon")])),
            Err(GatewayError::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[("OZOW_TIMEOUT_SECS", "0")])),
            Err(GatewayError::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[("PAYGATE_VARIANTS", "bogus")])),
            Err(GatewayError::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[("PAYGATE_SIGNATURE_TYPE", "sha1")])),
            Err(GatewayError::DigestConfig(_))
        ));
    }

    #[test]
    fn test_json_config() {
        let json = r#"{
            "ozow": {"site_code": "S1", "private_key": "pk", "cancel_url": "shop.example.com/c"},
            "paygate": {"paygate_id": "10011072130", "encryption_key": "secret",
                        "variants": [{"name": "only", "include_notify_url": false}]}
        }"#;
        let config = GatewayConfig::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(config.ozow.cancel_url, "https://shop.example.com/c");
        assert_eq!(config.ozow.endpoint, "https://pay.ozow.com");
        assert_eq!(config.paygate.variants.len(), 1);
        assert!(!config.paygate.variants[0].include_notify_url);
    }

    #[test]
    fn test_secret_key_is_redacted() {
        let key = SecretKey::new("abcd1234efgh5678");
        assert_eq!(key.hint(), "abcd...5678");
        assert!(!format!("{key:?}").contains("1234efgh"));
        assert_eq!(SecretKey::new("").hint(), "(none)");
        assert_eq!(SecretKey::new("short").hint(), "***");
    }
}
