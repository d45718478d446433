use crate::config::PayGateConfig;
use crate::domain::fields::FieldMap;
use crate::domain::format::MajorAmount;
use crate::domain::paygate::{
    CHECKSUM_FIELD, INITIATE_ORDER, ReplyVerdict, build_initiate_checksum_with_order,
    verify_initiate_reply,
};
use crate::domain::ports::InitiateTransportBox;
use crate::domain::variant::{AttemptDiagnostic, InitiatePayload, InitiateVariant};
use crate::error::{GatewayError, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitiateState {
    Building,
    Submitted,
    Verified,
    Rejected,
}

/// One initiate request under one variant, tracked through its states.
#[derive(Debug, Clone)]
pub struct InitiateRequest {
    variant: String,
    fields: FieldMap,
    checksum: String,
    state: InitiateState,
    verdict: Option<ReplyVerdict>,
}

impl InitiateRequest {
    pub fn new(payload: &InitiatePayload, variant: &InitiateVariant, key: &str) -> Self {
        let fields = variant.apply(payload);
        let checksum = build_initiate_checksum_with_order(&fields, variant.checksum_order(), key);
        Self {
            variant: variant.name.clone(),
            fields,
            checksum,
            state: InitiateState::Building,
            verdict: None,
        }
    }

    pub fn state(&self) -> InitiateState {
        self.state
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Posted pairs: present fields in initiate order, then `CHECKSUM`.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut form: Vec<(String, String)> = INITIATE_ORDER
            .names()
            .iter()
            .filter_map(|name| self.fields.text(name).map(|value| (name.to_string(), value)))
            .collect();
        form.push((CHECKSUM_FIELD.to_string(), self.checksum.clone()));
        form
    }

    pub fn mark_submitted(&mut self) -> Result<()> {
        self.expect_state(InitiateState::Building)?;
        self.state = InitiateState::Submitted;
        Ok(())
    }

    pub fn receive_reply(&mut self, reply: &FieldMap, key: &str) -> Result<&ReplyVerdict> {
        self.expect_state(InitiateState::Submitted)?;
        let reference = self.fields.text("REFERENCE").unwrap_or_default();
        let verdict = verify_initiate_reply(reply, &reference, key);
        self.state = if verdict.is_verified() {
            InitiateState::Verified
        } else {
            InitiateState::Rejected
        };
        Ok(&*self.verdict.insert(verdict))
    }

    fn expect_state(&self, expected: InitiateState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GatewayError::Validation(format!(
                "initiate request is {:?}, expected {:?}",
                self.state, expected
            )))
        }
    }
}

/// A storefront order to start a PayGate payment for.
#[derive(Debug, Clone, PartialEq)]
pub struct InitiateOrder {
    pub reference: String,
    pub amount: MajorAmount,
    pub email: String,
    /// Defaults to the current local time.
    pub transaction_date: Option<NaiveDateTime>,
}

/// A verified initiate: the accepted request and the processor's pay-request id.
#[derive(Debug, Clone, Serialize)]
pub struct InitiateOutcome {
    pub state: InitiateState,
    pub variant: String,
    pub fields: FieldMap,
    pub checksum: String,
    pub pay_request_id: String,
    pub reply: FieldMap,
    pub attempts: Vec<AttemptDiagnostic>,
}

/// Runs the PayGate initiate protocol, walking the configured variants in order.
///
/// Attempts are strictly sequential: each round trip finishes before the next
/// variant is tried, and a transport failure stops the walk. A variant whose form
/// is identical to one already posted is recorded as skipped, not sent again.
pub struct PayGateInitiator {
    config: PayGateConfig,
    transport: InitiateTransportBox,
}

impl PayGateInitiator {
    pub fn new(config: PayGateConfig, transport: InitiateTransportBox) -> Self {
        Self { config, transport }
    }

    pub fn payload(&self, order: &InitiateOrder) -> Result<InitiatePayload> {
        let reference = order.reference.trim();
        if reference.is_empty() {
            return Err(GatewayError::MissingRequiredField("reference"));
        }
        let email = order.email.trim();
        if email.is_empty() {
            return Err(GatewayError::MissingRequiredField("email"));
        }
        Ok(InitiatePayload {
            paygate_id: self.config.paygate_id.clone(),
            reference: reference.to_string(),
            amount: order.amount,
            currency: self.config.currency.clone(),
            return_url: self.config.return_url.clone(),
            transaction_date: order
                .transaction_date
                .unwrap_or_else(|| chrono::Local::now().naive_local()),
            locale: self.config.locale.clone(),
            country: self.config.country.clone(),
            email: email.to_string(),
            notify_url: self.config.notify_url.clone(),
        })
    }

    pub async fn initiate(&self, order: &InitiateOrder) -> Result<InitiateOutcome> {
        let payload = self.payload(order)?;
        let key = self.config.encryption_key.expose();
        let mut attempts = Vec::with_capacity(self.config.variants.len());
        // Forms already posted, by variant name. Identical forms are never re-posted.
        let mut posted: Vec<(&str, Vec<(String, String)>)> = Vec::new();

        for variant in &self.config.variants {
            let mut request = InitiateRequest::new(&payload, variant, key);
            let form = request.form_fields();
            if let Some((earlier, _)) = posted.iter().find(|(_, sent)| *sent == form) {
                tracing::debug!(
                    reference = %payload.reference,
                    variant = %variant.name,
                    duplicate_of = %earlier,
                    "Skipping initiate variant identical to an earlier attempt"
                );
                attempts.push(AttemptDiagnostic {
                    variant: variant.name.clone(),
                    checksum: request.checksum.clone(),
                    outcome: format!("skipped: duplicate of {earlier}"),
                });
                continue;
            }
            request.mark_submitted()?;

            let reply = self.transport.post_form(&form).await?;
            posted.push((variant.name.as_str(), form));
            let verdict = request.receive_reply(&reply, key)?.clone();

            match verdict {
                ReplyVerdict::Verified { pay_request_id } => {
                    attempts.push(AttemptDiagnostic {
                        variant: variant.name.clone(),
                        checksum: request.checksum.clone(),
                        outcome: "verified".to_string(),
                    });
                    tracing::info!(
                        reference = %payload.reference,
                        variant = %variant.name,
                        attempt = attempts.len(),
                        %pay_request_id,
                        "PayGate initiate verified"
                    );
                    return Ok(InitiateOutcome {
                        state: request.state,
                        variant: request.variant,
                        fields: request.fields,
                        checksum: request.checksum,
                        pay_request_id,
                        reply,
                        attempts,
                    });
                }
                ReplyVerdict::Rejected { reason } => {
                    tracing::warn!(
                        reference = %payload.reference,
                        variant = %variant.name,
                        attempt = attempts.len() + 1,
                        %reason,
                        "PayGate initiate attempt rejected"
                    );
                    attempts.push(AttemptDiagnostic {
                        variant: variant.name.clone(),
                        checksum: request.checksum.clone(),
                        outcome: reason,
                    });
                }
            }
        }

        tracing::error!(
            reference = %payload.reference,
            attempts = attempts.len(),
            "No PayGate initiate variant was verified"
        );
        Err(GatewayError::RemoteProtocolAmbiguity { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::paygate::build_initiate_reply_checksum;
    use crate::domain::variant::builtin_variants;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn payload() -> InitiatePayload {
        InitiatePayload {
            paygate_id: "10011072130".to_string(),
            reference: "pgtest_123456789".to_string(),
            amount: MajorAmount::new(dec!(32.99)).unwrap(),
            currency: "ZAR".to_string(),
            return_url: "https://my.return.url/page".to_string(),
            transaction_date: NaiveDate::from_ymd_opt(2018, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            locale: "en-za".to_string(),
            country: "ZAF".to_string(),
            email: "customer@paygate.co.za".to_string(),
            notify_url: None,
        }
    }

    #[test]
    fn test_request_matches_official_vector() {
        let request = InitiateRequest::new(&payload(), &builtin_variants()[0], "secret");
        assert_eq!(request.state(), InitiateState::Building);
        assert_eq!(request.checksum(), "59229d9c6cb336ae4bd287c87e6f0220");

        let form = request.form_fields();
        assert_eq!(form.len(), 10);
        assert_eq!(form[0].0, "PAYGATE_ID");
        assert_eq!(form[9], ("CHECKSUM".to_string(), "59229d9c6cb336ae4bd287c87e6f0220".to_string()));
    }

    #[test]
    fn test_state_transitions() {
        let mut request = InitiateRequest::new(&payload(), &builtin_variants()[0], "secret");
        let reply: FieldMap = [("PAYGATE_ID", "10011072130")].into_iter().collect();
        assert!(request.receive_reply(&reply, "secret").is_err());

        request.mark_submitted().unwrap();
        assert_eq!(request.state(), InitiateState::Submitted);
        assert!(request.mark_submitted().is_err());

        let mut reply: FieldMap = [
            ("PAYGATE_ID", "10011072130"),
            ("PAY_REQUEST_ID", "PR-1"),
            ("REFERENCE", "pgtest_123456789"),
        ]
        .into_iter()
        .collect();
        let checksum = build_initiate_reply_checksum(&reply, "secret");
        reply.insert("CHECKSUM", checksum);

        let verdict = request.receive_reply(&reply, "secret").unwrap();
        assert!(verdict.is_verified());
        assert_eq!(request.state(), InitiateState::Verified);
    }

    #[test]
    fn test_rejected_on_tampered_checksum() {
        let mut request = InitiateRequest::new(&payload(), &builtin_variants()[0], "secret");
        request.mark_submitted().unwrap();
        let reply: FieldMap = [
            ("PAYGATE_ID", "10011072130"),
            ("PAY_REQUEST_ID", "PR-1"),
            ("REFERENCE", "pgtest_123456789"),
            ("CHECKSUM", "00000000000000000000000000000000"),
        ]
        .into_iter()
        .collect();
        let verdict = request.receive_reply(&reply, "secret").unwrap().clone();
        assert_eq!(
            verdict,
            ReplyVerdict::Rejected { reason: "reply checksum mismatch".to_string() }
        );
        assert_eq!(request.state(), InitiateState::Rejected);
    }
}
