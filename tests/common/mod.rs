#![allow(dead_code)]

use async_trait::async_trait;
use paysign::config::{GatewayConfig, PayGateConfig, SecretKey};
use paysign::domain::fields::FieldMap;
use paysign::domain::paygate::{CHECKSUM_FIELD, build_initiate_reply_checksum};
use paysign::domain::ports::InitiateTransport;
use paysign::error::{GatewayError, Result};
use std::sync::{Arc, Mutex};

pub const PAYGATE_ID: &str = "10011072130";
pub const KEY: &str = "secret";

pub fn paygate_config() -> PayGateConfig {
    let mut config = GatewayConfig::from_lookup(|_| None).unwrap().paygate;
    config.paygate_id = PAYGATE_ID.to_string();
    config.encryption_key = SecretKey::new(KEY);
    config.return_url = "https://my.return.url/page".to_string();
    config.notify_url = Some("https://my.notify.url/page".to_string());
    config
}

/// How the fake processor answers one initiate POST.
pub enum Reply {
    /// A correctly signed reply for the posted reference.
    Accept,
    /// An `ERROR=<code>` reply.
    Error(&'static str),
    /// A reply whose checksum was signed with another key.
    WrongKey,
    /// A transport failure.
    Unreachable,
}

type Script = Box<dyn Fn(&FieldMap) -> Reply + Send + Sync>;

/// An in-process stand-in for the PayGate initiate endpoint.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Script>,
    posted: Arc<Mutex<Vec<Vec<(String, String)>>>>,
}

impl ScriptedTransport {
    pub fn new(script: impl Fn(&FieldMap) -> Reply + Send + Sync + 'static) -> Self {
        let script: Script = Box::new(script);
        Self {
            script: Arc::new(script),
            posted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn posted(&self) -> Vec<Vec<(String, String)>> {
        self.posted.lock().unwrap().clone()
    }
}

fn signed_reply(reference: &str, key: &str) -> FieldMap {
    let mut reply: FieldMap = [
        ("PAYGATE_ID", PAYGATE_ID),
        ("PAY_REQUEST_ID", "23B785AE-C96C-32AF-4879-D2C9363DB6E8"),
        ("REFERENCE", reference),
    ]
    .into_iter()
    .collect();
    let checksum = build_initiate_reply_checksum(&reply, key);
    reply.insert(CHECKSUM_FIELD, checksum);
    reply
}

#[async_trait]
impl InitiateTransport for ScriptedTransport {
    async fn post_form(&self, fields: &[(String, String)]) -> Result<FieldMap> {
        self.posted.lock().unwrap().push(fields.to_vec());
        let request: FieldMap = fields.iter().cloned().collect();
        let reference = request.text("REFERENCE").unwrap_or_default();

        match (self.script)(&request) {
            Reply::Accept => Ok(signed_reply(&reference, KEY)),
            Reply::WrongKey => Ok(signed_reply(&reference, "not-the-key")),
            Reply::Error(code) => Ok([("ERROR", code)].into_iter().collect()),
            Reply::Unreachable => Err(GatewayError::RemoteStatus {
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }
}
