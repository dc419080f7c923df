pub mod bearer;
pub mod legacy;
pub mod mock;
pub mod signature;

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;
use tracing::error;
use url::Url;
use uuid::Uuid;

use crate::config::config_model::PhonePeSettings;
use bearer::BearerAdapter;
use legacy::LegacyAdapter;
use mock::MockAdapter;

const GATEWAY_TIMEOUT_SECS: u64 = 30;

/// Gateway states that mean the payment is still in flight. Anything else
/// that is not an explicit success is terminal.
const IN_FLIGHT_STATES: [&str; 3] = ["PENDING", "PAYMENT_PENDING", "PAYMENT_INITIATED"];

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway configuration error: {0}")]
    Configuration(String),
    #[error("gateway returned status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("gateway request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected gateway response: {0}")]
    Protocol(String),
}

/// The two incompatible protocol generations PhonePe has shipped, plus an
/// offline stand-in for local development.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayVariant {
    Legacy,
    Bearer,
    Mock,
}

impl GatewayVariant {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "legacy" | "v1" | "salt" => Some(GatewayVariant::Legacy),
            "bearer" | "v2" | "oauth" => Some(GatewayVariant::Bearer),
            "mock" => Some(GatewayVariant::Mock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEnvironment {
    Sandbox,
    Production,
}

impl GatewayEnvironment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "sandbox" | "uat" | "preprod" => Some(GatewayEnvironment::Sandbox),
            "production" | "prod" => Some(GatewayEnvironment::Production),
            _ => None,
        }
    }

    /// Base URL for the salt-keyed v1 API.
    pub fn legacy_base_url(&self) -> &'static str {
        match self {
            GatewayEnvironment::Sandbox => "https://api-preprod.phonepe.com/apis/pg-sandbox",
            GatewayEnvironment::Production => "https://api.phonepe.com/apis/hermes",
        }
    }

    /// Base URL for the OAuth checkout v2 API.
    pub fn checkout_base_url(&self) -> &'static str {
        match self {
            GatewayEnvironment::Sandbox => "https://api-preprod.phonepe.com/apis/pg-sandbox",
            GatewayEnvironment::Production => "https://api.phonepe.com/apis/pg",
        }
    }

    pub fn token_url(&self) -> &'static str {
        match self {
            GatewayEnvironment::Sandbox => {
                "https://api-preprod.phonepe.com/apis/pg-sandbox/v1/oauth/token"
            }
            GatewayEnvironment::Production => {
                "https://api.phonepe.com/apis/identity-manager/v1/oauth/token"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub amount_paise: i64,
    pub user_id: Uuid,
    pub mobile_number: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOrder {
    pub order_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentAttempt {
    pub mode: Option<String>,
    pub state: Option<String>,
    pub transaction_id: Option<String>,
}

/// Outcome of a status query, normalized across protocol generations.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResult {
    pub order_id: String,
    pub raw_state: String,
    pub is_success: bool,
    pub amount_paise: Option<i64>,
    pub attempts: Vec<PaymentAttempt>,
}

impl GatewayResult {
    /// The payment has neither succeeded nor terminally failed yet.
    pub fn is_in_flight(&self) -> bool {
        !self.is_success && IN_FLIGHT_STATES.contains(&self.raw_state.as_str())
    }
}

/// Order id learned from a callback body. The claimed state is kept for
/// logging only; the outcome is always re-fetched over the signed status API.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackNotice {
    pub order_id: String,
    pub claimed_state: Option<String>,
}

#[async_trait]
pub trait PhonePeApi: Send + Sync {
    async fn create_order(&self, request: &CreateOrderRequest)
    -> Result<CreatedOrder, GatewayError>;

    async fn order_status(&self, order_id: &str) -> Result<GatewayResult, GatewayError>;
}

/// PhonePe client over one of the protocol adapters, selected from
/// configuration once at startup.
pub struct PhonePeClient {
    adapter: Box<dyn PhonePeApi>,
}

impl PhonePeClient {
    pub fn from_settings(settings: &PhonePeSettings) -> Result<Self, GatewayError> {
        let variant = GatewayVariant::parse(&settings.variant).ok_or_else(|| {
            GatewayError::Configuration(format!(
                "unknown PHONEPE_VARIANT {:?}, expected legacy, bearer or mock",
                settings.variant
            ))
        })?;
        let environment = GatewayEnvironment::parse(&settings.environment).ok_or_else(|| {
            GatewayError::Configuration(format!(
                "unknown PHONEPE_ENV {:?}, expected sandbox or production",
                settings.environment
            ))
        })?;

        Url::parse(&settings.redirect_url).map_err(|err| {
            GatewayError::Configuration(format!("PAYMENT_REDIRECT_URL is not a valid URL: {err}"))
        })?;
        Url::parse(&settings.callback_url).map_err(|err| {
            GatewayError::Configuration(format!("PAYMENT_CALLBACK_URL is not a valid URL: {err}"))
        })?;

        let adapter: Box<dyn PhonePeApi> = match variant {
            GatewayVariant::Legacy => {
                Box::new(LegacyAdapter::from_settings(settings, environment)?)
            }
            GatewayVariant::Bearer => {
                Box::new(BearerAdapter::from_settings(settings, environment)?)
            }
            GatewayVariant::Mock => Box::new(MockAdapter::new(settings.redirect_url.clone())),
        };

        Ok(Self { adapter })
    }

    /// Deterministic offline client, no credentials needed.
    pub fn mock() -> Self {
        Self {
            adapter: Box::new(MockAdapter::new(
                "http://localhost:3000/payment/status".to_string(),
            )),
        }
    }

    /// Client that rejects every call with the stored configuration error.
    /// Lets the rest of the API serve while payments are unprovisioned.
    pub fn unconfigured(reason: String) -> Self {
        Self {
            adapter: Box::new(DisabledAdapter { reason }),
        }
    }

    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, GatewayError> {
        self.adapter.create_order(request).await
    }

    pub async fn order_status(&self, order_id: &str) -> Result<GatewayResult, GatewayError> {
        self.adapter.order_status(order_id).await
    }

    pub fn decode_callback(&self, body: &[u8]) -> Result<CallbackNotice, GatewayError> {
        decode_callback(body)
    }
}

struct DisabledAdapter {
    reason: String,
}

#[async_trait]
impl PhonePeApi for DisabledAdapter {
    async fn create_order(
        &self,
        _request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, GatewayError> {
        Err(GatewayError::Configuration(self.reason.clone()))
    }

    async fn order_status(&self, _order_id: &str) -> Result<GatewayResult, GatewayError> {
        Err(GatewayError::Configuration(self.reason.clone()))
    }
}

/// Decodes a callback body into the order id it refers to. Accepts both the
/// legacy `{"response": "<base64 json>"}` envelope and plain JSON bodies, with
/// the order id at the top level or nested under `data`/`payload`.
pub fn decode_callback(body: &[u8]) -> Result<CallbackNotice, GatewayError> {
    let outer: serde_json::Value = serde_json::from_slice(body)
        .map_err(|err| GatewayError::Protocol(format!("callback body is not JSON: {err}")))?;

    let inner = match outer.get("response").and_then(|value| value.as_str()) {
        Some(encoded) => {
            let decoded = BASE64.decode(encoded).map_err(|err| {
                GatewayError::Protocol(format!("callback response field is not base64: {err}"))
            })?;
            serde_json::from_slice(&decoded).map_err(|err| {
                GatewayError::Protocol(format!("decoded callback is not JSON: {err}"))
            })?
        }
        None => outer,
    };

    let order_id = lookup_str(&inner, &["merchantTransactionId", "merchantOrderId", "orderId"])
        .ok_or_else(|| GatewayError::Protocol("callback carries no order id".to_string()))?;
    let claimed_state = lookup_str(&inner, &["state"]);

    Ok(CallbackNotice {
        order_id,
        claimed_state,
    })
}

fn lookup_str(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(found) = value.get(key).and_then(|v| v.as_str()) {
            return Some(found.to_string());
        }
    }
    for nested in ["data", "payload"] {
        if let Some(object) = value.get(nested) {
            for key in keys {
                if let Some(found) = object.get(key).and_then(|v| v.as_str()) {
                    return Some(found.to_string());
                }
            }
        }
    }
    None
}

pub(crate) fn build_http_client() -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(GATEWAY_TIMEOUT_SECS))
        .build()
        .map_err(|err| GatewayError::Configuration(format!("failed to build http client: {err}")))
}

pub(crate) fn require_setting(
    value: Option<&String>,
    name: &str,
) -> Result<String, GatewayError> {
    value
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| GatewayError::Configuration(format!("{name} is not set")))
}

pub(crate) async fn ensure_success(
    resp: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, GatewayError> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let status = resp.status();
    let body = match resp.text().await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => "<empty response body>".to_string(),
        Err(err) => format!("<failed to read response body: {err}>"),
    };

    error!(
        status = %status,
        response_body = %body,
        context = %context,
        "phonepe api request failed"
    );

    Err(GatewayError::Http {
        status: status.as_u16(),
        body,
    })
}
