//! Adapter for the salt-keyed v1 API generation (hermes). Every request is
//! checksummed with the merchant salt; there is no token exchange.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::config_model::PhonePeSettings;
use crate::payments::phonepe::{
    CreateOrderRequest, CreatedOrder, GatewayEnvironment, GatewayError, GatewayResult,
    PaymentAttempt, PhonePeApi, build_http_client, ensure_success, require_setting, signature,
};
use async_trait::async_trait;

const PAY_PATH: &str = "/pg/v1/pay";
const STATUS_PATH_PREFIX: &str = "/pg/v1/status";
const PAY_PAGE_INSTRUMENT: &str = "PAY_PAGE";
const FALLBACK_MOBILE: &str = "9999999999";

#[derive(Debug)]
pub struct LegacyAdapter {
    http: reqwest::Client,
    base_url: String,
    merchant_id: String,
    salt_key: String,
    salt_index: String,
    redirect_url: String,
    callback_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayPayload {
    merchant_id: String,
    merchant_transaction_id: String,
    merchant_user_id: String,
    amount: i64,
    redirect_url: String,
    redirect_mode: String,
    callback_url: String,
    mobile_number: String,
    payment_instrument: PaymentInstrument,
}

#[derive(Debug, Serialize)]
struct PaymentInstrument {
    #[serde(rename = "type")]
    type_: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayResponse {
    #[allow(dead_code)]
    success: bool,
    code: Option<String>,
    data: Option<PayData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayData {
    instrument_response: Option<InstrumentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentResponse {
    redirect_info: Option<RedirectInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedirectInfo {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    #[allow(dead_code)]
    success: bool,
    code: Option<String>,
    data: Option<StatusData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusData {
    transaction_id: Option<String>,
    state: Option<String>,
    amount: Option<i64>,
    payment_instrument: Option<StatusInstrument>,
}

#[derive(Debug, Deserialize)]
struct StatusInstrument {
    #[serde(rename = "type")]
    type_: Option<String>,
}

impl LegacyAdapter {
    pub fn from_settings(
        settings: &PhonePeSettings,
        environment: GatewayEnvironment,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            http: build_http_client()?,
            base_url: environment.legacy_base_url().to_string(),
            merchant_id: require_setting(settings.merchant_id.as_ref(), "PHONEPE_MERCHANT_ID")?,
            salt_key: require_setting(settings.salt_key.as_ref(), "PHONEPE_SALT_KEY")?,
            salt_index: require_setting(settings.salt_index.as_ref(), "PHONEPE_SALT_INDEX")?,
            redirect_url: settings.redirect_url.clone(),
            callback_url: settings.callback_url.clone(),
        })
    }

    fn pay_payload(&self, request: &CreateOrderRequest) -> PayPayload {
        PayPayload {
            merchant_id: self.merchant_id.clone(),
            merchant_transaction_id: request.order_id.clone(),
            merchant_user_id: request.user_id.to_string(),
            amount: request.amount_paise,
            redirect_url: self.redirect_url.clone(),
            redirect_mode: "POST".to_string(),
            callback_url: self.callback_url.clone(),
            mobile_number: request
                .mobile_number
                .clone()
                .unwrap_or_else(|| FALLBACK_MOBILE.to_string()),
            payment_instrument: PaymentInstrument {
                type_: PAY_PAGE_INSTRUMENT.to_string(),
            },
        }
    }

    fn status_result(order_id: &str, response: StatusResponse) -> GatewayResult {
        let code = response.code.unwrap_or_default();
        let raw_state = response
            .data
            .as_ref()
            .and_then(|data| data.state.clone())
            .unwrap_or_else(|| match code.as_str() {
                "PAYMENT_SUCCESS" => "COMPLETED".to_string(),
                "PAYMENT_PENDING" | "PAYMENT_INITIATED" => "PENDING".to_string(),
                other => other.to_string(),
            });
        let is_success = raw_state == "COMPLETED" && code == "PAYMENT_SUCCESS";

        let amount_paise = response.data.as_ref().and_then(|data| data.amount);
        let attempts = response
            .data
            .map(|data| {
                vec![PaymentAttempt {
                    mode: data.payment_instrument.and_then(|inst| inst.type_),
                    state: data.state,
                    transaction_id: data.transaction_id,
                }]
            })
            .unwrap_or_default();

        GatewayResult {
            order_id: order_id.to_string(),
            raw_state,
            is_success,
            amount_paise,
            attempts,
        }
    }
}

#[async_trait]
impl PhonePeApi for LegacyAdapter {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, GatewayError> {
        let payload = serde_json::to_vec(&self.pay_payload(request)).map_err(|err| {
            GatewayError::Protocol(format!("failed to encode pay payload: {err}"))
        })?;
        let encoded = BASE64.encode(payload);
        let x_verify = signature::x_verify(
            &signature::sign(&encoded, PAY_PATH, &self.salt_key),
            &self.salt_index,
        );

        let resp = self
            .http
            .post(format!("{}{}", self.base_url, PAY_PATH))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header("X-VERIFY", x_verify)
            .json(&serde_json::json!({ "request": encoded }))
            .send()
            .await?;
        let resp = ensure_success(resp, "create payment order").await?;

        let parsed: PayResponse = resp.json().await?;
        let redirect_url = parsed
            .data
            .and_then(|data| data.instrument_response)
            .and_then(|inst| inst.redirect_info)
            .and_then(|redirect| redirect.url)
            .ok_or_else(|| {
                GatewayError::Protocol(format!(
                    "payment url missing in pay response (code {:?})",
                    parsed.code
                ))
            })?;

        Ok(CreatedOrder {
            order_id: request.order_id.clone(),
            redirect_url,
        })
    }

    async fn order_status(&self, order_id: &str) -> Result<GatewayResult, GatewayError> {
        let path = format!("{}/{}/{}", STATUS_PATH_PREFIX, self.merchant_id, order_id);
        let x_verify = signature::x_verify(
            &signature::sign_path(&path, &self.salt_key),
            &self.salt_index,
        );

        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header("X-VERIFY", x_verify)
            .header("X-MERCHANT-ID", self.merchant_id.clone())
            .send()
            .await?;
        let resp = ensure_success(resp, "order status").await?;

        let parsed: StatusResponse = resp.json().await?;
        Ok(Self::status_result(order_id, parsed))
    }
}
