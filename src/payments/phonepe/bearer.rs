//! Adapter for the OAuth checkout v2 API generation. Tokens are obtained with
//! a client-credentials grant and cached until shortly before expiry; the
//! cache lock is held across a refresh so concurrent calls trigger at most
//! one token request.

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::config_model::PhonePeSettings;
use crate::payments::phonepe::{
    CreateOrderRequest, CreatedOrder, GatewayEnvironment, GatewayError, GatewayResult,
    PaymentAttempt, PhonePeApi, build_http_client, ensure_success, require_setting,
};
use async_trait::async_trait;

const PAY_PATH: &str = "/checkout/v2/pay";
const STATUS_PATH_PREFIX: &str = "/checkout/v2/order";
const CHECKOUT_FLOW: &str = "PG_CHECKOUT";
const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;
const TOKEN_FALLBACK_TTL_SECS: i64 = 300;

#[derive(Debug)]
pub struct BearerAdapter {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    client_version: String,
    redirect_url: String,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now + TOKEN_EXPIRY_SKEW_SECS < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayRequest {
    merchant_order_id: String,
    amount: i64,
    meta_info: MetaInfo,
    payment_flow: PaymentFlow,
}

#[derive(Debug, Serialize)]
struct MetaInfo {
    udf1: String,
    udf2: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentFlow {
    #[serde(rename = "type")]
    type_: String,
    message: String,
    merchant_urls: MerchantUrls,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MerchantUrls {
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayResponse {
    redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderStatusResponse {
    state: Option<String>,
    amount: Option<i64>,
    #[serde(default)]
    payment_details: Vec<PaymentDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentDetail {
    payment_mode: Option<String>,
    state: Option<String>,
    transaction_id: Option<String>,
}

impl BearerAdapter {
    pub fn from_settings(
        settings: &PhonePeSettings,
        environment: GatewayEnvironment,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            http: build_http_client()?,
            base_url: environment.checkout_base_url().to_string(),
            token_url: environment.token_url().to_string(),
            client_id: require_setting(settings.client_id.as_ref(), "PHONEPE_CLIENT_ID")?,
            client_secret: require_setting(
                settings.client_secret.as_ref(),
                "PHONEPE_CLIENT_SECRET",
            )?,
            client_version: require_setting(
                settings.client_version.as_ref(),
                "PHONEPE_CLIENT_VERSION",
            )?,
            redirect_url: settings.redirect_url.clone(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self, force_refresh: bool) -> Result<String, GatewayError> {
        let now = Utc::now().timestamp();
        let mut guard = self.token.lock().await;

        if !force_refresh {
            if let Some(cached) = guard.as_ref() {
                if cached.is_fresh(now) {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let resp = self
            .http
            .post(&self.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_version", self.client_version.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;
        let resp = ensure_success(resp, "oauth token").await?;

        let parsed: TokenResponse = resp.json().await?;
        let cached = cache_entry(parsed, now)?;
        info!(
            expires_at = cached.expires_at,
            "payments: refreshed gateway access token"
        );
        let token = cached.access_token.clone();
        *guard = Some(cached);
        Ok(token)
    }

    async fn send_authorized(
        &self,
        context: &str,
        build: impl Fn(&str) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        let token = self.access_token(false).await?;
        let resp = build(&token).send().await?;

        // A stale token that outlived its advertised expiry earns one refresh.
        if resp.status() == StatusCode::UNAUTHORIZED {
            let token = self.access_token(true).await?;
            let resp = build(&token).send().await?;
            return ensure_success(resp, context).await;
        }

        ensure_success(resp, context).await
    }

    fn pay_request(&self, request: &CreateOrderRequest) -> PayRequest {
        PayRequest {
            merchant_order_id: request.order_id.clone(),
            amount: request.amount_paise,
            meta_info: MetaInfo {
                udf1: request.user_id.to_string(),
                udf2: request.description.clone(),
            },
            payment_flow: PaymentFlow {
                type_: CHECKOUT_FLOW.to_string(),
                message: request.description.clone(),
                merchant_urls: MerchantUrls {
                    redirect_url: self.redirect_url.clone(),
                },
            },
        }
    }

    fn status_result(order_id: &str, response: OrderStatusResponse) -> GatewayResult {
        let raw_state = response.state.unwrap_or_else(|| "UNKNOWN".to_string());
        let is_success = raw_state == "COMPLETED";
        let attempts = response
            .payment_details
            .into_iter()
            .map(|detail| PaymentAttempt {
                mode: detail.payment_mode,
                state: detail.state,
                transaction_id: detail.transaction_id,
            })
            .collect();

        GatewayResult {
            order_id: order_id.to_string(),
            raw_state,
            is_success,
            amount_paise: response.amount,
            attempts,
        }
    }
}

fn cache_entry(response: TokenResponse, now: i64) -> Result<CachedToken, GatewayError> {
    let access_token = response
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            GatewayError::Protocol("access token missing in oauth response".to_string())
        })?;
    let expires_at = response
        .expires_at
        .or(response.expires_in.map(|ttl| now + ttl))
        .unwrap_or(now + TOKEN_FALLBACK_TTL_SECS);

    Ok(CachedToken {
        access_token,
        expires_at,
    })
}

#[async_trait]
impl PhonePeApi for BearerAdapter {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, GatewayError> {
        let body = serde_json::to_value(self.pay_request(request)).map_err(|err| {
            GatewayError::Protocol(format!("failed to encode pay request: {err}"))
        })?;
        let url = format!("{}{}", self.base_url, PAY_PATH);

        let resp = self
            .send_authorized("create payment order", |token| {
                self.http
                    .post(&url)
                    .header(CONTENT_TYPE, "application/json")
                    .header(ACCEPT, "application/json")
                    .header(AUTHORIZATION, format!("O-Bearer {token}"))
                    .json(&body)
            })
            .await?;

        let parsed: PayResponse = resp.json().await?;
        let redirect_url = parsed.redirect_url.ok_or_else(|| {
            GatewayError::Protocol("redirect url missing in pay response".to_string())
        })?;

        Ok(CreatedOrder {
            order_id: request.order_id.clone(),
            redirect_url,
        })
    }

    async fn order_status(&self, order_id: &str) -> Result<GatewayResult, GatewayError> {
        let url = format!("{}{}/{}/status", self.base_url, STATUS_PATH_PREFIX, order_id);

        let resp = self
            .send_authorized("order status", |token| {
                self.http
                    .get(&url)
                    .header(ACCEPT, "application/json")
                    .header(AUTHORIZATION, format!("O-Bearer {token}"))
            })
            .await?;

        let parsed: OrderStatusResponse = resp.json().await?;
        Ok(Self::status_result(order_id, parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_settings() -> PhonePeSettings {
        PhonePeSettings {
            variant: "bearer".to_string(),
            environment: "sandbox".to_string(),
            merchant_id: None,
            salt_key: None,
            salt_index: None,
            client_id: Some("client-id".to_string()),
            client_secret: Some("client-secret".to_string()),
            client_version: Some("1".to_string()),
            redirect_url: "https://app.example.com/payment/status".to_string(),
            callback_url: "https://api.example.com/api/v1/payments/callback".to_string(),
        }
    }

    #[test]
    fn missing_client_secret_is_a_configuration_error() {
        let mut settings = sample_settings();
        settings.client_secret = Some(String::new());

        let err = BearerAdapter::from_settings(&settings, GatewayEnvironment::Sandbox).unwrap_err();
        match err {
            GatewayError::Configuration(message) => {
                assert!(message.contains("PHONEPE_CLIENT_SECRET"))
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn pay_request_matches_wire_contract() {
        let adapter =
            BearerAdapter::from_settings(&sample_settings(), GatewayEnvironment::Sandbox).unwrap();
        let user_id = Uuid::new_v4();
        let request = CreateOrderRequest {
            order_id: "TXN_1700000000000_ab12cd34e".to_string(),
            amount_paise: 299_900,
            user_id,
            mobile_number: None,
            description: "Premium Plus 1 month subscription".to_string(),
        };

        let body = serde_json::to_value(adapter.pay_request(&request)).unwrap();

        assert_eq!(body["merchantOrderId"], request.order_id);
        assert_eq!(body["amount"], 299_900);
        assert_eq!(body["metaInfo"]["udf1"], user_id.to_string());
        assert_eq!(body["paymentFlow"]["type"], "PG_CHECKOUT");
        assert_eq!(
            body["paymentFlow"]["merchantUrls"]["redirectUrl"],
            "https://app.example.com/payment/status"
        );
    }

    #[test]
    fn cached_token_expires_with_skew() {
        let token = CachedToken {
            access_token: "token".to_string(),
            expires_at: 1_000,
        };

        assert!(token.is_fresh(1_000 - TOKEN_EXPIRY_SKEW_SECS - 1));
        assert!(!token.is_fresh(1_000 - TOKEN_EXPIRY_SKEW_SECS));
        assert!(!token.is_fresh(1_000));
    }

    #[test]
    fn cache_entry_prefers_absolute_expiry() {
        let entry = cache_entry(
            TokenResponse {
                access_token: Some("token".to_string()),
                expires_at: Some(5_000),
                expires_in: Some(60),
            },
            1_000,
        )
        .unwrap();
        assert_eq!(entry.expires_at, 5_000);

        let relative = cache_entry(
            TokenResponse {
                access_token: Some("token".to_string()),
                expires_at: None,
                expires_in: Some(60),
            },
            1_000,
        )
        .unwrap();
        assert_eq!(relative.expires_at, 1_060);
    }

    #[test]
    fn cache_entry_rejects_missing_token() {
        let err = cache_entry(
            TokenResponse {
                access_token: None,
                expires_at: Some(5_000),
                expires_in: None,
            },
            1_000,
        )
        .unwrap_err();

        assert!(matches!(err, GatewayError::Protocol(_)));
    }

    #[test]
    fn status_result_maps_payment_details() {
        let response: OrderStatusResponse = serde_json::from_value(serde_json::json!({
            "orderId": "OMO2401010000001",
            "state": "COMPLETED",
            "amount": 299_900,
            "paymentDetails": [
                { "paymentMode": "UPI_QR", "transactionId": "OM2401010000001", "state": "COMPLETED" }
            ]
        }))
        .unwrap();

        let result = BearerAdapter::status_result("TXN_1", response);
        assert!(result.is_success);
        assert_eq!(result.order_id, "TXN_1");
        assert_eq!(result.amount_paise, Some(299_900));
        assert_eq!(result.attempts[0].mode.as_deref(), Some("UPI_QR"));
    }

    #[test]
    fn status_result_without_state_is_not_success() {
        let response: OrderStatusResponse =
            serde_json::from_value(serde_json::json!({ "amount": 100 })).unwrap();

        let result = BearerAdapter::status_result("TXN_1", response);
        assert!(!result.is_success);
        assert_eq!(result.raw_state, "UNKNOWN");
        assert!(!result.is_in_flight());
    }
}
