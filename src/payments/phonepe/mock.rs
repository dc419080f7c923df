//! In-process stand-in for the hosted checkout, used in development when no
//! merchant credentials are present. Orders live in memory only, so anything
//! created before a restart reports as failed.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::info;

use crate::payments::phonepe::{
    CreateOrderRequest, CreatedOrder, GatewayError, GatewayResult, PaymentAttempt, PhonePeApi,
};
use async_trait::async_trait;

pub struct MockAdapter {
    redirect_url: String,
    orders: Mutex<HashMap<String, i64>>,
}

impl MockAdapter {
    pub fn new(redirect_url: String) -> Self {
        Self {
            redirect_url,
            orders: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PhonePeApi for MockAdapter {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, GatewayError> {
        let mut orders = self.orders.lock().await;
        orders.insert(request.order_id.clone(), request.amount_paise);
        info!(
            order_id = %request.order_id,
            amount_paise = request.amount_paise,
            "payments: mock gateway accepted order"
        );

        Ok(CreatedOrder {
            order_id: request.order_id.clone(),
            redirect_url: format!("{}?orderId={}", self.redirect_url, request.order_id),
        })
    }

    async fn order_status(&self, order_id: &str) -> Result<GatewayResult, GatewayError> {
        let orders = self.orders.lock().await;
        match orders.get(order_id) {
            Some(amount_paise) => Ok(GatewayResult {
                order_id: order_id.to_string(),
                raw_state: "COMPLETED".to_string(),
                is_success: true,
                amount_paise: Some(*amount_paise),
                attempts: vec![PaymentAttempt {
                    mode: Some("MOCK".to_string()),
                    state: Some("COMPLETED".to_string()),
                    transaction_id: Some(format!("MOCK_{order_id}")),
                }],
            }),
            None => Ok(GatewayResult {
                order_id: order_id.to_string(),
                raw_state: "FAILED".to_string(),
                is_success: false,
                amount_paise: None,
                attempts: Vec::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_request(order_id: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            order_id: order_id.to_string(),
            amount_paise: 399_900,
            user_id: Uuid::new_v4(),
            mobile_number: None,
            description: "Premium 3 months subscription".to_string(),
        }
    }

    #[tokio::test]
    async fn created_orders_report_completed_with_their_amount() {
        let adapter = MockAdapter::new("https://app.example.com/payment/status".to_string());
        let created = adapter
            .create_order(&sample_request("TXN_1700000000000_ab12cd34e"))
            .await
            .unwrap();
        assert!(created.redirect_url.contains("orderId=TXN_1700000000000_ab12cd34e"));

        let result = adapter
            .order_status("TXN_1700000000000_ab12cd34e")
            .await
            .unwrap();
        assert!(result.is_success);
        assert_eq!(result.raw_state, "COMPLETED");
        assert_eq!(result.amount_paise, Some(399_900));
        assert_eq!(result.attempts.len(), 1);
    }

    #[tokio::test]
    async fn unknown_orders_report_failed() {
        let adapter = MockAdapter::new("https://app.example.com/payment/status".to_string());

        let result = adapter.order_status("TXN_never_created").await.unwrap();
        assert!(!result.is_success);
        assert_eq!(result.raw_state, "FAILED");
        assert!(result.amount_paise.is_none());
    }
}
