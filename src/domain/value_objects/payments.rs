use serde::{Deserialize, Serialize};

use crate::domain::entities::subscriptions::SubscriptionEntity;
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;
use crate::domain::value_objects::plans::{PlanDuration, PlanType};
use crate::domain::value_objects::subscriptions::SubscriptionDto;

/// Body of `POST /payments/create-order`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderModel {
    pub plan_type: PlanType,
    pub duration: PlanDuration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub message: String,
    pub payment_url: String,
    pub order_id: String,
}

/// Gateway-style labels for a stored subscription status, shared by the
/// authenticated and public verification paths.
pub fn payment_status_labels(status: SubscriptionStatus) -> (&'static str, &'static str) {
    match status {
        SubscriptionStatus::Active => ("COMPLETED", "PAYMENT_SUCCESS"),
        SubscriptionStatus::Pending => ("PENDING", "PAYMENT_PENDING"),
        SubscriptionStatus::Cancelled => ("FAILED", "PAYMENT_ERROR"),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerificationResponse {
    pub success: bool,
    pub payment_status: String,
    pub code: String,
    pub subscription: SubscriptionDto,
}

impl PaymentVerificationResponse {
    pub fn from_entity(entity: SubscriptionEntity) -> Self {
        let status = SubscriptionStatus::from_str(&entity.status);
        let (payment_status, code) = payment_status_labels(status);
        Self {
            success: true,
            payment_status: payment_status.to_string(),
            code: code.to_string(),
            subscription: SubscriptionDto::from(entity),
        }
    }
}

/// Acknowledgement returned to the gateway's server-to-server callback once
/// the outcome has been durably recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackAck {
    pub success: bool,
    pub message: String,
    pub order_id: String,
    pub payment_status: String,
}

impl CallbackAck {
    pub fn from_entity(entity: &SubscriptionEntity) -> Self {
        let status = SubscriptionStatus::from_str(&entity.status);
        let (payment_status, _) = payment_status_labels(status);
        let (success, message) = match status {
            SubscriptionStatus::Active => (true, "Payment successful"),
            SubscriptionStatus::Pending => (false, "Payment pending"),
            SubscriptionStatus::Cancelled => (false, "Payment failed"),
        };
        Self {
            success,
            message: message.to_string(),
            order_id: entity.order_id.clone(),
            payment_status: payment_status.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryResponse {
    pub success: bool,
    pub subscriptions: Vec<SubscriptionDto>,
}
