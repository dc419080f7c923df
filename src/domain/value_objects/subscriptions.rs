use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::subscriptions::SubscriptionEntity;
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;
use crate::domain::value_objects::plans::{PlanDuration, PlanFeatures, PlanType};

/// Subscription as shown to clients. Features are attached here from the plan
/// type; they are not stored alongside the row.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub plan_type: PlanType,
    pub duration: String,
    pub price_paise: i64,
    pub order_id: String,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub features: PlanFeatures,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(entity: SubscriptionEntity) -> Self {
        let plan_type = PlanType::from_str(&entity.plan_type);
        let duration = match PlanDuration::from_months(entity.duration_months) {
            Some(duration) => duration.to_string(),
            None => format!("{} months", entity.duration_months),
        };

        Self {
            id: entity.id,
            plan_type,
            duration,
            price_paise: entity.price_paise,
            order_id: entity.order_id,
            status: SubscriptionStatus::from_str(&entity.status),
            start_date: entity.start_date,
            end_date: entity.end_date,
            features: PlanFeatures::for_plan(plan_type),
            created_at: entity.created_at,
        }
    }
}

/// `subscription` is null for users on the free tier; that is not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSubscriptionResponse {
    pub success: bool,
    pub subscription: Option<SubscriptionDto>,
}
