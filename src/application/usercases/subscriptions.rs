use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::repositories::subscriptions::SubscriptionRepository;
use crate::domain::value_objects::plans::{PlansResponse, plan_catalog};
use crate::domain::value_objects::subscriptions::{CurrentSubscriptionResponse, SubscriptionDto};

pub struct SubscriptionUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    subscription_repository: Arc<S>,
}

impl<S> SubscriptionUseCase<S>
where
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repository: Arc<S>) -> Self {
        Self {
            subscription_repository,
        }
    }

    /// Latest active subscription for the user, with plan features attached.
    pub async fn current_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<CurrentSubscriptionResponse> {
        info!(%user_id, "subscriptions: current subscription requested");

        let subscription = self
            .subscription_repository
            .find_active_by_user(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "subscriptions: failed to load current subscription"
                );
                err
            })?;

        Ok(CurrentSubscriptionResponse {
            success: true,
            subscription: subscription.map(SubscriptionDto::from),
        })
    }

    pub fn list_plans(&self) -> PlansResponse {
        PlansResponse {
            success: true,
            plans: plan_catalog(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::subscriptions::SubscriptionEntity;
    use crate::domain::repositories::subscriptions::MockSubscriptionRepository;
    use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;
    use crate::domain::value_objects::plans::{PlanDuration, PlanType};
    use chrono::{Months, Utc};
    use mockall::predicate::eq;

    fn sample_active(user_id: Uuid) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_type: "Premium Plus".to_string(),
            duration_months: 3,
            price_paise: 799_900,
            order_id: "TXN_1700000000000_ab12cd34e".to_string(),
            status: SubscriptionStatus::Active.to_string(),
            start_date: now,
            end_date: now.checked_add_months(Months::new(3)),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn current_returns_latest_active_subscription_with_features() {
        let user_id = Uuid::new_v4();
        let active = sample_active(user_id);

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_by_user()
            .with(eq(user_id))
            .returning(move |_| {
                let active = active.clone();
                Box::pin(async move { Ok(Some(active)) })
            });

        let usecase = SubscriptionUseCase::new(Arc::new(subscription_repo));
        let response = usecase.current_subscription(user_id).await.unwrap();

        assert!(response.success);
        let subscription = response.subscription.unwrap();
        assert_eq!(subscription.plan_type, PlanType::PremiumPlus);
        assert_eq!(subscription.duration, "3 months");
        assert!(subscription.features.priority_support);
    }

    #[tokio::test]
    async fn current_is_null_for_free_tier_user() {
        let user_id = Uuid::new_v4();

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_by_user()
            .with(eq(user_id))
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = SubscriptionUseCase::new(Arc::new(subscription_repo));
        let response = usecase.current_subscription(user_id).await.unwrap();

        assert!(response.success);
        assert!(response.subscription.is_none());
    }

    #[tokio::test]
    async fn plans_cover_every_purchasable_combination() {
        let usecase = SubscriptionUseCase::new(Arc::new(MockSubscriptionRepository::new()));
        let response = usecase.list_plans();

        assert!(response.success);
        assert_eq!(response.plans.len(), 8);
        assert!(
            response
                .plans
                .iter()
                .any(|offer| offer.plan_type == PlanType::Premium
                    && offer.duration == PlanDuration::TwelveMonths
                    && offer.price_paise == 1_499_900)
        );
    }
}
