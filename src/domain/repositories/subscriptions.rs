use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    async fn insert_pending(&self, entity: InsertSubscriptionEntity) -> Result<Uuid>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<SubscriptionEntity>>;

    async fn find_active_by_user(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>>;

    /// Flips a row from `Pending` to `Active` and stamps its end date. The
    /// update is guarded on the current status; returns whether a row
    /// actually transitioned, so callers can detect a lost race.
    async fn activate_pending(&self, order_id: &str, end_date: DateTime<Utc>) -> Result<bool>;

    /// Guarded `Pending` to `Cancelled` transition; same contract as
    /// `activate_pending`.
    async fn cancel_pending(&self, order_id: &str) -> Result<bool>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SubscriptionEntity>>;
}
