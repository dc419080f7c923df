use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::plans::PlanType;

/// Entitlement columns on the owning user row. The profile/search layer reads
/// these; this crate only ever writes them during activation.
#[async_trait]
#[automock]
pub trait MembershipRepository {
    async fn grant_membership(
        &self,
        user_id: Uuid,
        plan_type: PlanType,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn find_mobile_number(&self, user_id: Uuid) -> Result<Option<String>>;
}
