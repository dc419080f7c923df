use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::update;
use uuid::Uuid;

use crate::domain::repositories::memberships::MembershipRepository;
use crate::domain::value_objects::plans::PlanType;
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::users};

pub struct MembershipPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MembershipPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MembershipRepository for MembershipPostgres {
    async fn grant_membership(
        &self,
        user_id: Uuid,
        plan_type: PlanType,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(users::table)
            .filter(users::id.eq(user_id))
            .set((
                users::membership_type.eq(plan_type.to_string()),
                users::membership_expiry.eq(Some(expires_at)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn find_mobile_number(&self, user_id: Uuid) -> Result<Option<String>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = users::table
            .filter(users::id.eq(user_id))
            .select(users::phone)
            .first::<String>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
