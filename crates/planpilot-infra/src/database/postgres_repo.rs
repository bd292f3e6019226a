//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DbConn, EntityTrait};

use planpilot_core::domain::SubscriptionRecord;
use planpilot_core::error::RepoError;
use planpilot_core::ports::SubscriptionRepository;

use super::entity::subscription::{self, Entity as SubscriptionEntity};

/// PostgreSQL subscription repository.
pub struct PostgresSubscriptionRepository {
    db: DbConn,
}

impl PostgresSubscriptionRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_user(&self, user_id: &str) -> Result<Option<SubscriptionRecord>, RepoError> {
        tracing::debug!(user_id = %user_id, "Finding subscription");

        let result = SubscriptionEntity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, RepoError> {
        let active_model: subscription::ActiveModel = record.clone().into();

        SubscriptionEntity::insert(active_model)
            .on_conflict(
                OnConflict::column(subscription::Column::UserId)
                    .update_columns([
                        subscription::Column::PlanId,
                        subscription::Column::Status,
                        subscription::Column::ProviderSubscriptionId,
                        subscription::Column::CurrentPeriodEnd,
                        subscription::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        tracing::info!(
            user_id = %record.user_id,
            plan = %record.plan_id,
            status = %record.status,
            "Subscription stored"
        );

        Ok(record)
    }
}
