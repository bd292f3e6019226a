use async_trait::async_trait;

use crate::domain::SubscriptionRecord;
use crate::error::RepoError;

/// Access to the subscription table maintained by billing webhooks.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find the subscription for a user, if one was ever recorded.
    async fn find_by_user(&self, user_id: &str) -> Result<Option<SubscriptionRecord>, RepoError>;

    /// Insert or replace the subscription for `record.user_id`.
    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, RepoError>;
}
