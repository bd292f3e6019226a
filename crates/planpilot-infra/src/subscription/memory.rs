//! In-memory subscription store - used when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use planpilot_core::domain::SubscriptionRecord;
use planpilot_core::error::RepoError;
use planpilot_core::ports::SubscriptionRepository;

/// Subscription store backed by a HashMap with an async RwLock.
///
/// Note: Data is lost on process restart.
pub struct InMemorySubscriptionStore {
    store: RwLock<HashMap<String, SubscriptionRecord>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionStore {
    async fn find_by_user(&self, user_id: &str) -> Result<Option<SubscriptionRecord>, RepoError> {
        let store = self.store.read().await;
        Ok(store.get(user_id).cloned())
    }

    async fn upsert(&self, record: SubscriptionRecord) -> Result<SubscriptionRecord, RepoError> {
        let mut store = self.store.write().await;
        store.insert(record.user_id.clone(), record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planpilot_core::domain::{PlanId, SubscriptionStatus};

    #[tokio::test]
    async fn test_upsert_and_find() {
        let store = InMemorySubscriptionStore::new();
        assert!(store.find_by_user("user_1").await.unwrap().is_none());

        store
            .upsert(SubscriptionRecord::new("user_1", PlanId::pro(), SubscriptionStatus::Active))
            .await
            .unwrap();
        let found = store.find_by_user("user_1").await.unwrap().unwrap();
        assert_eq!(found.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = InMemorySubscriptionStore::new();
        store
            .upsert(SubscriptionRecord::new("user_1", PlanId::pro(), SubscriptionStatus::Active))
            .await
            .unwrap();
        store
            .upsert(SubscriptionRecord::new(
                "user_1",
                PlanId::pro(),
                SubscriptionStatus::Suspended,
            ))
            .await
            .unwrap();

        let found = store.find_by_user("user_1").await.unwrap().unwrap();
        assert_eq!(found.status, SubscriptionStatus::Suspended);
    }
}
