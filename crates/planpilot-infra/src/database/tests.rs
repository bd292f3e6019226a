#[cfg(test)]
mod tests {
    use crate::database::entity::subscription;
    use crate::database::postgres_repo::PostgresSubscriptionRepository;
    use planpilot_core::domain::{PlanId, SubscriptionRecord, SubscriptionStatus};
    use planpilot_core::ports::SubscriptionRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_subscription_by_user() {
        let now = chrono::Utc::now();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![subscription::Model {
                user_id: "user_2abc".to_owned(),
                plan_id: "pro".to_owned(),
                status: "past_due".to_owned(),
                provider_subscription_id: Some("I-BW452GLLEP1G".to_owned()),
                current_period_end: None,
                updated_at: now.into(),
            }]])
            .into_connection();

        let repo = PostgresSubscriptionRepository::new(db);

        let record = repo.find_by_user("user_2abc").await.unwrap().unwrap();

        assert_eq!(record.plan_id, PlanId::pro());
        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert_eq!(record.provider_subscription_id.as_deref(), Some("I-BW452GLLEP1G"));
    }

    #[tokio::test]
    async fn test_find_missing_subscription() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<subscription::Model>::new()])
            .into_connection();

        let repo = PostgresSubscriptionRepository::new(db);

        assert!(repo.find_by_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_subscription() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let repo = PostgresSubscriptionRepository::new(db);
        let record = SubscriptionRecord::new("user_2abc", PlanId::pro(), SubscriptionStatus::Active);

        let stored = repo.upsert(record.clone()).await.unwrap();
        assert_eq!(stored, record);
    }
}
