//! Subscription entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use planpilot_core::domain::{PlanId, SubscriptionRecord, SubscriptionStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub plan_id: String,
    pub status: String,
    pub provider_subscription_id: Option<String>,
    pub current_period_end: Option<DateTimeWithTimeZone>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to domain record.
impl From<Model> for SubscriptionRecord {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            plan_id: PlanId::new(model.plan_id),
            status: model
                .status
                .parse::<SubscriptionStatus>()
                .unwrap_or_default(),
            provider_subscription_id: model.provider_subscription_id,
            current_period_end: model.current_period_end.map(Into::into),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from domain record to SeaORM ActiveModel.
impl From<SubscriptionRecord> for ActiveModel {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            user_id: Set(record.user_id),
            plan_id: Set(record.plan_id.to_string()),
            status: Set(record.status.as_str().to_string()),
            provider_subscription_id: Set(record.provider_subscription_id),
            current_period_end: Set(record.current_period_end.map(Into::into)),
            updated_at: Set(record.updated_at.into()),
        }
    }
}
