use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
  #[sea_orm(string_value = "active")]
  Active,
  #[sea_orm(string_value = "expired")]
  Expired,
}

impl SubscriptionStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Expired => "expired",
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: i32,
  pub plan_id: i32,
  pub start_date: DateTime,
  pub end_date: DateTime,
  pub status: SubscriptionStatus,
}

impl Model {
  /// Whole days left until `end_date`, never negative.
  pub fn remaining_days(&self, now: DateTime) -> i64 {
    (self.end_date - now).num_days().max(0)
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::user::Entity",
    from = "Column::UserId",
    to = "super::user::Column::Id"
  )]
  User,
  #[sea_orm(
    belongs_to = "super::plan::Entity",
    from = "Column::PlanId",
    to = "super::plan::Column::Id"
  )]
  Plan,
}

impl Related<super::user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<super::plan::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Plan.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
