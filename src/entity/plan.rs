use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plans")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  pub price: f64,
  /// Length of a subscription bought with this plan
  pub duration_days: i32,
  pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::subscription::Entity")]
  Subscriptions,
  #[sea_orm(has_many = "super::payment::Entity")]
  Payments,
}

impl Related<super::subscription::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Subscriptions.def()
  }
}

impl Related<super::payment::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Payments.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
