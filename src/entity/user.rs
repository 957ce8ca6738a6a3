use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::subscription::Entity")]
  Subscriptions,
  #[sea_orm(has_one = "super::credential::Entity")]
  Credential,
}

impl Related<super::subscription::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Subscriptions.def()
  }
}

impl Related<super::credential::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Credential.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
