//! Manual bank-transfer payment submissions awaiting review

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  #[sea_orm(string_value = "pending")]
  Pending,
  #[sea_orm(string_value = "approved")]
  Approved,
  #[sea_orm(string_value = "rejected")]
  Rejected,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub user_id: i32,
  pub plan_id: i32,
  pub bank_name: String,
  pub account_number: String,
  pub transaction_id: Option<String>,
  /// File name of the uploaded proof inside the uploads directory
  pub slip_filename: String,
  pub status: PaymentStatus,
  pub submitted_at: DateTime,
  pub reviewed_at: Option<DateTime>,
  pub reviewed_by: Option<i32>,
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
