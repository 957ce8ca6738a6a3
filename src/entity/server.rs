use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
  #[sea_orm(string_value = "online")]
  Online,
  #[sea_orm(string_value = "offline")]
  Offline,
  #[sea_orm(string_value = "maintenance")]
  Maintenance,
}

impl ServerStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Online => "online",
      Self::Offline => "offline",
      Self::Maintenance => "maintenance",
    }
  }
}

impl FromStr for ServerStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "" | "online" => Ok(Self::Online),
      "offline" => Ok(Self::Offline),
      "maintenance" => Ok(Self::Maintenance),
      other => Err(format!("Unknown server status `{other}`")),
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "servers")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub name: String,
  pub country: String,
  pub city: String,
  pub status: ServerStatus,
  pub location_code: Option<String>,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
