use sea_orm_migration::prelude::*;

use super::{
  m20260301_000001_create_users::Users, m20260301_000002_create_plans::Plans,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Subscriptions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Subscriptions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Subscriptions::UserId).integer().not_null())
          .col(ColumnDef::new(Subscriptions::PlanId).integer().not_null())
          .col(ColumnDef::new(Subscriptions::StartDate).date_time().not_null())
          .col(ColumnDef::new(Subscriptions::EndDate).date_time().not_null())
          .col(
            ColumnDef::new(Subscriptions::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_subscriptions_user")
              .from(Subscriptions::Table, Subscriptions::UserId)
              .to(Users::Table, Users::Id),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_subscriptions_plan")
              .from(Subscriptions::Table, Subscriptions::PlanId)
              .to(Plans::Table, Plans::Id),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_subscriptions_user_status")
          .table(Subscriptions::Table)
          .col(Subscriptions::UserId)
          .col(Subscriptions::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Subscriptions {
  Table,
  Id,
  UserId,
  PlanId,
  StartDate,
  EndDate,
  Status,
}
