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
          .table(Payments::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Payments::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Payments::UserId).integer().not_null())
          .col(ColumnDef::new(Payments::PlanId).integer().not_null())
          .col(ColumnDef::new(Payments::BankName).string().not_null())
          .col(ColumnDef::new(Payments::AccountNumber).string().not_null())
          .col(ColumnDef::new(Payments::TransactionId).string().null())
          .col(ColumnDef::new(Payments::SlipFilename).string().not_null())
          .col(
            ColumnDef::new(Payments::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Payments::SubmittedAt).date_time().not_null())
          .col(ColumnDef::new(Payments::ReviewedAt).date_time().null())
          .col(ColumnDef::new(Payments::ReviewedBy).integer().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_payments_user")
              .from(Payments::Table, Payments::UserId)
              .to(Users::Table, Users::Id),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_payments_plan")
              .from(Payments::Table, Payments::PlanId)
              .to(Plans::Table, Plans::Id),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_payments_reviewer")
              .from(Payments::Table, Payments::ReviewedBy)
              .to(Users::Table, Users::Id),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_payments_status")
          .table(Payments::Table)
          .col(Payments::Status)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_payments_slip")
          .table(Payments::Table)
          .col(Payments::SlipFilename)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Payments::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Payments {
  Table,
  Id,
  UserId,
  PlanId,
  BankName,
  AccountNumber,
  TransactionId,
  SlipFilename,
  Status,
  SubmittedAt,
  ReviewedAt,
  ReviewedBy,
}
