use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Credentials::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Credentials::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Credentials::UserId).integer().not_null())
          .col(ColumnDef::new(Credentials::Uuid).string().null())
          .col(ColumnDef::new(Credentials::Server).string().null())
          .col(ColumnDef::new(Credentials::Port).integer().null())
          .col(
            ColumnDef::new(Credentials::Protocol)
              .string()
              .not_null()
              .default("vmess"),
          )
          .col(ColumnDef::new(Credentials::Link).string().null())
          .col(ColumnDef::new(Credentials::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_credentials_user")
              .from(Credentials::Table, Credentials::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_credentials_user")
          .table(Credentials::Table)
          .col(Credentials::UserId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Credentials::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Credentials {
  Table,
  Id,
  UserId,
  Uuid,
  Server,
  Port,
  Protocol,
  Link,
  CreatedAt,
}
