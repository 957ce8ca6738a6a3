use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Plans::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Plans::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Plans::Name).string().not_null())
          .col(ColumnDef::new(Plans::Price).double().not_null())
          .col(ColumnDef::new(Plans::DurationDays).integer().not_null())
          .col(ColumnDef::new(Plans::IsActive).boolean().not_null().default(true))
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Plans::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Plans {
  Table,
  Id,
  Name,
  Price,
  DurationDays,
  IsActive,
}
