//! Schema migrations for the portal database

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_plans;
mod m20260301_000003_create_servers;
mod m20260301_000004_create_subscriptions;
mod m20260301_000005_create_credentials;
mod m20260301_000006_create_payments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_000001_create_users::Migration),
      Box::new(m20260301_000002_create_plans::Migration),
      Box::new(m20260301_000003_create_servers::Migration),
      Box::new(m20260301_000004_create_subscriptions::Migration),
      Box::new(m20260301_000005_create_credentials::Migration),
      Box::new(m20260301_000006_create_payments::Migration),
    ]
  }
}
