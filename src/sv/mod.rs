pub mod credential;
pub mod payment;
pub mod plan;
pub mod server;
pub mod subscription;
pub mod user;

pub use credential::Credential;
pub use payment::Payment;
pub use plan::Plan;
pub use server::Server;
pub use subscription::Subscription;
pub use user::User;

#[cfg(test)]
pub(crate) async fn test_db() -> sea_orm::DatabaseConnection {
  use migration::{Migrator, MigratorTrait};

  // One connection, or every pooled connection gets its own empty database.
  let mut opts = sea_orm::ConnectOptions::new("sqlite::memory:");
  opts.max_connections(1).sqlx_logging(false);

  let db = sea_orm::Database::connect(opts).await.unwrap();
  Migrator::up(&db, None).await.unwrap();
  db
}
