pub use std::{collections::HashMap, time::Duration};

pub use anyhow::Context;
pub use chrono::{NaiveDateTime as DateTime, TimeDelta, Utc};
pub use dashmap::DashMap;
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection,
  EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder, Set,
  TransactionTrait,
};
pub use migration::MigratorTrait;
pub use tokio::time;
pub use tracing::{debug, error, info, warn};

pub use crate::error::{Error, Result};
pub(crate) use crate::utils;

pub fn now() -> DateTime {
  Utc::now().naive_utc()
}
