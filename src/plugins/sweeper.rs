//! Background housekeeping: subscription expiry and session cleanup.

use std::sync::Arc;

use async_trait::async_trait;

use super::Plugin;
use crate::{prelude::*, state::AppState};

/// Expires overdue subscriptions once at startup, then on
/// `expiry_interval` when one is configured.
pub struct Expiry;

pub async fn sweep(app: &AppState) -> Result<u64> {
  let expired = app.sv().subscription.expire_overdue().await?;
  if expired > 0 {
    info!("Expired {expired} overdue subscriptions");
  } else {
    debug!("No overdue subscriptions");
  }
  Ok(expired)
}

#[async_trait]
impl Plugin for Expiry {
  fn name(&self) -> &'static str {
    "expiry"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    sweep(&app).await.context("Startup expiry sweep failed")?;

    let Some(every) = app.config.expiry_interval else {
      info!("EXPIRY_SWEEP_INTERVAL not set, periodic expiry disabled");
      std::future::pending::<()>().await;
      return Ok(());
    };

    info!("Expiring subscriptions every {}", humantime::format_duration(every));
    let mut interval = time::interval(every);
    interval.tick().await;

    loop {
      interval.tick().await;
      if let Err(err) = sweep(&app).await {
        error!("Expiry sweep failed: {err}");
      }
    }
  }
}

/// Drops sessions idle for longer than `session_lifetime`.
pub struct Sessions;

#[async_trait]
impl Plugin for Sessions {
  fn name(&self) -> &'static str {
    "sessions"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = time::interval(Duration::from_secs(60));
    loop {
      interval.tick().await;
      let before = app.sessions.len();
      app.gc_sessions();
      let dropped = before.saturating_sub(app.sessions.len());
      if dropped > 0 {
        debug!("Dropped {dropped} idle sessions");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{entity::subscription, state::test_app};

  #[tokio::test]
  async fn sweep_reports_expired_count() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;
    let sv = app.sv();

    let user = sv.user.register("liam@example.com", "secret1").await.unwrap();
    let plan = sv.plan.all().await.unwrap().remove(0);
    let sub = sv.subscription.assign(user.id, plan.id).await.unwrap();

    assert_eq!(sweep(&app).await.unwrap(), 0);

    subscription::ActiveModel {
      end_date: Set(now() - TimeDelta::hours(1)),
      ..sub.into()
    }
    .update(&app.db)
    .await
    .unwrap();

    assert_eq!(sweep(&app).await.unwrap(), 1);
    assert!(sv.subscription.active_for(user.id).await.unwrap().is_none());
  }
}
