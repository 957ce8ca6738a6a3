mod account;
mod admin;
mod handlers;
pub mod session;
mod user;
mod views;

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{
  Router,
  extract::DefaultBodyLimit,
  middleware,
  routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::trace::TraceLayer;

use crate::{prelude::*, state::AppState};

pub struct Plugin;

/// Every route of the portal behind the session layer. Rate limiting and
/// tracing are added by [`Plugin`].
pub fn router(app: Arc<AppState>) -> Router {
  // Multipart framing needs some headroom over the slip itself.
  let body_limit = app.config.max_upload_bytes + 64 * 1024;

  Router::new()
    .route("/", get(handlers::index))
    .route("/pricing", get(handlers::pricing))
    .route("/servers", get(handlers::servers))
    .route("/faq", get(handlers::faq))
    .route("/contact", get(handlers::contact))
    .route("/health", get(handlers::health))
    .route("/cron/expire-subscriptions", get(handlers::expire_subscriptions))
    .route("/auth", get(account::auth))
    .route("/login", get(account::login_page).post(account::login))
    .route("/register", get(account::register_page).post(account::register))
    .route("/logout", get(account::logout).post(account::logout))
    .route("/dashboard", get(user::dashboard))
    .route("/config/qr", get(user::config_qr))
    .route("/config/vmess", get(user::config_vmess))
    .route("/config/download", get(user::config_download))
    .route("/subscribe/{plan_id}", get(user::subscribe))
    .route("/payment/submit/{plan_id}", post(user::submit_payment))
    .route("/payments", get(user::payments))
    .route("/payments/view/{filename}", get(user::view_slip))
    .route("/admin", get(admin::dashboard))
    .route("/admin/plans/create", post(admin::create_plan))
    .route("/admin/plans/update/{id}", post(admin::update_plan))
    .route("/admin/plans/delete/{id}", get(admin::delete_plan))
    .route("/admin/users/toggle/{id}", get(admin::toggle_user))
    .route("/admin/users/assign/{id}", post(admin::assign_plan))
    .route("/admin/users/config/{id}", get(admin::issue_config))
    .route("/admin/payments", get(admin::payments))
    .route(
      "/admin/payments/approve/{id}",
      get(admin::approve_page).post(admin::approve),
    )
    .route("/admin/payments/reject/{id}", get(admin::reject))
    .route("/admin/payments/view/{filename}", get(admin::view_slip))
    .route("/admin/servers", get(admin::servers))
    .route("/admin/servers/create", post(admin::create_server))
    .route("/admin/servers/update/{id}", post(admin::update_server))
    .route("/admin/servers/delete/{id}", get(admin::delete_server))
    .route("/admin/servers/toggle/{id}", get(admin::toggle_server))
    .layer(middleware::from_fn_with_state(app.clone(), session::layer))
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(app)
}

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "http"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));

    let router = router(app)
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf)),
      )
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {addr}");

    let limiter = async {
      loop {
        time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
          Ok(()) => info!("Server stopped gracefully"),
          Err(err) => error!("Server stopped with error: {err:#}"),
        }
        result
      }
      _ = limiter => {
        error!("Rate limiter cleaner stopped unexpectedly!");
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests;
