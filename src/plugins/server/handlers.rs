use std::sync::Arc;

use axum::{
  Json,
  body::Body,
  extract::State,
  http::header,
  response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tokio_util::io::ReaderStream;

use super::{
  session::Session,
  views::{Page, public},
};
use crate::{plugins::sweeper, prelude::*, state::AppState};

/// Wraps `body` in the site layout, draining pending flash messages.
pub fn page(session: &Session, title: &str, body: &str) -> Html<String> {
  let user = session.user();
  let flash = session.take_flash();
  Page::new(title).user(user.as_ref()).flash(&flash).render(body)
}

pub async fn index(session: Session) -> Html<String> {
  page(&session, "Home", &public::index())
}

pub async fn pricing(
  State(app): State<Arc<AppState>>,
  session: Session,
) -> Result<Html<String>> {
  let plans = app.sv().plan.active().await?;
  Ok(page(&session, "Pricing", &public::pricing(&plans)))
}

pub async fn servers(
  State(app): State<Arc<AppState>>,
  session: Session,
) -> Result<Html<String>> {
  let servers = app.sv().server.active().await?;
  Ok(page(&session, "Servers", &public::servers(&servers)))
}

pub async fn faq(session: Session) -> Html<String> {
  page(&session, "FAQ", &public::faq())
}

pub async fn contact(session: Session) -> Html<String> {
  page(&session, "Contact", &public::contact())
}

pub async fn health() -> &'static str {
  "OK"
}

#[derive(Debug, Serialize)]
pub struct SweepRes {
  pub status: &'static str,
  pub message: &'static str,
  pub expired: u64,
}

pub async fn expire_subscriptions(
  State(app): State<Arc<AppState>>,
) -> Result<Json<SweepRes>> {
  let expired = sweeper::sweep(&app).await?;
  Ok(Json(SweepRes {
    status: "success",
    message: "Subscriptions checked and expired",
    expired,
  }))
}

/// Streams a stored payment slip with a content type guessed from its name.
pub async fn send_slip(app: &AppState, filename: &str) -> Result<Response> {
  let path =
    app.sv().payment.slip_path(filename).ok_or(Error::FileNotFound)?;

  let file = match tokio::fs::File::open(&path).await {
    Ok(file) => file,
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      return Err(Error::FileNotFound);
    }
    Err(err) => return Err(err.into()),
  };

  let mime = mime_guess::from_path(&path).first_or_octet_stream();
  let body = Body::from_stream(ReaderStream::new(file));

  Ok(([(header::CONTENT_TYPE, mime.to_string())], body).into_response())
}
