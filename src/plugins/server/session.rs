//! Cookie-backed sessions and the login/admin gates.

use std::sync::Arc;

use axum::{
  extract::{FromRequestParts, Request, State},
  http::request::Parts,
  middleware::Next,
  response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};

use crate::{
  prelude::*,
  state::{AppState, Flash, Level, SessionUser},
};

pub const COOKIE: &str = "sid";

#[derive(Debug, Clone)]
struct SessionId(String);

fn cookie(app: &AppState, id: String) -> Cookie<'static> {
  Cookie::build((COOKIE, id))
    .path("/")
    .http_only(true)
    .secure(app.config.cookie_secure)
    .same_site(SameSite::Lax)
    .build()
}

/// Resolves the `sid` cookie to a live session. Visitors without one get a
/// provisional id, and the cookie is only sent once the handler stored
/// something under it.
pub async fn layer(
  State(app): State<Arc<AppState>>,
  jar: CookieJar,
  mut req: Request,
  next: Next,
) -> Response {
  let current = jar.get(COOKIE).map(|c| c.value().to_string());
  let resumed = app.resume_session(current.as_deref());
  let fresh = resumed.is_none();
  let id = resumed.unwrap_or_else(AppState::new_session_id);

  req.extensions_mut().insert(SessionId(id.clone()));
  let res = next.run(req).await;

  if fresh && app.sessions.contains_key(&id) {
    (jar.add(cookie(&app, id)), res).into_response()
  } else {
    res
  }
}

#[derive(Clone)]
pub struct Session {
  id: String,
  app: Arc<AppState>,
}

impl Session {
  pub fn user(&self) -> Option<SessionUser> {
    self.app.session_user(&self.id)
  }

  pub fn login(&self, user: SessionUser) {
    self.app.login(&self.id, user);
  }

  pub fn logout(&self) {
    self.app.logout(&self.id);
  }

  pub fn info(&self, text: impl Into<String>) {
    self.app.flash(&self.id, Level::Info, text);
  }

  pub fn error(&self, text: impl Into<String>) {
    self.app.flash(&self.id, Level::Error, text);
  }

  pub fn fail(&self, err: &Error) {
    self.error(err.public_message());
  }

  pub fn take_flash(&self) -> Vec<Flash> {
    self.app.take_flash(&self.id)
  }
}

impl FromRequestParts<Arc<AppState>> for Session {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let SessionId(id) = parts
      .extensions
      .get::<SessionId>()
      .cloned()
      .ok_or_else(|| Error::Internal("session layer is not installed".into()))?;

    Ok(Self { id, app: app.clone() })
  }
}

/// A logged-in visitor. Anonymous requests are sent to `/login`.
pub struct CurrentUser {
  pub session: Session,
  pub user: SessionUser,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
  type Rejection = Response;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self, Response> {
    let session = Session::from_request_parts(parts, app)
      .await
      .map_err(IntoResponse::into_response)?;

    match session.user() {
      Some(user) => Ok(Self { session, user }),
      None => Err(Redirect::to("/login").into_response()),
    }
  }
}

/// The configured superuser. Everyone else is sent to `/login`.
pub struct Admin(pub CurrentUser);

impl FromRequestParts<Arc<AppState>> for Admin {
  type Rejection = Response;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self, Response> {
    let current = CurrentUser::from_request_parts(parts, app).await?;

    if current.user.is_admin && app.config.is_admin(&current.user.email) {
      Ok(Self(current))
    } else {
      warn!("User #{} denied admin access", current.user.id);
      Err(Redirect::to("/login").into_response())
    }
  }
}
