use std::sync::Arc;

use axum::{
  Form,
  extract::State,
  response::{Html, Redirect},
};
use serde::Deserialize;

use super::{handlers::page, session::Session, views::public};
use crate::{
  prelude::*,
  state::{AppState, SessionUser},
};

pub async fn auth(session: Session) -> Html<String> {
  page(&session, "Login / Register", &public::auth())
}

pub async fn login_page() -> Redirect {
  Redirect::to("/auth#login")
}

pub async fn register_page() -> Redirect {
  Redirect::to("/auth#register")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
  pub email: String,
  pub password: String,
  pub confirm_password: String,
}

pub async fn register(
  State(app): State<Arc<AppState>>,
  session: Session,
  Form(form): Form<RegisterForm>,
) -> Redirect {
  if form.password != form.confirm_password {
    session.fail(&Error::PasswordMismatch);
    return Redirect::to("/auth#register");
  }

  match app.sv().user.register(&form.email, &form.password).await {
    Ok(_) => {
      session.info("Registration successful");
      Redirect::to("/auth#login")
    }
    Err(err) => {
      debug!("Registration refused: {err}");
      session.fail(&err);
      Redirect::to("/auth#register")
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
  pub email: String,
  pub password: String,
}

pub async fn login(
  State(app): State<Arc<AppState>>,
  session: Session,
  Form(form): Form<LoginForm>,
) -> Redirect {
  let user = match app.sv().user.authenticate(&form.email, &form.password).await
  {
    Ok(user) => user,
    Err(err) => {
      session.fail(&err);
      return Redirect::to("/auth#login");
    }
  };

  let is_admin = app.config.is_admin(&user.email);
  info!("User #{} logged in", user.id);
  session.login(SessionUser { id: user.id, email: user.email, is_admin });

  Redirect::to(if is_admin { "/admin" } else { "/dashboard" })
}

pub async fn logout(session: Session) -> Redirect {
  session.logout();
  Redirect::to("/")
}
