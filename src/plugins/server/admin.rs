use std::sync::Arc;

use axum::{
  Form,
  extract::{Path, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::{
  handlers::{page, send_slip},
  session::{Admin, CurrentUser, Session},
  views::admin as view,
};
use crate::{
  entity::ServerStatus,
  prelude::*,
  state::AppState,
  sv::{plan, server},
};

const HOME: &str = "/admin";
const PAYMENTS: &str = "/admin/payments";
const SERVERS: &str = "/admin/servers";

/// Flashes the outcome of an admin action and heads back to `to`.
fn report<T>(
  session: &Session,
  res: Result<T>,
  ok: impl FnOnce(T) -> String,
  to: &str,
) -> Redirect {
  match res {
    Ok(value) => session.info(ok(value)),
    Err(err) => {
      warn!("Admin action failed: {err}");
      session.fail(&err);
    }
  }
  Redirect::to(to)
}

pub async fn dashboard(
  State(app): State<Arc<AppState>>,
  Admin(CurrentUser { session, .. }): Admin,
) -> Result<Html<String>> {
  let sv = app.sv();
  let users = sv.user.overview().await?;
  let plans = sv.plan.all().await?;
  let subs = sv.subscription.all().await?;

  Ok(page(&session, "Admin", &view::dashboard(&users, &plans, &subs)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlanForm {
  pub name: String,
  pub price: String,
  pub duration_days: String,
}

impl PlanForm {
  fn draft(self) -> Result<plan::Draft> {
    let price = self
      .price
      .trim()
      .parse()
      .map_err(|_| Error::InvalidArgs("Price must be a number".into()))?;
    let duration_days = self
      .duration_days
      .trim()
      .parse()
      .map_err(|_| Error::InvalidArgs("Duration must be a whole number".into()))?;

    Ok(plan::Draft { name: self.name, price, duration_days })
  }
}

pub async fn create_plan(
  State(app): State<Arc<AppState>>,
  Admin(CurrentUser { session, .. }): Admin,
  Form(form): Form<PlanForm>,
) -> Redirect {
  let res = match form.draft() {
    Ok(draft) => app.sv().plan.create(draft).await,
    Err(err) => Err(err),
  };
  report(&session, res, |p| format!("Plan `{}` created", p.name), HOME)
}

pub async fn update_plan(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, .. }): Admin,
  Form(form): Form<PlanForm>,
) -> Redirect {
  let res = match form.draft() {
    Ok(draft) => app.sv().plan.update(id, draft).await,
    Err(err) => Err(err),
  };
  report(&session, res, |p| format!("Plan `{}` updated", p.name), HOME)
}

pub async fn delete_plan(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, .. }): Admin,
) -> Redirect {
  let res = app.sv().plan.delete(id).await;
  report(&session, res, |()| "Plan deleted".into(), HOME)
}

pub async fn toggle_user(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, .. }): Admin,
) -> Redirect {
  let res = app.sv().user.toggle_active(id).await;
  report(
    &session,
    res,
    |active| {
      if active { "User activated".into() } else { "User deactivated".into() }
    },
    HOME,
  )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssignForm {
  pub plan_id: String,
}

impl AssignForm {
  fn plan_id(&self) -> Result<i32> {
    self
      .plan_id
      .trim()
      .parse()
      .map_err(|_| Error::InvalidArgs("Please choose a plan".into()))
  }
}

pub async fn assign_plan(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, .. }): Admin,
  Form(form): Form<AssignForm>,
) -> Redirect {
  let res = match form.plan_id() {
    Ok(plan_id) => app.sv().credential.grant(id, plan_id).await,
    Err(err) => Err(err),
  };
  report(
    &session,
    res,
    |(sub, _)| {
      format!(
        "Subscription assigned until {}",
        utils::format_date(sub.end_date)
      )
    },
    HOME,
  )
}

pub async fn issue_config(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, .. }): Admin,
) -> Redirect {
  let res = app.sv().credential.issue(id).await;
  report(&session, res, |_| "V2Ray config generated successfully".into(), HOME)
}

pub async fn payments(
  State(app): State<Arc<AppState>>,
  Admin(CurrentUser { session, .. }): Admin,
) -> Result<Html<String>> {
  let sv = app.sv();
  let pending = sv.payment.pending().await?;
  let all = sv.payment.all().await?;

  Ok(page(&session, "Payments", &view::payments(&pending, &all)))
}

pub async fn approve_page(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, .. }): Admin,
) -> Result<Response> {
  match app.sv().payment.pending_entry(id).await {
    Ok(entry) => {
      let title = format!("Approve payment #{id}");
      Ok(page(&session, &title, &view::approve(&entry)).into_response())
    }
    Err(Error::PaymentNotPending) => {
      session.fail(&Error::PaymentNotPending);
      Ok(Redirect::to(PAYMENTS).into_response())
    }
    Err(err) => Err(err),
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApproveForm {
  pub connection_url: String,
}

pub async fn approve(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, user }): Admin,
  Form(form): Form<ApproveForm>,
) -> Redirect {
  let link = form.connection_url.trim();
  if link.is_empty() {
    session.error("Please provide a connection URL");
    return Redirect::to(PAYMENTS);
  }

  let res = app.sv().payment.approve(id, user.id, Some(link)).await;
  report(
    &session,
    res,
    |_| "Payment approved and subscription activated".into(),
    PAYMENTS,
  )
}

pub async fn reject(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, user }): Admin,
) -> Redirect {
  let res = app.sv().payment.reject(id, user.id).await;
  report(&session, res, |()| "Payment rejected".into(), PAYMENTS)
}

pub async fn view_slip(
  State(app): State<Arc<AppState>>,
  Path(filename): Path<String>,
  _: Admin,
) -> Result<Response> {
  send_slip(&app, &filename).await
}

pub async fn servers(
  State(app): State<Arc<AppState>>,
  Admin(CurrentUser { session, .. }): Admin,
) -> Result<Html<String>> {
  let servers = app.sv().server.all().await?;
  Ok(page(&session, "Servers", &view::servers(&servers)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerForm {
  pub name: String,
  pub country: String,
  pub city: String,
  pub status: String,
  pub location_code: String,
}

impl ServerForm {
  fn draft(self) -> Result<server::Draft> {
    let status: ServerStatus = self.status.parse().map_err(Error::InvalidArgs)?;
    Ok(server::Draft {
      name: self.name,
      country: self.country,
      city: self.city,
      status,
      location_code: Some(self.location_code),
    })
  }
}

pub async fn create_server(
  State(app): State<Arc<AppState>>,
  Admin(CurrentUser { session, .. }): Admin,
  Form(form): Form<ServerForm>,
) -> Redirect {
  let res = match form.draft() {
    Ok(draft) => app.sv().server.create(draft).await,
    Err(err) => Err(err),
  };
  report(&session, res, |s| format!("Server `{}` created", s.name), SERVERS)
}

pub async fn update_server(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, .. }): Admin,
  Form(form): Form<ServerForm>,
) -> Redirect {
  let res = match form.draft() {
    Ok(draft) => app.sv().server.update(id, draft).await,
    Err(err) => Err(err),
  };
  report(&session, res, |s| format!("Server `{}` updated", s.name), SERVERS)
}

pub async fn delete_server(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, .. }): Admin,
) -> Redirect {
  let res = app.sv().server.delete(id).await;
  report(&session, res, |()| "Server deleted".into(), SERVERS)
}

pub async fn toggle_server(
  State(app): State<Arc<AppState>>,
  Path(id): Path<i32>,
  Admin(CurrentUser { session, .. }): Admin,
) -> Redirect {
  let res = app.sv().server.toggle_active(id).await;
  report(
    &session,
    res,
    |active| {
      if active { "Server listed".into() } else { "Server hidden".into() }
    },
    SERVERS,
  )
}
