use std::sync::Arc;

use axum::{
  extract::{Multipart, Path, State, multipart::MultipartError},
  http::header,
  response::{Html, IntoResponse, Redirect, Response},
};

use super::{
  handlers::{page, send_slip},
  session::CurrentUser,
  views::user::{self as view, Dashboard},
};
use crate::{
  entity::credential,
  prelude::*,
  share::{self, Vmess},
  state::AppState,
  sv::payment::Submission,
};

pub async fn dashboard(
  State(app): State<Arc<AppState>>,
  CurrentUser { session, user }: CurrentUser,
) -> Result<Html<String>> {
  let sv = app.sv();

  let subscription = sv.subscription.active_for(user.id).await?;
  let remaining_days = subscription
    .as_ref()
    .map(|(sub, _)| sub.remaining_days(now()))
    .unwrap_or(0);
  let credential = sv.credential.by_user(user.id).await?;
  let history = sv.subscription.by_user(user.id).await?;
  let payments = sv.payment.by_user(user.id).await?;

  let body = view::dashboard(&Dashboard {
    email: &user.email,
    subscription: subscription.as_ref(),
    remaining_days,
    credential: credential.as_ref(),
    history: &history,
    payments: &payments,
  });
  Ok(page(&session, "Dashboard", &body))
}

async fn own_credential(app: &AppState, user_id: i32) -> Result<credential::Model> {
  app.sv().credential.by_user(user_id).await?.ok_or(Error::CredentialNotFound)
}

pub async fn config_qr(
  State(app): State<Arc<AppState>>,
  CurrentUser { user, .. }: CurrentUser,
) -> Result<Response> {
  let cred = own_credential(&app, user.id).await?;
  let link = share::preferred_link(&cred, &user.email)?;
  let png = share::qr_png(&link)?;

  Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

fn vmess(cred: &credential::Model, email: &str) -> Result<Vmess> {
  Vmess::from_credential(cred, email).ok_or(Error::CredentialNotFound)
}

pub async fn config_vmess(
  State(app): State<Arc<AppState>>,
  CurrentUser { user, .. }: CurrentUser,
) -> Result<String> {
  let cred = own_credential(&app, user.id).await?;
  vmess(&cred, &user.email)?.to_link()
}

pub async fn config_download(
  State(app): State<Arc<AppState>>,
  CurrentUser { user, .. }: CurrentUser,
) -> Result<Response> {
  let cred = own_credential(&app, user.id).await?;
  let json = vmess(&cred, &user.email)?.to_pretty_json()?;

  let headers = [
    (header::CONTENT_TYPE, "application/json".to_string()),
    (
      header::CONTENT_DISPOSITION,
      format!("attachment; filename=\"{}\"", share::DOWNLOAD_NAME),
    ),
  ];
  Ok((headers, json).into_response())
}

pub async fn subscribe(
  State(app): State<Arc<AppState>>,
  Path(plan_id): Path<i32>,
  CurrentUser { session, .. }: CurrentUser,
) -> Result<Html<String>> {
  let plan = app.sv().plan.by_id(plan_id).await?.ok_or(Error::PlanNotFound)?;
  let body = view::subscribe(&plan, &app.config.bank);
  Ok(page(&session, &format!("Subscribe: {}", plan.name), &body))
}

#[derive(Debug, Default)]
struct PaymentForm {
  bank_name: String,
  transaction_id: Option<String>,
  slip_name: String,
  slip: Vec<u8>,
}

fn bad_upload(err: MultipartError) -> Error {
  Error::InvalidArgs(format!("Invalid upload: {}", err.body_text()))
}

async fn read_payment_form(mut multipart: Multipart) -> Result<PaymentForm> {
  let mut form = PaymentForm::default();

  while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
    let name = field.name().unwrap_or_default().to_string();
    match name.as_str() {
      "bank_name" => form.bank_name = field.text().await.map_err(bad_upload)?,
      "transaction_id" => {
        form.transaction_id = Some(field.text().await.map_err(bad_upload)?);
      }
      "payment_slip" => {
        form.slip_name = field.file_name().unwrap_or_default().to_string();
        form.slip = field.bytes().await.map_err(bad_upload)?.to_vec();
      }
      _ => {}
    }
  }

  Ok(form)
}

pub async fn submit_payment(
  State(app): State<Arc<AppState>>,
  Path(plan_id): Path<i32>,
  CurrentUser { session, user }: CurrentUser,
  multipart: Multipart,
) -> Result<Response> {
  if app.sv().plan.by_id(plan_id).await?.is_none() {
    return Err(Error::PlanNotFound);
  }
  let back = format!("/subscribe/{plan_id}");

  let form = match read_payment_form(multipart).await {
    Ok(form) => form,
    Err(err) => {
      session.fail(&err);
      return Ok(Redirect::to(&back).into_response());
    }
  };

  let submission = Submission {
    user_id: user.id,
    plan_id,
    bank_name: form.bank_name,
    transaction_id: form.transaction_id,
    slip_name: form.slip_name,
    slip: form.slip,
  };

  match app.sv().payment.submit(submission).await {
    Ok(_) => {
      session.info(
        "Payment submitted successfully! Admin will review and activate \
         your subscription soon.",
      );
      Ok(Redirect::to("/dashboard").into_response())
    }
    Err(err) => {
      warn!("Payment from user #{} refused: {err}", user.id);
      session.fail(&err);
      Ok(Redirect::to(&back).into_response())
    }
  }
}

pub async fn payments(
  State(app): State<Arc<AppState>>,
  CurrentUser { session, user }: CurrentUser,
) -> Result<Html<String>> {
  let payments = app.sv().payment.by_user(user.id).await?;
  Ok(page(&session, "Payments", &view::payments(&payments)))
}

/// Serves a slip only to the user who uploaded it.
pub async fn view_slip(
  State(app): State<Arc<AppState>>,
  Path(filename): Path<String>,
  CurrentUser { user, .. }: CurrentUser,
) -> Result<Response> {
  match app.sv().payment.by_slip(&filename).await? {
    Some(payment) if payment.user_id == user.id => {
      send_slip(&app, &filename).await
    }
    _ => {
      warn!("User #{} denied slip `{filename}`", user.id);
      Err(Error::Forbidden)
    }
  }
}
