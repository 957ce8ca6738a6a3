//! Server-rendered HTML. Every interpolated value that originates from a user
//! or the database goes through `utils::escape`.

pub mod admin;
pub mod public;
pub mod user;

use axum::response::Html;

use crate::{
  prelude::*,
  state::{Flash, Level, SessionUser},
};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#f5f6fa;color:#222}\
header{background:#1f2937;padding:12px 24px}\
header a{color:#e5e7eb;margin-right:16px;text-decoration:none}\
main{max-width:1100px;margin:24px auto;padding:0 16px}\
table{border-collapse:collapse;width:100%;background:#fff;margin-bottom:24px}\
th,td{border:1px solid #ddd;padding:6px 8px;text-align:left;font-size:14px}\
.card{background:#fff;border-radius:8px;padding:16px;margin-bottom:16px}\
.flash{padding:10px;border-radius:6px;margin-bottom:12px}\
.info{background:#dcfce7}.error{background:#fee2e2}\
.plans{display:flex;gap:16px;flex-wrap:wrap}\
.plans .card{flex:1;min-width:200px}\
code{word-break:break-all}";

pub struct Page<'a> {
  pub title: &'a str,
  pub user: Option<&'a SessionUser>,
  pub flash: &'a [Flash],
}

impl<'a> Page<'a> {
  pub fn new(title: &'a str) -> Self {
    Self { title, user: None, flash: &[] }
  }

  pub fn user(mut self, user: Option<&'a SessionUser>) -> Self {
    self.user = user;
    self
  }

  pub fn flash(mut self, flash: &'a [Flash]) -> Self {
    self.flash = flash;
    self
  }

  pub fn render(&self, body: &str) -> Html<String> {
    let nav = match self.user {
      Some(user) if user.is_admin => "\
        <a href=\"/admin\">Admin</a><a href=\"/admin/payments\">Payments</a>\
        <a href=\"/admin/servers\">Servers</a><a href=\"/logout\">Logout</a>",
      Some(_) => "\
        <a href=\"/dashboard\">Dashboard</a><a href=\"/payments\">Payments</a>\
        <a href=\"/logout\">Logout</a>",
      None => "<a href=\"/auth\">Login / Register</a>",
    };

    let flash: String = self
      .flash
      .iter()
      .map(|f| {
        let class = match f.level {
          Level::Info => "info",
          Level::Error => "error",
        };
        format!("<div class=\"flash {class}\">{}</div>", utils::escape(&f.text))
      })
      .collect();

    Html(format!(
      "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
       <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
       <title>{title} | VPN Service</title><style>{STYLE}</style></head>\
       <body><header><a href=\"/\"><b>VPN Service</b></a>\
       <a href=\"/pricing\">Pricing</a><a href=\"/servers\">Servers</a>\
       <a href=\"/faq\">FAQ</a><a href=\"/contact\">Contact</a>{nav}</header>\
       <main>{flash}{body}</main></body></html>",
      title = utils::escape(self.title),
    ))
  }
}

pub fn option_text(value: Option<&str>) -> String {
  value.map(utils::escape).unwrap_or_else(|| "-".to_string())
}
