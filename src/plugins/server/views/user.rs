use super::option_text;
use crate::{
  entity::{PaymentStatus, credential, plan, subscription},
  prelude::*,
  state::BankDetails,
  sv::payment::Entry,
};

pub struct Dashboard<'a> {
  pub email: &'a str,
  pub subscription: Option<&'a (subscription::Model, Option<plan::Model>)>,
  pub remaining_days: i64,
  pub credential: Option<&'a credential::Model>,
  pub history: &'a [subscription::Model],
  pub payments: &'a [Entry],
}

fn status_badge(status: PaymentStatus) -> &'static str {
  match status {
    PaymentStatus::Pending => "⏳ pending",
    PaymentStatus::Approved => "✅ approved",
    PaymentStatus::Rejected => "❌ rejected",
  }
}

fn subscription_card(dash: &Dashboard) -> String {
  let Some((sub, plan)) = dash.subscription else {
    return "<div class=\"card\"><h2>No active subscription</h2>\
            <p><a href=\"/pricing\">Choose a plan</a> to get started.</p></div>"
      .to_string();
  };

  format!(
    "<div class=\"card\"><h2>{plan}</h2>\
     <p>Active until <b>{end}</b> ({days} days left)</p></div>",
    plan = plan.as_ref().map(|p| utils::escape(&p.name)).unwrap_or_default(),
    end = utils::format_date(sub.end_date),
    days = dash.remaining_days,
  )
}

fn credential_card(cred: Option<&credential::Model>) -> String {
  let Some(cred) = cred else {
    return "<div class=\"card\"><h2>Your config</h2>\
            <p>Your config appears here once a payment is approved.</p></div>"
      .to_string();
  };

  let mut links = String::from("<a href=\"/config/qr\">QR code</a>");
  if cred.uuid.is_some() {
    links.push_str(
      " · <a href=\"/config/vmess\">VMess link</a>\
       · <a href=\"/config/download\">Download JSON</a>",
    );
  }

  let link = cred
    .link
    .as_deref()
    .map(|link| format!("<p>Connection URL: <code>{}</code></p>", utils::escape(link)))
    .unwrap_or_default();

  format!(
    "<div class=\"card\"><h2>Your config</h2>\
     <p>Protocol: <b>{protocol:?}</b> · Server: {server} · Port: {port}</p>\
     {link}<p><img src=\"/config/qr\" alt=\"QR code\" width=\"220\"></p>\
     <p>{links}</p></div>",
    protocol = cred.protocol,
    server = option_text(cred.server.as_deref()),
    port = cred.port.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
  )
}

fn history_table(history: &[subscription::Model]) -> String {
  if history.is_empty() {
    return String::new();
  }

  let rows: String = history
    .iter()
    .map(|sub| {
      format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
        utils::format_date(sub.start_date),
        utils::format_date(sub.end_date),
        sub.status.as_str(),
      )
    })
    .collect();

  format!(
    "<h2>Subscription history</h2><table><tr><th>Start</th><th>End</th>\
     <th>Status</th></tr>{rows}</table>"
  )
}

pub fn payments_table(payments: &[Entry]) -> String {
  if payments.is_empty() {
    return "<p>No payments submitted yet.</p>".to_string();
  }

  let rows: String = payments
    .iter()
    .map(|entry| {
      let p = &entry.payment;
      format!(
        "<tr><td>{id}</td><td>{plan}</td><td>{bank}</td><td>{tx}</td>\
         <td>{submitted}</td><td>{status}</td>\
         <td><a href=\"/payments/view/{slip}\">slip</a></td></tr>",
        id = p.id,
        plan = entry.plan.as_ref().map(|p| utils::escape(&p.name)).unwrap_or_default(),
        bank = utils::escape(&p.bank_name),
        tx = option_text(p.transaction_id.as_deref()),
        submitted = utils::format_date(p.submitted_at),
        status = status_badge(p.status),
        slip = utils::escape(&p.slip_filename),
      )
    })
    .collect();

  format!(
    "<table><tr><th>#</th><th>Plan</th><th>Bank</th><th>Transaction</th>\
     <th>Submitted</th><th>Status</th><th></th></tr>{rows}</table>"
  )
}

pub fn dashboard(dash: &Dashboard) -> String {
  let pending = dash
    .payments
    .iter()
    .filter(|e| e.payment.status == PaymentStatus::Pending)
    .count();
  let pending = if pending > 0 {
    format!(
      "<div class=\"card\">{pending} payment(s) awaiting review by an \
       administrator.</div>"
    )
  } else {
    String::new()
  };

  format!(
    "<h1>Dashboard</h1><p>Signed in as {email}</p>{pending}{sub}{cred}\
     <h2>Payments</h2>{payments}{history}",
    email = utils::escape(dash.email),
    sub = subscription_card(dash),
    cred = credential_card(dash.credential),
    payments = payments_table(dash.payments),
    history = history_table(dash.history),
  )
}

pub fn payments(payments: &[Entry]) -> String {
  format!("<h1>Payment history</h1>{}", payments_table(payments))
}

pub fn subscribe(plan: &plan::Model, bank: &BankDetails) -> String {
  format!(
    "<h1>Subscribe: {name}</h1>\
     <div class=\"card\"><p>Amount: <b>{price}</b> for {days} days</p>\
     <h3>Transfer to</h3><table>\
     <tr><th>Bank</th><td>{bank_name}</td></tr>\
     <tr><th>Account number</th><td>{account}</td></tr>\
     <tr><th>Account holder</th><td>{holder}</td></tr>\
     <tr><th>SWIFT</th><td>{swift}</td></tr></table></div>\
     <div class=\"card\"><h3>Submit payment proof</h3>\
     <form method=\"post\" action=\"/payment/submit/{id}\" enctype=\"multipart/form-data\">\
     <p><input name=\"bank_name\" placeholder=\"Bank you paid from\" required></p>\
     <p><input name=\"transaction_id\" placeholder=\"Transaction ID (optional)\"></p>\
     <p><input type=\"file\" name=\"payment_slip\" accept=\".png,.jpg,.jpeg,.pdf,.gif\" required></p>\
     <button type=\"submit\">Submit payment</button></form></div>",
    name = utils::escape(&plan.name),
    price = utils::format_price(plan.price),
    days = plan.duration_days,
    bank_name = utils::escape(&bank.bank_name),
    account = utils::escape(&bank.account_number),
    holder = utils::escape(&bank.account_holder),
    swift = utils::escape(&bank.swift_code),
    id = plan.id,
  )
}
