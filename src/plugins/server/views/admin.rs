use super::option_text;
use crate::{
  entity::{PaymentStatus, ServerStatus, plan, server},
  prelude::*,
  sv::{payment::Entry, subscription::Listing, user::Overview},
};

fn plan_options(plans: &[plan::Model]) -> String {
  plans
    .iter()
    .map(|p| format!("<option value=\"{}\">{}</option>", p.id, utils::escape(&p.name)))
    .collect()
}

fn users_table(users: &[Overview], plans: &[plan::Model]) -> String {
  let options = plan_options(plans);

  let rows: String = users
    .iter()
    .map(|row| {
      let u = &row.user;
      format!(
        "<tr><td>{id}</td><td>{email}</td><td>{active}</td><td>{plan}</td>\
         <td>{end}</td><td>{created}</td><td>\
         <a href=\"/admin/users/toggle/{id}\">{toggle}</a> · \
         <a href=\"/admin/users/config/{id}\">issue config</a>\
         <form method=\"post\" action=\"/admin/users/assign/{id}\">\
         <select name=\"plan_id\">{options}</select>\
         <button type=\"submit\">Assign</button></form></td></tr>",
        id = u.id,
        email = utils::escape(&u.email),
        active = if u.is_active { "active" } else { "disabled" },
        plan = option_text(row.plan.as_ref().map(|p| p.name.as_str())),
        end = row
          .subscription
          .as_ref()
          .map(|s| utils::format_date(s.end_date))
          .unwrap_or_else(|| "-".into()),
        created = utils::format_date(u.created_at),
        toggle = if u.is_active { "disable" } else { "enable" },
      )
    })
    .collect();

  format!(
    "<h2>Users</h2><table><tr><th>#</th><th>Email</th><th>Status</th>\
     <th>Plan</th><th>Ends</th><th>Registered</th><th>Actions</th></tr>\
     {rows}</table>"
  )
}

fn plans_table(plans: &[plan::Model]) -> String {
  let rows: String = plans
    .iter()
    .map(|p| {
      format!(
        "<tr><td>{id}</td><td colspan=\"4\">\
         <form method=\"post\" action=\"/admin/plans/update/{id}\">\
         <input name=\"name\" value=\"{name}\" required>\
         <input name=\"price\" type=\"number\" step=\"0.01\" min=\"0\" value=\"{price}\" required>\
         <input name=\"duration_days\" type=\"number\" min=\"1\" value=\"{days}\" required>\
         <button type=\"submit\">Save</button></form></td>\
         <td><a href=\"/admin/plans/delete/{id}\">delete</a></td></tr>",
        id = p.id,
        name = utils::escape(&p.name),
        price = p.price,
        days = p.duration_days,
      )
    })
    .collect();

  format!(
    "<h2>Plans</h2><table><tr><th>#</th><th colspan=\"4\">Name / price / days</th>\
     <th></th></tr>{rows}</table>\
     <div class=\"card\"><h3>New plan</h3>\
     <form method=\"post\" action=\"/admin/plans/create\">\
     <input name=\"name\" placeholder=\"Name\" required>\
     <input name=\"price\" type=\"number\" step=\"0.01\" min=\"0\" placeholder=\"Price\" required>\
     <input name=\"duration_days\" type=\"number\" min=\"1\" placeholder=\"Days\" required>\
     <button type=\"submit\">Create</button></form></div>"
  )
}

fn subscriptions_table(subs: &[Listing]) -> String {
  let rows: String = subs
    .iter()
    .map(|row| {
      let s = &row.subscription;
      format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        s.id,
        utils::escape(&row.email),
        option_text(row.plan.as_ref().map(|p| p.name.as_str())),
        utils::format_date(s.start_date),
        utils::format_date(s.end_date),
        s.status.as_str(),
      )
    })
    .collect();

  format!(
    "<h2>Subscriptions</h2><table><tr><th>#</th><th>User</th><th>Plan</th>\
     <th>Start</th><th>End</th><th>Status</th></tr>{rows}</table>"
  )
}

pub fn dashboard(
  users: &[Overview],
  plans: &[plan::Model],
  subs: &[Listing],
) -> String {
  format!(
    "<h1>Admin</h1>{}{}{}",
    users_table(users, plans),
    plans_table(plans),
    subscriptions_table(subs)
  )
}

fn payment_rows(entries: &[Entry], actions: bool) -> String {
  entries
    .iter()
    .map(|entry| {
      let p = &entry.payment;
      let action = if actions && p.status == PaymentStatus::Pending {
        format!(
          "<a href=\"/admin/payments/approve/{id}\">approve</a> · \
           <a href=\"/admin/payments/reject/{id}\">reject</a>",
          id = p.id
        )
      } else {
        p.reviewed_at.map(utils::format_date).unwrap_or_default()
      };

      format!(
        "<tr><td>{id}</td><td>{email}</td><td>{plan}</td><td>{bank}</td>\
         <td>{tx}</td><td><a href=\"/admin/payments/view/{slip}\">slip</a></td>\
         <td>{submitted}</td><td>{status}</td><td>{action}</td></tr>",
        id = p.id,
        email = utils::escape(&entry.email),
        plan = entry
          .plan
          .as_ref()
          .map(|pl| format!("{} ({})", utils::escape(&pl.name), utils::format_price(pl.price)))
          .unwrap_or_default(),
        bank = utils::escape(&p.bank_name),
        tx = option_text(p.transaction_id.as_deref()),
        slip = utils::escape(&p.slip_filename),
        submitted = utils::format_date(p.submitted_at),
        status = p.status.as_str(),
      )
    })
    .collect()
}

const PAYMENT_HEADER: &str = "<tr><th>#</th><th>User</th><th>Plan</th>\
  <th>Bank</th><th>Transaction</th><th>Slip</th><th>Submitted</th>\
  <th>Status</th><th></th></tr>";

pub fn payments(pending: &[Entry], all: &[Entry]) -> String {
  format!(
    "<h1>Payments</h1><h2>Pending ({count})</h2><table>{PAYMENT_HEADER}{pending}</table>\
     <h2>All payments</h2><table>{PAYMENT_HEADER}{all}</table>",
    count = pending.len(),
    pending = payment_rows(pending, true),
    all = payment_rows(all, false),
  )
}

pub fn approve(entry: &Entry) -> String {
  let p = &entry.payment;
  format!(
    "<h1>Approve payment #{id}</h1><div class=\"card\">\
     <p>User: <b>{email}</b></p><p>Plan: {plan}</p>\
     <p>Bank: {bank} · Transaction: {tx}</p>\
     <p><a href=\"/admin/payments/view/{slip}\" target=\"_blank\">View slip</a></p>\
     <form method=\"post\" action=\"/admin/payments/approve/{id}\">\
     <p><input name=\"connection_url\" size=\"80\" placeholder=\"vless://...\" required></p>\
     <button type=\"submit\">Approve and activate</button></form>\
     <p><a href=\"/admin/payments/reject/{id}\">Reject instead</a></p></div>",
    id = p.id,
    email = utils::escape(&entry.email),
    plan = option_text(entry.plan.as_ref().map(|pl| pl.name.as_str())),
    bank = utils::escape(&p.bank_name),
    tx = option_text(p.transaction_id.as_deref()),
    slip = utils::escape(&p.slip_filename),
  )
}

fn status_options(current: ServerStatus) -> String {
  [ServerStatus::Online, ServerStatus::Offline, ServerStatus::Maintenance]
    .into_iter()
    .map(|s| {
      let selected = if s == current { " selected" } else { "" };
      format!("<option value=\"{0}\"{selected}>{0}</option>", s.as_str())
    })
    .collect()
}

pub fn servers(servers: &[server::Model]) -> String {
  let rows: String = servers
    .iter()
    .map(|s| {
      format!(
        "<tr><td>{id}</td><td>\
         <form method=\"post\" action=\"/admin/servers/update/{id}\">\
         <input name=\"name\" value=\"{name}\" required>\
         <input name=\"country\" value=\"{country}\" required>\
         <input name=\"city\" value=\"{city}\" required>\
         <select name=\"status\">{status}</select>\
         <input name=\"location_code\" value=\"{code}\" placeholder=\"Code\">\
         <button type=\"submit\">Save</button></form></td>\
         <td>{listed}</td><td><a href=\"/admin/servers/toggle/{id}\">{toggle}</a> · \
         <a href=\"/admin/servers/delete/{id}\">delete</a></td></tr>",
        id = s.id,
        name = utils::escape(&s.name),
        country = utils::escape(&s.country),
        city = utils::escape(&s.city),
        status = status_options(s.status),
        code = s.location_code.as_deref().map(utils::escape).unwrap_or_default(),
        listed = if s.is_active { "listed" } else { "hidden" },
        toggle = if s.is_active { "hide" } else { "show" },
      )
    })
    .collect();

  format!(
    "<h1>Servers</h1><table><tr><th>#</th><th>Details</th><th>Listing</th>\
     <th></th></tr>{rows}</table>\
     <div class=\"card\"><h3>New server</h3>\
     <form method=\"post\" action=\"/admin/servers/create\">\
     <input name=\"name\" placeholder=\"Name\" required>\
     <input name=\"country\" placeholder=\"Country\" required>\
     <input name=\"city\" placeholder=\"City\" required>\
     <select name=\"status\">{status}</select>\
     <input name=\"location_code\" placeholder=\"Code\">\
     <button type=\"submit\">Create</button></form></div>",
    status = status_options(ServerStatus::Online),
  )
}
