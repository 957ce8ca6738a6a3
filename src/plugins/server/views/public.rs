use crate::{
  entity::{plan, server},
  prelude::*,
};

pub const FAQ: [(&str, &str); 6] = [
  (
    "What is V2Ray?",
    "V2Ray is a platform for building proxies to help you bypass internet \
     restrictions and protect your privacy.",
  ),
  (
    "How do I use the V2Ray config?",
    "Download the config from your dashboard or scan its QR code with a V2Ray \
     client like V2RayN (Windows), V2RayNG (Android), or V2RayX (macOS).",
  ),
  (
    "What payment methods do you accept?",
    "We accept bank transfers. Upload your payment slip and an administrator \
     will activate your subscription after review.",
  ),
  (
    "Can I cancel my subscription?",
    "Subscriptions are prepaid and expire at the end of the billing period. \
     No cancellation needed.",
  ),
  (
    "Is my data secure?",
    "Yes, we use industry-standard encryption and do not log your internet \
     activity.",
  ),
  (
    "What happens when my subscription expires?",
    "Your config will stop working. You can renew at any time to continue \
     using the service.",
  ),
];

pub fn index() -> String {
  "<div class=\"card\"><h1>Fast, private V2Ray access</h1>\
   <p>Pick a plan, pay by bank transfer and get your connection config as a \
   QR code, a share link or a JSON file.</p>\
   <p><a href=\"/pricing\">See pricing</a> · <a href=\"/auth#register\">Create \
   an account</a></p></div>"
    .to_string()
}

pub fn pricing(plans: &[plan::Model]) -> String {
  let cards: String = plans
    .iter()
    .map(|plan| {
      format!(
        "<div class=\"card\"><h3>{name}</h3><p><b>{price}</b></p>\
         <p>{days} days of access</p>\
         <a href=\"/subscribe/{id}\">Subscribe</a></div>",
        name = utils::escape(&plan.name),
        price = utils::format_price(plan.price),
        days = plan.duration_days,
        id = plan.id,
      )
    })
    .collect();

  if cards.is_empty() {
    return "<h1>Pricing</h1><p>No plans available right now.</p>".into();
  }
  format!("<h1>Pricing</h1><div class=\"plans\">{cards}</div>")
}

pub fn servers(servers: &[server::Model]) -> String {
  let rows: String = servers
    .iter()
    .map(|s| {
      format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        utils::escape(&s.name),
        utils::escape(&s.country),
        utils::escape(&s.city),
        s.status.as_str(),
      )
    })
    .collect();

  format!(
    "<h1>Server locations</h1><table><tr><th>Name</th><th>Country</th>\
     <th>City</th><th>Status</th></tr>{rows}</table>"
  )
}

pub fn faq() -> String {
  let items: String = FAQ
    .iter()
    .map(|(q, a)| format!("<div class=\"card\"><h3>{q}</h3><p>{a}</p></div>"))
    .collect();
  format!("<h1>Frequently asked questions</h1>{items}")
}

pub fn contact() -> String {
  "<div class=\"card\"><h1>Contact</h1><p>Questions about a payment or your \
   config? Write to support and include the email you registered with.</p>\
   </div>"
    .to_string()
}

pub fn auth() -> String {
  "<div class=\"plans\">\
   <div class=\"card\" id=\"login\"><h2>Login</h2>\
   <form method=\"post\" action=\"/login\">\
   <p><input type=\"email\" name=\"email\" placeholder=\"Email\" required></p>\
   <p><input type=\"password\" name=\"password\" placeholder=\"Password\" required></p>\
   <button type=\"submit\">Login</button></form></div>\
   <div class=\"card\" id=\"register\"><h2>Register</h2>\
   <form method=\"post\" action=\"/register\">\
   <p><input type=\"email\" name=\"email\" placeholder=\"Email\" required></p>\
   <p><input type=\"password\" name=\"password\" placeholder=\"Password\" minlength=\"6\" required></p>\
   <p><input type=\"password\" name=\"confirm_password\" placeholder=\"Confirm password\" required></p>\
   <button type=\"submit\">Create account</button></form></div></div>"
    .to_string()
}
