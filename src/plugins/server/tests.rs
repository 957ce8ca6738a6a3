use axum::{
  body::{Body, to_bytes},
  http::{Request, StatusCode, header},
  response::Response,
};
use tempfile::TempDir;
use tower::ServiceExt;

use super::*;
use crate::{
  entity::{PaymentStatus, Protocol, ServerStatus},
  state::test_app,
  sv::payment::Submission,
};

struct Harness {
  app: Arc<AppState>,
  router: Router,
  _uploads: TempDir,
}

async fn harness() -> Harness {
  let uploads = tempfile::tempdir().unwrap();
  let app = Arc::new(test_app(uploads.path()).await);
  Harness { router: router(app.clone()), app, _uploads: uploads }
}

fn location(res: &Response) -> &str {
  res.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

async fn text(res: Response) -> String {
  let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

fn encode(value: &str) -> String {
  value.replace('%', "%25").replace('@', "%40").replace('&', "%26")
}

impl Harness {
  async fn send(&self, req: Request<Body>) -> Response {
    self.router.clone().oneshot(req).await.unwrap()
  }

  async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
    let mut req = Request::get(uri);
    if let Some(cookie) = cookie {
      req = req.header(header::COOKIE, cookie);
    }
    self.send(req.body(Body::empty()).unwrap()).await
  }

  async fn post_form(
    &self,
    uri: &str,
    cookie: Option<&str>,
    form: &[(&str, &str)],
  ) -> Response {
    let body = form
      .iter()
      .map(|(k, v)| format!("{k}={}", encode(v)))
      .collect::<Vec<_>>()
      .join("&");

    let mut req = Request::post(uri)
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
      req = req.header(header::COOKIE, cookie);
    }
    self.send(req.body(Body::from(body)).unwrap()).await
  }

  /// Logs in through the form and returns the session cookie pair.
  async fn login(&self, email: &str, password: &str) -> (String, Response) {
    let res = self
      .post_form("/login", None, &[("email", email), ("password", password)])
      .await;
    let cookie = res
      .headers()
      .get(header::SET_COOKIE)
      .unwrap()
      .to_str()
      .unwrap()
      .split(';')
      .next()
      .unwrap()
      .to_string();
    (cookie, res)
  }
}

#[tokio::test]
async fn health_is_ok() {
  let h = harness().await;
  let res = h.get("/health", None).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(text(res).await, "OK");
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login() {
  let h = harness().await;

  for uri in ["/dashboard", "/config/qr", "/payments", "/admin"] {
    let res = h.get(uri, None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
    assert_eq!(location(&res), "/login");
  }

  let res = h.get("/login", None).await;
  assert_eq!(location(&res), "/auth#login");
}

#[tokio::test]
async fn sessions_open_on_first_write() {
  let h = harness().await;

  for _ in 0..50 {
    let res = h.get("/health", None).await;
    assert!(res.headers().get(header::SET_COOKIE).is_none());
  }
  for uri in ["/", "/pricing", "/cron/expire-subscriptions"] {
    let res = h.get(uri, None).await;
    assert!(res.headers().get(header::SET_COOKIE).is_none(), "{uri}");
  }
  let res = h.get("/health", Some("sid=forged")).await;
  assert!(res.headers().get(header::SET_COOKIE).is_none());
  assert!(h.app.sessions.is_empty());

  // a failed login carries a flash, so it is the first write
  let res = h
    .post_form("/login", None, &[("email", "x@y.z"), ("password", "nope")])
    .await;
  let cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
  assert!(cookie.starts_with("sid="));
  assert!(cookie.contains("HttpOnly"));
  assert_eq!(h.app.sessions.len(), 1);
}

#[tokio::test]
async fn logout_drops_the_session() {
  let h = harness().await;
  h.app.sv().user.register("lou@example.com", "secret1").await.unwrap();

  let (cookie, _) = h.login("lou@example.com", "secret1").await;
  assert_eq!(h.app.sessions.len(), 1);

  let res = h.get("/logout", Some(&cookie)).await;
  assert_eq!(location(&res), "/");
  assert!(h.app.sessions.is_empty());

  let res = h.get("/dashboard", Some(&cookie)).await;
  assert_eq!(location(&res), "/login");
}

#[tokio::test]
async fn register_login_and_dashboard() {
  let h = harness().await;

  let res = h
    .post_form(
      "/register",
      None,
      &[
        ("email", "nora@example.com"),
        ("password", "secret1"),
        ("confirm_password", "secret2"),
      ],
    )
    .await;
  assert_eq!(location(&res), "/auth#register");
  assert!(h.app.sv().user.by_email("nora@example.com").await.unwrap().is_none());

  let res = h
    .post_form(
      "/register",
      None,
      &[
        ("email", "nora@example.com"),
        ("password", "secret1"),
        ("confirm_password", "secret1"),
      ],
    )
    .await;
  assert_eq!(location(&res), "/auth#login");

  let (cookie, res) = h.login("nora@example.com", "secret1").await;
  assert_eq!(location(&res), "/dashboard");

  let res = h.get("/dashboard", Some(&cookie)).await;
  assert_eq!(res.status(), StatusCode::OK);
  let body = text(res).await;
  assert!(body.contains("nora@example.com"));
  assert!(body.contains("No active subscription"));
}

#[tokio::test]
async fn wrong_password_flashes_generic_error() {
  let h = harness().await;
  h.app.sv().user.register("owen@example.com", "secret1").await.unwrap();

  let (cookie, res) = h.login("owen@example.com", "wrong-pass").await;
  assert_eq!(location(&res), "/auth#login");

  let body = text(h.get("/auth", Some(&cookie)).await).await;
  assert!(body.contains("Invalid email or password"));
}

#[tokio::test]
async fn admin_gate() {
  let h = harness().await;
  h.app.sv().user.register("ivy@example.com", "secret1").await.unwrap();

  let (cookie, _) = h.login("ivy@example.com", "secret1").await;
  let res = h.get("/admin", Some(&cookie)).await;
  assert_eq!(location(&res), "/login");

  let (cookie, res) = h.login("admin@vpnservice.com", "admin123").await;
  assert_eq!(location(&res), "/admin");
  assert_eq!(h.get("/admin", Some(&cookie)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn payment_upload_and_slip_access() {
  let h = harness().await;
  let sv = h.app.sv();
  sv.user.register("ada@example.com", "secret1").await.unwrap();
  sv.user.register("eve@example.com", "secret1").await.unwrap();
  let plan = sv.plan.all().await.unwrap().remove(0);

  let (ada, _) = h.login("ada@example.com", "secret1").await;

  let boundary = "XBOUNDARYX";
  let body = format!(
    "--{boundary}\r\n\
     Content-Disposition: form-data; name=\"bank_name\"\r\n\r\n\
     KBank\r\n\
     --{boundary}\r\n\
     Content-Disposition: form-data; name=\"payment_slip\"; filename=\"slip.png\"\r\n\
     Content-Type: image/png\r\n\r\n\
     not-really-a-png\r\n\
     --{boundary}--\r\n"
  );
  let req = Request::post(format!("/payment/submit/{}", plan.id))
    .header(header::COOKIE, &ada)
    .header(
      header::CONTENT_TYPE,
      format!("multipart/form-data; boundary={boundary}"),
    )
    .body(Body::from(body))
    .unwrap();
  let res = h.send(req).await;
  assert_eq!(location(&res), "/dashboard");

  let ada_id = sv.user.by_email("ada@example.com").await.unwrap().unwrap().id;
  let payments = sv.payment.by_user(ada_id).await.unwrap();
  assert_eq!(payments.len(), 1);
  let slip = payments[0].payment.slip_filename.clone();
  assert!(slip.starts_with(&format!("{ada_id}_{}_", plan.id)));
  assert!(slip.ends_with("_slip.png"));

  let res = h.get(&format!("/payments/view/{slip}"), Some(&ada)).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
  assert_eq!(text(res).await, "not-really-a-png");

  let (eve, _) = h.login("eve@example.com", "secret1").await;
  let res = h.get(&format!("/payments/view/{slip}"), Some(&eve)).await;
  assert_eq!(res.status(), StatusCode::FORBIDDEN);
  assert_eq!(text(res).await, "Access denied");

  let (admin, _) = h.login("admin@vpnservice.com", "admin123").await;
  let res = h.get(&format!("/admin/payments/view/{slip}"), Some(&admin)).await;
  assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_plan_upload_is_not_found() {
  let h = harness().await;
  h.app.sv().user.register("kai@example.com", "secret1").await.unwrap();
  let (cookie, _) = h.login("kai@example.com", "secret1").await;

  let res = h.get("/subscribe/999", Some(&cookie)).await;
  assert_eq!(res.status(), StatusCode::NOT_FOUND);
  assert_eq!(text(res).await, "Plan not found");
}

#[tokio::test]
async fn approval_through_admin_forms() {
  let h = harness().await;
  let sv = h.app.sv();
  let user = sv.user.register("zoe@example.com", "secret1").await.unwrap();
  let plan = sv.plan.all().await.unwrap().remove(1);
  let payment = sv
    .payment
    .submit(Submission {
      user_id: user.id,
      plan_id: plan.id,
      bank_name: "KBank".into(),
      transaction_id: None,
      slip_name: "slip.pdf".into(),
      slip: b"%PDF".to_vec(),
    })
    .await
    .unwrap();

  let (admin, _) = h.login("admin@vpnservice.com", "admin123").await;
  let approve = format!("/admin/payments/approve/{}", payment.id);

  let res = h.get(&approve, Some(&admin)).await;
  assert_eq!(res.status(), StatusCode::OK);
  assert!(text(res).await.contains("zoe@example.com"));

  let res = h.post_form(&approve, Some(&admin), &[("connection_url", " ")]).await;
  assert_eq!(location(&res), "/admin/payments");
  let still = sv.payment.by_id(payment.id).await.unwrap().unwrap();
  assert_eq!(still.status, PaymentStatus::Pending);

  let link = "vless://id@host:443?security=tls#zoe";
  let res = h.post_form(&approve, Some(&admin), &[("connection_url", link)]).await;
  assert_eq!(location(&res), "/admin/payments");

  let done = sv.payment.by_id(payment.id).await.unwrap().unwrap();
  assert_eq!(done.status, PaymentStatus::Approved);
  assert!(sv.subscription.active_for(user.id).await.unwrap().is_some());
  let cred = sv.credential.by_user(user.id).await.unwrap().unwrap();
  assert_eq!(cred.link.as_deref(), Some(link));

  // A second review is refused and bounced back to the list.
  let res = h.get(&approve, Some(&admin)).await;
  assert_eq!(location(&res), "/admin/payments");

  let (zoe, _) = h.login("zoe@example.com", "secret1").await;
  let res = h.get("/config/qr", Some(&zoe)).await;
  assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
  let res = h.get("/config/vmess", Some(&zoe)).await;
  assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn issued_config_downloads_as_json() {
  let h = harness().await;
  let user =
    h.app.sv().user.register("max@example.com", "secret1").await.unwrap();
  h.app.sv().credential.issue(user.id).await.unwrap();

  let (cookie, _) = h.login("max@example.com", "secret1").await;

  let res = h.get("/config/vmess", Some(&cookie)).await;
  assert!(text(res).await.starts_with("vmess://"));

  let res = h.get("/config/download", Some(&cookie)).await;
  assert_eq!(
    res.headers().get(header::CONTENT_DISPOSITION).unwrap(),
    "attachment; filename=\"v2ray-config.json\""
  );
  let config: json::Value = json::from_str(&text(res).await).unwrap();
  assert_eq!(config["ps"], "VPN Service - max@example.com");
  assert_eq!(config["add"], "vpn.example.com");
}

#[tokio::test]
async fn cron_sweep_reports_json() {
  let h = harness().await;
  let res = h.get("/cron/expire-subscriptions", None).await;
  assert_eq!(res.status(), StatusCode::OK);

  let body: json::Value = json::from_str(&text(res).await).unwrap();
  assert_eq!(body["status"], "success");
  assert_eq!(body["expired"], 0);
}

#[tokio::test]
async fn admin_assign_issues_vmess_credential() {
  let h = harness().await;
  let sv = h.app.sv();
  let user = sv.user.register("pia@example.com", "secret1").await.unwrap();
  let plan = sv.plan.all().await.unwrap().remove(0);

  let (admin, _) = h.login("admin@vpnservice.com", "admin123").await;
  let uri = format!("/admin/users/assign/{}", user.id);
  let res = h
    .post_form(&uri, Some(&admin), &[("plan_id", &plan.id.to_string())])
    .await;
  assert_eq!(res.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&res), "/admin");

  let (sub, _) = sv.subscription.active_for(user.id).await.unwrap().unwrap();
  assert_eq!(sub.plan_id, plan.id);
  let cred = sv.credential.by_user(user.id).await.unwrap().unwrap();
  assert_eq!(cred.protocol, Protocol::Vmess);
  assert!(cred.uuid.is_some());

  let body = text(h.get("/admin", Some(&admin)).await).await;
  assert!(body.contains("Subscription assigned until"));
}

#[tokio::test]
async fn admin_assign_keeps_link_only_credential() {
  let h = harness().await;
  let sv = h.app.sv();
  let user = sv.user.register("quin@example.com", "secret1").await.unwrap();
  let plan = sv.plan.all().await.unwrap().remove(0);
  let link = "vless://manual@host:443#quin";
  crate::sv::credential::save_link(&h.app.db, user.id, link).await.unwrap();

  let (admin, _) = h.login("admin@vpnservice.com", "admin123").await;
  let uri = format!("/admin/users/assign/{}", user.id);
  h.post_form(&uri, Some(&admin), &[("plan_id", &plan.id.to_string())]).await;

  assert!(sv.subscription.active_for(user.id).await.unwrap().is_some());
  let cred = sv.credential.by_user(user.id).await.unwrap().unwrap();
  assert_eq!(cred.link.as_deref(), Some(link));
  assert_eq!(cred.uuid, None);
}

#[tokio::test]
async fn admin_assign_flashes_bad_plan_id() {
  let h = harness().await;
  let user =
    h.app.sv().user.register("rex@example.com", "secret1").await.unwrap();

  let (admin, _) = h.login("admin@vpnservice.com", "admin123").await;
  let uri = format!("/admin/users/assign/{}", user.id);
  let res = h.post_form(&uri, Some(&admin), &[("plan_id", "abc")]).await;
  assert_eq!(res.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&res), "/admin");

  let body = text(h.get("/admin", Some(&admin)).await).await;
  assert!(body.contains("Please choose a plan"));
  assert!(h.app.sv().subscription.active_for(user.id).await.unwrap().is_none());
  assert!(h.app.sv().credential.by_user(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn admin_issue_config_and_toggle_user() {
  let h = harness().await;
  let user =
    h.app.sv().user.register("sam@example.com", "secret1").await.unwrap();
  let (admin, _) = h.login("admin@vpnservice.com", "admin123").await;

  let issue = format!("/admin/users/config/{}", user.id);
  let res = h.get(&issue, Some(&admin)).await;
  assert_eq!(location(&res), "/admin");
  let cred = h.app.sv().credential.by_user(user.id).await.unwrap().unwrap();
  assert_eq!(cred.protocol, Protocol::Vmess);
  let body = text(h.get("/admin", Some(&admin)).await).await;
  assert!(body.contains("V2Ray config generated successfully"));

  let toggle = format!("/admin/users/toggle/{}", user.id);
  h.get(&toggle, Some(&admin)).await;
  let stored = h.app.sv().user.by_id(user.id).await.unwrap().unwrap();
  assert!(!stored.is_active);

  let (cookie, res) = h.login("sam@example.com", "secret1").await;
  assert_eq!(location(&res), "/auth#login");
  let body = text(h.get("/auth", Some(&cookie)).await).await;
  assert!(body.contains("Account is disabled"));

  h.get(&toggle, Some(&admin)).await;
  let (_, res) = h.login("sam@example.com", "secret1").await;
  assert_eq!(location(&res), "/dashboard");
}

#[tokio::test]
async fn admin_plan_forms() {
  let h = harness().await;
  let (admin, _) = h.login("admin@vpnservice.com", "admin123").await;
  let before = h.app.sv().plan.all().await.unwrap().len();

  let res = h
    .post_form(
      "/admin/plans/create",
      Some(&admin),
      &[("name", "Bad"), ("price", "abc"), ("duration_days", "30")],
    )
    .await;
  assert_eq!(location(&res), "/admin");
  let body = text(h.get("/admin", Some(&admin)).await).await;
  assert!(body.contains("Price must be a number"));
  assert_eq!(h.app.sv().plan.all().await.unwrap().len(), before);

  h.post_form(
    "/admin/plans/create",
    Some(&admin),
    &[("name", "Quarter"), ("price", "39.5"), ("duration_days", " 90 ")],
  )
  .await;
  let plans = h.app.sv().plan.all().await.unwrap();
  let quarter = plans.iter().find(|p| p.name == "Quarter").unwrap();
  assert_eq!(quarter.price, 39.5);
  assert_eq!(quarter.duration_days, 90);

  let res = h
    .post_form(
      &format!("/admin/plans/update/{}", quarter.id),
      Some(&admin),
      &[("name", "Season"), ("price", "35"), ("duration_days", "91")],
    )
    .await;
  assert_eq!(location(&res), "/admin");
  let updated = h.app.sv().plan.by_id(quarter.id).await.unwrap().unwrap();
  assert_eq!(updated.name, "Season");
  assert_eq!(updated.duration_days, 91);
  let body = text(h.get("/admin", Some(&admin)).await).await;
  assert!(body.contains("Plan `Season` updated"));

  h.get(&format!("/admin/plans/delete/{}", quarter.id), Some(&admin)).await;
  assert!(h.app.sv().plan.by_id(quarter.id).await.unwrap().is_none());
}

#[tokio::test]
async fn admin_server_forms() {
  let h = harness().await;
  let (admin, _) = h.login("admin@vpnservice.com", "admin123").await;

  let res = h
    .post_form(
      "/admin/servers/create",
      Some(&admin),
      &[
        ("name", "Osaka 1"),
        ("country", "Japan"),
        ("city", "Osaka"),
        ("status", ""),
        ("location_code", "jp"),
      ],
    )
    .await;
  assert_eq!(location(&res), "/admin/servers");

  let servers = h.app.sv().server.all().await.unwrap();
  let osaka = servers.iter().find(|s| s.name == "Osaka 1").unwrap().clone();
  assert_eq!(osaka.status, ServerStatus::Online);
  assert_eq!(osaka.location_code.as_deref(), Some("jp"));

  h.post_form(
    &format!("/admin/servers/update/{}", osaka.id),
    Some(&admin),
    &[
      ("name", "Osaka 2"),
      ("country", "Japan"),
      ("city", "Osaka"),
      ("status", "maintenance"),
      ("location_code", "jp"),
    ],
  )
  .await;
  let updated = h.app.sv().server.by_id(osaka.id).await.unwrap().unwrap();
  assert_eq!(updated.name, "Osaka 2");
  assert_eq!(updated.status, ServerStatus::Maintenance);

  let toggle = format!("/admin/servers/toggle/{}", osaka.id);
  h.get(&toggle, Some(&admin)).await;
  assert!(!h.app.sv().server.by_id(osaka.id).await.unwrap().unwrap().is_active);
  let body = text(h.get("/admin/servers", Some(&admin)).await).await;
  assert!(body.contains("Server hidden"));

  h.get(&format!("/admin/servers/delete/{}", osaka.id), Some(&admin)).await;
  assert!(h.app.sv().server.by_id(osaka.id).await.unwrap().is_none());
}
