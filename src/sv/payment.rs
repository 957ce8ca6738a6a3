use std::path::PathBuf;

use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
  entity::{PaymentStatus, payment, plan, subscription, user},
  prelude::*,
  state::Config,
  sv,
};

/// Uploaded proof of a bank transfer.
#[derive(Debug)]
pub struct Submission {
  pub user_id: i32,
  pub plan_id: i32,
  pub bank_name: String,
  pub transaction_id: Option<String>,
  pub slip_name: String,
  pub slip: Vec<u8>,
}

/// Payment joined with its submitter and plan.
#[derive(Debug, Clone)]
pub struct Entry {
  pub payment: payment::Model,
  pub email: String,
  pub plan: Option<plan::Model>,
}

pub struct Payment<'a> {
  db: &'a DatabaseConnection,
  config: &'a Config,
}

impl<'a> Payment<'a> {
  pub fn new(db: &'a DatabaseConnection, config: &'a Config) -> Self {
    Self { db, config }
  }

  pub fn slip_path(&self, filename: &str) -> Option<PathBuf> {
    utils::is_plain_filename(filename)
      .then(|| self.config.uploads_directory.join(filename))
  }

  pub async fn submit(&self, sub: Submission) -> Result<payment::Model> {
    plan::Entity::find_by_id(sub.plan_id)
      .one(self.db)
      .await?
      .ok_or(Error::PlanNotFound)?;

    let bank_name = sub.bank_name.trim().to_string();
    if bank_name.is_empty() {
      return Err(Error::InvalidArgs(
        "Please fill in all required fields".into(),
      ));
    }
    if sub.slip_name.trim().is_empty() || sub.slip.is_empty() {
      return Err(Error::InvalidArgs("Please upload a payment slip".into()));
    }

    let ext =
      utils::slip_extension(sub.slip_name.trim()).ok_or(Error::InvalidFileType)?;
    let original = utils::slip_file_name(sub.slip_name.trim(), &ext);

    let tag = Uuid::new_v4().simple().to_string();
    let filename =
      format!("{}_{}_{}_{}", sub.user_id, sub.plan_id, &tag[..8], original);
    let path = self.config.uploads_directory.join(&filename);
    tokio::fs::write(&path, &sub.slip).await?;

    let transaction_id = sub
      .transaction_id
      .map(|id| id.trim().to_string())
      .filter(|id| !id.is_empty());

    let payment = payment::ActiveModel {
      id: NotSet,
      user_id: Set(sub.user_id),
      plan_id: Set(sub.plan_id),
      bank_name: Set(bank_name),
      account_number: Set(String::from("N/A")),
      transaction_id: Set(transaction_id),
      slip_filename: Set(filename),
      status: Set(PaymentStatus::Pending),
      submitted_at: Set(now()),
      reviewed_at: Set(None),
      reviewed_by: Set(None),
    };

    match payment.insert(self.db).await {
      Ok(payment) => {
        info!(
          "Payment #{} submitted by user #{} for plan #{}",
          payment.id, payment.user_id, payment.plan_id
        );
        Ok(payment)
      }
      Err(err) => {
        if let Err(io) = tokio::fs::remove_file(&path).await {
          warn!("Failed to remove orphaned slip {}: {io}", path.display());
        }
        Err(err.into())
      }
    }
  }

  #[cfg(test)]
  pub async fn by_id(&self, id: i32) -> Result<Option<payment::Model>> {
    Ok(payment::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn by_slip(&self, filename: &str) -> Result<Option<payment::Model>> {
    let payment = payment::Entity::find()
      .filter(payment::Column::SlipFilename.eq(filename))
      .one(self.db)
      .await?;
    Ok(payment)
  }

  async fn entries(
    &self,
    status: Option<PaymentStatus>,
    user_id: Option<i32>,
  ) -> Result<Vec<Entry>> {
    let mut query = payment::Entity::find();
    if let Some(status) = status {
      query = query.filter(payment::Column::Status.eq(status));
    }
    if let Some(user_id) = user_id {
      query = query.filter(payment::Column::UserId.eq(user_id));
    }

    let rows = query
      .order_by_desc(payment::Column::SubmittedAt)
      .order_by_desc(payment::Column::Id)
      .find_also_related(plan::Entity)
      .all(self.db)
      .await?;

    let emails: HashMap<i32, String> = user::Entity::find()
      .all(self.db)
      .await?
      .into_iter()
      .map(|user| (user.id, user.email))
      .collect();

    Ok(
      rows
        .into_iter()
        .map(|(payment, plan)| Entry {
          email: emails.get(&payment.user_id).cloned().unwrap_or_default(),
          payment,
          plan,
        })
        .collect(),
    )
  }

  pub async fn pending(&self) -> Result<Vec<Entry>> {
    self.entries(Some(PaymentStatus::Pending), None).await
  }

  pub async fn all(&self) -> Result<Vec<Entry>> {
    self.entries(None, None).await
  }

  pub async fn by_user(&self, user_id: i32) -> Result<Vec<Entry>> {
    self.entries(None, Some(user_id)).await
  }

  /// A pending payment ready for review.
  pub async fn pending_entry(&self, id: i32) -> Result<Entry> {
    let (payment, plan) = payment::Entity::find_by_id(id)
      .filter(payment::Column::Status.eq(PaymentStatus::Pending))
      .find_also_related(plan::Entity)
      .one(self.db)
      .await?
      .ok_or(Error::PaymentNotPending)?;

    let email = user::Entity::find_by_id(payment.user_id)
      .one(self.db)
      .await?
      .map(|user| user.email)
      .unwrap_or_default();

    Ok(Entry { payment, email, plan })
  }

  /// Approves a pending payment: assigns its plan, stores `link` as the
  /// user's connection URL when given, and records the reviewer. All writes
  /// commit together or not at all.
  pub async fn approve(
    &self,
    id: i32,
    admin_id: i32,
    link: Option<&str>,
  ) -> Result<subscription::Model> {
    let txn = self.db.begin().await?;

    let payment = payment::Entity::find_by_id(id)
      .filter(payment::Column::Status.eq(PaymentStatus::Pending))
      .one(&txn)
      .await?
      .ok_or(Error::PaymentNotPending)?;

    let sub = sv::subscription::assign(&txn, payment.user_id, payment.plan_id)
      .await?;

    if let Some(link) = link.map(str::trim).filter(|link| !link.is_empty()) {
      sv::credential::save_link(&txn, payment.user_id, link).await?;
    }

    mark_reviewed(&txn, id, admin_id, PaymentStatus::Approved).await?;
    txn.commit().await?;

    info!(
      "Payment #{id} approved by admin #{admin_id}, user #{} active until {}",
      payment.user_id,
      utils::format_date(sub.end_date)
    );
    Ok(sub)
  }

  pub async fn reject(&self, id: i32, admin_id: i32) -> Result<()> {
    mark_reviewed(self.db, id, admin_id, PaymentStatus::Rejected).await?;
    info!("Payment #{id} rejected by admin #{admin_id}");
    Ok(())
  }
}

/// Moves a payment out of `pending`. Fails when another review got there
/// first.
async fn mark_reviewed<C: ConnectionTrait>(
  conn: &C,
  id: i32,
  admin_id: i32,
  status: PaymentStatus,
) -> Result<()> {
  let res = payment::Entity::update_many()
    .col_expr(payment::Column::Status, Expr::value(status))
    .col_expr(payment::Column::ReviewedAt, Expr::value(now()))
    .col_expr(payment::Column::ReviewedBy, Expr::value(admin_id))
    .filter(payment::Column::Id.eq(id))
    .filter(payment::Column::Status.eq(PaymentStatus::Pending))
    .exec(conn)
    .await?;

  if res.rows_affected == 0 {
    return Err(Error::PaymentNotPending);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::{Protocol, SubscriptionStatus},
    sv::test_db,
  };

  struct Fixture {
    db: DatabaseConnection,
    config: Config,
    _dir: tempfile::TempDir,
    user: i32,
    admin: i32,
    plan: i32,
  }

  async fn fixture() -> Fixture {
    let db = test_db().await;
    let dir = tempfile::tempdir().unwrap();
    let config =
      Config { uploads_directory: dir.path().to_path_buf(), ..Config::default() };

    let users = sv::User::new(&db);
    let user = users.register("kim@example.com", "secret1").await.unwrap();
    let admin = users.ensure("admin@vpnservice.com", "admin123").await.unwrap();
    let plan = sv::Plan::new(&db)
      .create(sv::plan::Draft {
        name: "Month".into(),
        price: 19.99,
        duration_days: 30,
      })
      .await
      .unwrap();

    Fixture { db, config, _dir: dir, user: user.id, admin: admin.id, plan: plan.id }
  }

  fn submission(fx: &Fixture, name: &str) -> Submission {
    Submission {
      user_id: fx.user,
      plan_id: fx.plan,
      bank_name: "Chase".into(),
      transaction_id: Some(" TX-1 ".into()),
      slip_name: name.into(),
      slip: b"%PDF-1.4".to_vec(),
    }
  }

  #[tokio::test]
  async fn test_submit_stores_slip() {
    let fx = fixture().await;
    let sv = Payment::new(&fx.db, &fx.config);

    let payment = sv.submit(submission(&fx, "my slip.pdf")).await.unwrap();

    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.transaction_id.as_deref(), Some("TX-1"));
    assert!(payment.slip_filename.starts_with(&format!("{}_{}_", fx.user, fx.plan)));
    assert!(payment.slip_filename.ends_with("_my_slip.pdf"));

    let path = sv.slip_path(&payment.slip_filename).unwrap();
    assert_eq!(tokio::fs::read(path).await.unwrap(), b"%PDF-1.4");
    assert_eq!(
      sv.by_slip(&payment.slip_filename).await.unwrap().map(|p| p.id),
      Some(payment.id)
    );
  }

  #[tokio::test]
  async fn test_submit_accepts_non_ascii_names() {
    let fx = fixture().await;
    let sv = Payment::new(&fx.db, &fx.config);

    let payment = sv.submit(submission(&fx, "чек.jpg")).await.unwrap();
    assert!(payment.slip_filename.ends_with("_slip.jpg"));
    assert!(utils::is_plain_filename(&payment.slip_filename));

    let path = sv.slip_path(&payment.slip_filename).unwrap();
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    assert_eq!(mime.essence_str(), "image/jpeg");
  }

  #[tokio::test]
  async fn test_submit_rejects_bad_input() {
    let fx = fixture().await;
    let sv = Payment::new(&fx.db, &fx.config);

    assert!(matches!(
      sv.submit(submission(&fx, "payload.exe")).await,
      Err(Error::InvalidFileType)
    ));
    assert!(matches!(
      sv.submit(Submission { bank_name: "  ".into(), ..submission(&fx, "a.png") })
        .await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      sv.submit(Submission { plan_id: 999, ..submission(&fx, "a.png") }).await,
      Err(Error::PlanNotFound)
    ));

    let mut files = tokio::fs::read_dir(&fx.config.uploads_directory).await.unwrap();
    assert!(files.next_entry().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_approve_activates_subscription() {
    let fx = fixture().await;
    let sv = Payment::new(&fx.db, &fx.config);
    let subs = sv::Subscription::new(&fx.db);

    let previous = subs.assign(fx.user, fx.plan).await.unwrap();
    let payment = sv.submit(submission(&fx, "slip.png")).await.unwrap();

    let sub = sv
      .approve(payment.id, fx.admin, Some("  vless://id@edge:443  "))
      .await
      .unwrap();

    let payment = sv.by_id(payment.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Approved);
    assert_eq!(payment.reviewed_by, Some(fx.admin));
    assert!(payment.reviewed_at.is_some());

    let all = subs.by_user(fx.user).await.unwrap();
    let active: Vec<_> =
      all.iter().filter(|s| s.status == SubscriptionStatus::Active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, sub.id);
    assert!(all.iter().any(|s| s.id == previous.id
      && s.status == SubscriptionStatus::Expired));

    let cred = sv::Credential::new(&fx.db, &fx.config)
      .by_user(fx.user)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(cred.link.as_deref(), Some("vless://id@edge:443"));
    assert_eq!(cred.protocol, Protocol::Vless);
  }

  #[tokio::test]
  async fn test_approve_without_link() {
    let fx = fixture().await;
    let sv = Payment::new(&fx.db, &fx.config);

    let payment = sv.submit(submission(&fx, "slip.png")).await.unwrap();
    sv.approve(payment.id, fx.admin, Some("   ")).await.unwrap();

    let cred = sv::Credential::new(&fx.db, &fx.config).by_user(fx.user).await;
    assert!(cred.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_review_only_once() {
    let fx = fixture().await;
    let sv = Payment::new(&fx.db, &fx.config);

    let approved = sv.submit(submission(&fx, "a.png")).await.unwrap();
    let rejected = sv.submit(submission(&fx, "b.png")).await.unwrap();

    sv.approve(approved.id, fx.admin, None).await.unwrap();
    sv.reject(rejected.id, fx.admin).await.unwrap();

    for id in [approved.id, rejected.id] {
      let err = sv.approve(id, fx.admin, None).await.unwrap_err();
      assert!(matches!(err, Error::PaymentNotPending));
      assert!(err.to_string().contains("not found or already processed"));
      assert!(matches!(
        sv.reject(id, fx.admin).await,
        Err(Error::PaymentNotPending)
      ));
    }

    assert!(matches!(
      sv.approve(12345, fx.admin, None).await,
      Err(Error::PaymentNotPending)
    ));
    assert_eq!(
      sv.by_id(rejected.id).await.unwrap().unwrap().status,
      PaymentStatus::Rejected
    );

    // the rejected one left no extra subscription behind
    let subs = sv::Subscription::new(&fx.db).by_user(fx.user).await.unwrap();
    assert_eq!(subs.len(), 1);
  }

  #[tokio::test]
  async fn test_listings() {
    let fx = fixture().await;
    let sv = Payment::new(&fx.db, &fx.config);

    let first = sv.submit(submission(&fx, "a.png")).await.unwrap();
    let second = sv.submit(submission(&fx, "b.png")).await.unwrap();
    sv.reject(first.id, fx.admin).await.unwrap();

    let pending = sv.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payment.id, second.id);
    assert_eq!(pending[0].email, "kim@example.com");

    assert_eq!(sv.all().await.unwrap().len(), 2);
    assert_eq!(sv.by_user(fx.user).await.unwrap().len(), 2);
    assert!(sv.by_user(fx.admin).await.unwrap().is_empty());

    assert_eq!(sv.pending_entry(second.id).await.unwrap().payment.id, second.id);
    assert!(matches!(
      sv.pending_entry(first.id).await,
      Err(Error::PaymentNotPending)
    ));
  }

  #[test]
  fn slip_paths_stay_in_uploads() {
    let config = Config::default();
    let db = DatabaseConnection::Disconnected;
    let sv = Payment::new(&db, &config);

    assert!(sv.slip_path("1_2_abcd_slip.png").is_some());
    assert!(sv.slip_path("../vpn.db").is_none());
  }
}
