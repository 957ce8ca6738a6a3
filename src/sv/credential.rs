use uuid::Uuid;

use crate::{
  entity::{Protocol, credential, subscription, user},
  prelude::*,
  state::Config,
  sv,
};

/// Stores `link` as the user's connection URL, creating a link-only
/// credential when none exists yet.
pub(crate) async fn save_link<C: ConnectionTrait>(
  conn: &C,
  user_id: i32,
  link: &str,
) -> Result<credential::Model> {
  let existing = find(conn, user_id).await?;

  let model = match existing {
    Some(cred) => {
      credential::ActiveModel { link: Set(Some(link.to_string())), ..cred.into() }
        .update(conn)
        .await?
    }
    None => {
      credential::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        uuid: Set(None),
        server: Set(None),
        port: Set(None),
        protocol: Set(Protocol::Vless),
        link: Set(Some(link.to_string())),
        created_at: Set(now()),
      }
      .insert(conn)
      .await?
    }
  };

  Ok(model)
}

pub struct Credential<'a> {
  db: &'a DatabaseConnection,
  config: &'a Config,
}

impl<'a> Credential<'a> {
  pub fn new(db: &'a DatabaseConnection, config: &'a Config) -> Self {
    Self { db, config }
  }

  pub async fn by_user(&self, user_id: i32) -> Result<Option<credential::Model>> {
    find(self.db, user_id).await
  }

  /// Returns the user's credential, minting a VMess one on first use.
  pub async fn issue(&self, user_id: i32) -> Result<credential::Model> {
    issue(self.db, self.config, user_id).await
  }

  /// Puts the user on `plan_id` and makes sure they hold a credential, both in
  /// one transaction.
  pub async fn grant(
    &self,
    user_id: i32,
    plan_id: i32,
  ) -> Result<(subscription::Model, credential::Model)> {
    let txn = self.db.begin().await?;
    let sub = sv::subscription::assign(&txn, user_id, plan_id).await?;
    let cred = issue(&txn, self.config, user_id).await?;
    txn.commit().await?;

    info!(
      "User #{user_id} granted plan #{plan_id} until {}",
      utils::format_date(sub.end_date)
    );
    Ok((sub, cred))
  }
}

/// Returns the user's credential, minting a VMess one on first use. Usable
/// inside a caller's transaction.
pub(crate) async fn issue<C: ConnectionTrait>(
  conn: &C,
  config: &Config,
  user_id: i32,
) -> Result<credential::Model> {
  if let Some(cred) = find(conn, user_id).await? {
    return Ok(cred);
  }

  if user::Entity::find_by_id(user_id).one(conn).await?.is_none() {
    return Err(Error::UserNotFound);
  }

  let cred = credential::ActiveModel {
    id: NotSet,
    user_id: Set(user_id),
    uuid: Set(Some(Uuid::new_v4().to_string())),
    server: Set(Some(config.vmess_host.clone())),
    port: Set(Some(config.vmess_port as i32)),
    protocol: Set(Protocol::Vmess),
    link: Set(None),
    created_at: Set(now()),
  };

  match cred.insert(conn).await {
    Ok(cred) => {
      info!("Issued credential for user #{user_id}");
      Ok(cred)
    }
    // lost a race against a concurrent issue, the first row wins
    Err(err) => match find(conn, user_id).await? {
      Some(cred) => Ok(cred),
      None => Err(err.into()),
    },
  }
}

async fn find<C: ConnectionTrait>(
  conn: &C,
  user_id: i32,
) -> Result<Option<credential::Model>> {
  let cred = credential::Entity::find()
    .filter(credential::Column::UserId.eq(user_id))
    .one(conn)
    .await?;
  Ok(cred)
}
