use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand::rngs::OsRng;
use sea_orm::{DbErr, SqlErr};

use crate::{
  entity::{SubscriptionStatus, plan, subscription, user},
  prelude::*,
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// A user with the plan they are currently subscribed to, if any.
#[derive(Debug, Clone)]
pub struct Overview {
  pub user: user::Model,
  pub subscription: Option<subscription::Model>,
  pub plan: Option<plan::Model>,
}

async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|err| Error::Internal(format!("password hashing: {err}")))
  })
  .await
  .map_err(|err| Error::Internal(err.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
  tokio::task::spawn_blocking(move || {
    let Ok(parsed) = PasswordHash::new(&hash) else {
      return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
  })
  .await
  .map_err(|err| Error::Internal(err.to_string()))
}

fn is_unique_violation(err: &DbErr) -> bool {
  matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn by_email(&self, email: &str) -> Result<Option<user::Model>> {
    let user = user::Entity::find()
      .filter(user::Column::Email.eq(email))
      .one(self.db)
      .await?;
    Ok(user)
  }

  pub async fn register(
    &self,
    email: &str,
    password: &str,
  ) -> Result<user::Model> {
    let email = email.trim();

    if self.by_email(email).await?.is_some() {
      return Err(Error::EmailTaken);
    }
    if !utils::is_valid_email(email) {
      return Err(Error::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
      return Err(Error::WeakPassword);
    }

    let user = self.insert(email, password).await?;
    info!("Registered user #{} <{}>", user.id, user.email);
    Ok(user)
  }

  async fn insert(&self, email: &str, password: &str) -> Result<user::Model> {
    let hash = hash_password(password.to_string()).await?;

    let user = user::ActiveModel {
      id: NotSet,
      email: Set(email.to_string()),
      password_hash: Set(hash),
      is_active: Set(true),
      created_at: Set(now()),
    };

    match user.insert(self.db).await {
      Ok(user) => Ok(user),
      Err(err) if is_unique_violation(&err) => Err(Error::EmailTaken),
      Err(err) => Err(err.into()),
    }
  }

  /// Creates the account unless the email is already taken.
  pub async fn ensure(
    &self,
    email: &str,
    password: &str,
  ) -> Result<user::Model> {
    if let Some(user) = self.by_email(email).await? {
      return Ok(user);
    }
    let user = self.insert(email, password).await?;
    info!("Created account <{}>", user.email);
    Ok(user)
  }

  pub async fn authenticate(
    &self,
    email: &str,
    password: &str,
  ) -> Result<user::Model> {
    let user =
      self.by_email(email.trim()).await?.ok_or(Error::InvalidCredentials)?;

    if !user.is_active {
      return Err(Error::AccountDisabled);
    }

    if !verify_password(password.to_string(), user.password_hash.clone())
      .await?
    {
      return Err(Error::InvalidCredentials);
    }

    Ok(user)
  }

  /// Flips the active flag, returning the new value.
  pub async fn toggle_active(&self, id: i32) -> Result<bool> {
    let user = self.by_id(id).await?.ok_or(Error::UserNotFound)?;
    let active = !user.is_active;

    user::ActiveModel { is_active: Set(active), ..user.into() }
      .update(self.db)
      .await?;

    Ok(active)
  }

  /// Every user, newest first, joined with their active subscription.
  pub async fn overview(&self) -> Result<Vec<Overview>> {
    let users = user::Entity::find()
      .order_by_desc(user::Column::CreatedAt)
      .order_by_desc(user::Column::Id)
      .all(self.db)
      .await?;

    let mut active: HashMap<i32, (subscription::Model, Option<plan::Model>)> =
      subscription::Entity::find()
        .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
        .order_by_asc(subscription::Column::EndDate)
        .find_also_related(plan::Entity)
        .all(self.db)
        .await?
        .into_iter()
        .map(|(sub, plan)| (sub.user_id, (sub, plan)))
        .collect();

    Ok(
      users
        .into_iter()
        .map(|user| {
          let (subscription, plan) = match active.remove(&user.id) {
            Some((sub, plan)) => (Some(sub), plan),
            None => (None, None),
          };
          Overview { user, subscription, plan }
        })
        .collect(),
    )
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(user::Entity::find().count(self.db).await?)
  }
}
