use sea_orm::sea_query::Expr;

use crate::{
  entity::{SubscriptionStatus, plan, subscription, user},
  prelude::*,
};

/// Subscription row joined with its owner and plan for the admin listing.
#[derive(Debug, Clone)]
pub struct Listing {
  pub subscription: subscription::Model,
  pub email: String,
  pub plan: Option<plan::Model>,
}

/// Retires the user's active subscriptions and opens a new one lasting the
/// plan's duration. Callers run this inside a transaction.
pub(crate) async fn assign<C: ConnectionTrait>(
  conn: &C,
  user_id: i32,
  plan_id: i32,
) -> Result<subscription::Model> {
  let plan =
    plan::Entity::find_by_id(plan_id).one(conn).await?.ok_or(Error::PlanNotFound)?;

  if user::Entity::find_by_id(user_id).one(conn).await?.is_none() {
    return Err(Error::UserNotFound);
  }

  let start = now();
  let end = start + TimeDelta::days(plan.duration_days as i64);

  subscription::Entity::update_many()
    .col_expr(
      subscription::Column::Status,
      Expr::value(SubscriptionStatus::Expired),
    )
    .filter(subscription::Column::UserId.eq(user_id))
    .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
    .exec(conn)
    .await?;

  let sub = subscription::ActiveModel {
    id: NotSet,
    user_id: Set(user_id),
    plan_id: Set(plan_id),
    start_date: Set(start),
    end_date: Set(end),
    status: Set(SubscriptionStatus::Active),
  };

  Ok(sub.insert(conn).await?)
}

pub struct Subscription<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Subscription<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  #[cfg(test)]
  pub async fn assign(
    &self,
    user_id: i32,
    plan_id: i32,
  ) -> Result<subscription::Model> {
    let txn = self.db.begin().await?;
    let sub = assign(&txn, user_id, plan_id).await?;
    txn.commit().await?;

    info!(
      "User #{user_id} subscribed to plan #{plan_id} until {}",
      utils::format_date(sub.end_date)
    );
    Ok(sub)
  }

  /// The user's current subscription, latest end date first.
  pub async fn active_for(
    &self,
    user_id: i32,
  ) -> Result<Option<(subscription::Model, Option<plan::Model>)>> {
    let sub = subscription::Entity::find()
      .filter(subscription::Column::UserId.eq(user_id))
      .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
      .order_by_desc(subscription::Column::EndDate)
      .find_also_related(plan::Entity)
      .one(self.db)
      .await?;
    Ok(sub)
  }

  pub async fn by_user(&self, user_id: i32) -> Result<Vec<subscription::Model>> {
    let subs = subscription::Entity::find()
      .filter(subscription::Column::UserId.eq(user_id))
      .order_by_desc(subscription::Column::StartDate)
      .all(self.db)
      .await?;
    Ok(subs)
  }

  pub async fn all(&self) -> Result<Vec<Listing>> {
    let subs = subscription::Entity::find()
      .order_by_desc(subscription::Column::StartDate)
      .order_by_desc(subscription::Column::Id)
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
      subs
        .into_iter()
        .map(|(subscription, plan)| Listing {
          email: emails.get(&subscription.user_id).cloned().unwrap_or_default(),
          subscription,
          plan,
        })
        .collect(),
    )
  }

  /// Marks every active subscription that ended strictly before `cutoff` as
  /// expired and returns how many changed.
  pub async fn expire_before(&self, cutoff: DateTime) -> Result<u64> {
    let res = subscription::Entity::update_many()
      .col_expr(
        subscription::Column::Status,
        Expr::value(SubscriptionStatus::Expired),
      )
      .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
      .filter(subscription::Column::EndDate.lt(cutoff))
      .exec(self.db)
      .await?;
    Ok(res.rows_affected)
  }

  pub async fn expire_overdue(&self) -> Result<u64> {
    self.expire_before(now()).await
  }
}
