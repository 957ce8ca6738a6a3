use sea_orm::SqlErr;

use crate::{entity::plan, prelude::*};

const DEFAULT_PLANS: [(&str, f64, i32); 3] = [
  ("7 Days Plan", 5.99, 7),
  ("30 Days Plan", 19.99, 30),
  ("90 Days Plan", 49.99, 90),
];

/// Admin-submitted plan fields.
#[derive(Debug, Clone)]
pub struct Draft {
  pub name: String,
  pub price: f64,
  pub duration_days: i32,
}

impl Draft {
  fn validate(self) -> Result<Self> {
    let name = self.name.trim().to_string();
    if name.is_empty() {
      return Err(Error::InvalidArgs("Plan name is required".into()));
    }
    if !self.price.is_finite() || self.price < 0.0 {
      return Err(Error::InvalidArgs("Price must be a positive number".into()));
    }
    if self.duration_days <= 0 {
      return Err(Error::InvalidArgs("Duration must be at least one day".into()));
    }
    Ok(Self { name, ..self })
  }
}

pub struct Plan<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Plan<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn seed_defaults(&self) -> Result<()> {
    if plan::Entity::find().count(self.db).await? > 0 {
      return Ok(());
    }

    let models = DEFAULT_PLANS.into_iter().map(|(name, price, days)| {
      plan::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        price: Set(price),
        duration_days: Set(days),
        is_active: Set(true),
      }
    });
    plan::Entity::insert_many(models).exec(self.db).await?;

    info!("Seeded {} default plans", DEFAULT_PLANS.len());
    Ok(())
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<plan::Model>> {
    Ok(plan::Entity::find_by_id(id).one(self.db).await?)
  }

  /// All plans, shortest first.
  pub async fn all(&self) -> Result<Vec<plan::Model>> {
    let plans = plan::Entity::find()
      .order_by_asc(plan::Column::DurationDays)
      .all(self.db)
      .await?;
    Ok(plans)
  }

  pub async fn active(&self) -> Result<Vec<plan::Model>> {
    let plans = plan::Entity::find()
      .filter(plan::Column::IsActive.eq(true))
      .order_by_asc(plan::Column::DurationDays)
      .all(self.db)
      .await?;
    Ok(plans)
  }

  pub async fn create(&self, draft: Draft) -> Result<plan::Model> {
    let draft = draft.validate()?;

    let plan = plan::ActiveModel {
      id: NotSet,
      name: Set(draft.name),
      price: Set(draft.price),
      duration_days: Set(draft.duration_days),
      is_active: Set(true),
    };

    Ok(plan.insert(self.db).await?)
  }

  pub async fn update(&self, id: i32, draft: Draft) -> Result<plan::Model> {
    let draft = draft.validate()?;
    let plan = self.by_id(id).await?.ok_or(Error::PlanNotFound)?;

    let plan = plan::ActiveModel {
      name: Set(draft.name),
      price: Set(draft.price),
      duration_days: Set(draft.duration_days),
      ..plan.into()
    }
    .update(self.db)
    .await?;

    Ok(plan)
  }

  pub async fn delete(&self, id: i32) -> Result<()> {
    let res = match plan::Entity::delete_by_id(id).exec(self.db).await {
      Ok(res) => res,
      Err(err)
        if matches!(
          err.sql_err(),
          Some(SqlErr::ForeignKeyConstraintViolation(_))
        ) =>
      {
        return Err(Error::PlanInUse);
      }
      Err(err) => return Err(err.into()),
    };

    if res.rows_affected == 0 {
      return Err(Error::PlanNotFound);
    }
    Ok(())
  }
}
