use crate::{
  entity::{ServerStatus, server},
  prelude::*,
};

const DEFAULT_SERVERS: [(&str, &str, &str, &str); 6] = [
  ("United States", "United States", "New York", "US-NY"),
  ("United Kingdom", "United Kingdom", "London", "UK-LON"),
  ("Germany", "Germany", "Frankfurt", "DE-FRA"),
  ("Japan", "Japan", "Tokyo", "JP-TYO"),
  ("Singapore", "Singapore", "Singapore", "SG-SIN"),
  ("Canada", "Canada", "Toronto", "CA-TOR"),
];

#[derive(Debug, Clone)]
pub struct Draft {
  pub name: String,
  pub country: String,
  pub city: String,
  pub status: ServerStatus,
  pub location_code: Option<String>,
}

impl Draft {
  fn validate(self) -> Result<Self> {
    let name = self.name.trim().to_string();
    let country = self.country.trim().to_string();
    let city = self.city.trim().to_string();

    if name.is_empty() || country.is_empty() || city.is_empty() {
      return Err(Error::InvalidArgs(
        "Please fill in all required fields".into(),
      ));
    }

    let location_code = self
      .location_code
      .map(|code| code.trim().to_string())
      .filter(|code| !code.is_empty());

    Ok(Self { name, country, city, location_code, ..self })
  }
}

pub struct Server<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Server<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn seed_defaults(&self) -> Result<()> {
    if server::Entity::find().count(self.db).await? > 0 {
      return Ok(());
    }

    let now = now();
    let models =
      DEFAULT_SERVERS.into_iter().map(|(name, country, city, code)| {
        server::ActiveModel {
          id: NotSet,
          name: Set(name.to_string()),
          country: Set(country.to_string()),
          city: Set(city.to_string()),
          status: Set(ServerStatus::Online),
          location_code: Set(Some(code.to_string())),
          is_active: Set(true),
          created_at: Set(now),
        }
      });
    server::Entity::insert_many(models).exec(self.db).await?;

    info!("Seeded {} default servers", DEFAULT_SERVERS.len());
    Ok(())
  }

  pub async fn by_id(&self, id: i32) -> Result<Option<server::Model>> {
    Ok(server::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn all(&self) -> Result<Vec<server::Model>> {
    let servers = server::Entity::find()
      .order_by_asc(server::Column::Country)
      .order_by_asc(server::Column::City)
      .all(self.db)
      .await?;
    Ok(servers)
  }

  /// Servers shown on the public listing.
  pub async fn active(&self) -> Result<Vec<server::Model>> {
    let servers = server::Entity::find()
      .filter(server::Column::IsActive.eq(true))
      .order_by_asc(server::Column::Country)
      .order_by_asc(server::Column::City)
      .all(self.db)
      .await?;
    Ok(servers)
  }

  pub async fn create(&self, draft: Draft) -> Result<server::Model> {
    let draft = draft.validate()?;

    let server = server::ActiveModel {
      id: NotSet,
      name: Set(draft.name),
      country: Set(draft.country),
      city: Set(draft.city),
      status: Set(draft.status),
      location_code: Set(draft.location_code),
      is_active: Set(true),
      created_at: Set(now()),
    };

    Ok(server.insert(self.db).await?)
  }

  pub async fn update(&self, id: i32, draft: Draft) -> Result<server::Model> {
    let draft = draft.validate()?;
    let server = self.by_id(id).await?.ok_or(Error::ServerNotFound)?;

    let server = server::ActiveModel {
      name: Set(draft.name),
      country: Set(draft.country),
      city: Set(draft.city),
      status: Set(draft.status),
      location_code: Set(draft.location_code),
      ..server.into()
    }
    .update(self.db)
    .await?;

    Ok(server)
  }

  pub async fn delete(&self, id: i32) -> Result<()> {
    let res = server::Entity::delete_by_id(id).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::ServerNotFound);
    }
    Ok(())
  }

  /// Flips the listing flag, returning the new value.
  pub async fn toggle_active(&self, id: i32) -> Result<bool> {
    let server = self.by_id(id).await?.ok_or(Error::ServerNotFound)?;
    let active = !server.is_active;

    server::ActiveModel { is_active: Set(active), ..server.into() }
      .update(self.db)
      .await?;

    Ok(active)
  }
}
