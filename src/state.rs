use std::{env, path::PathBuf, str::FromStr};

use migration::Migrator;
use uuid::Uuid;

use crate::{prelude::*, sv};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Info,
  Error,
}

#[derive(Debug, Clone)]
pub struct Flash {
  pub level: Level,
  pub text: String,
}

#[derive(Debug, Clone)]
pub struct SessionUser {
  pub id: i32,
  pub email: String,
  pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
  pub user: Option<SessionUser>,
  pub flash: Vec<Flash>,
  pub last_seen: DateTime,
}

impl Session {
  fn fresh(now: DateTime) -> Self {
    Self { user: None, flash: Vec::new(), last_seen: now }
  }
}

pub type Sessions = DashMap<String, Session>;

#[derive(Debug, Clone)]
pub struct BankDetails {
  pub bank_name: String,
  pub account_number: String,
  pub account_holder: String,
  pub swift_code: String,
}

#[derive(Debug, Clone)]
pub struct Config {
  pub port: u16,
  pub admin_email: String,
  pub admin_password: String,
  pub uploads_directory: PathBuf,
  pub max_upload_bytes: usize,
  pub session_lifetime: Duration,
  pub cookie_secure: bool,
  /// Defaults stamped into freshly minted VMess credentials
  pub vmess_host: String,
  pub vmess_port: u16,
  pub bank: BankDetails,
  /// Re-run the expiry sweep this often; startup-only when `None`
  pub expiry_interval: Option<Duration>,
}

pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

impl Default for Config {
  fn default() -> Self {
    Self {
      port: 8080,
      admin_email: String::from("admin@vpnservice.com"),
      admin_password: String::from(DEFAULT_ADMIN_PASSWORD),
      uploads_directory: PathBuf::from("./uploads"),
      max_upload_bytes: 16 * 1024 * 1024,
      session_lifetime: Duration::from_secs(24 * 3600),
      cookie_secure: false,
      vmess_host: String::from("vpn.example.com"),
      vmess_port: 443,
      bank: BankDetails {
        bank_name: String::from("Your Bank Name"),
        account_number: String::from("1234567890"),
        account_holder: String::from("VPN Service"),
        swift_code: String::from("BANKCODE123"),
      },
      expiry_interval: None,
    }
  }
}

fn var(key: &str) -> Option<String> {
  env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(key: &str) -> anyhow::Result<Option<T>>
where
  T::Err: std::fmt::Display,
{
  var(key)
    .map(|raw| {
      raw.parse().map_err(|err| anyhow::anyhow!("Invalid {key} `{raw}`: {err}"))
    })
    .transpose()
}

fn duration(key: &str) -> anyhow::Result<Option<Duration>> {
  var(key)
    .map(|raw| {
      humantime::parse_duration(&raw)
        .with_context(|| format!("Invalid {key} `{raw}`"))
    })
    .transpose()
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let mut config = Self::default();

    if let Some(port) = parsed("PORT")? {
      config.port = port;
    }
    if let Some(email) = var("ADMIN_EMAIL") {
      config.admin_email = email;
    }
    if let Some(password) = var("ADMIN_PASSWORD") {
      config.admin_password = password;
    }
    if let Some(dir) = var("UPLOADS_DIR") {
      config.uploads_directory = PathBuf::from(dir);
    }
    if let Some(lifetime) = duration("SESSION_LIFETIME")? {
      config.session_lifetime = lifetime;
    }
    if let Some(secure) = parsed("COOKIE_SECURE")? {
      config.cookie_secure = secure;
    }
    if let Some(host) = var("VMESS_HOST") {
      config.vmess_host = host;
    }
    if let Some(port) = parsed("VMESS_PORT")? {
      config.vmess_port = port;
    }
    if let Some(name) = var("BANK_NAME") {
      config.bank.bank_name = name;
    }
    if let Some(number) = var("BANK_ACCOUNT_NUMBER") {
      config.bank.account_number = number;
    }
    if let Some(holder) = var("BANK_ACCOUNT_HOLDER") {
      config.bank.account_holder = holder;
    }
    if let Some(swift) = var("BANK_SWIFT_CODE") {
      config.bank.swift_code = swift;
    }
    config.expiry_interval = duration("EXPIRY_SWEEP_INTERVAL")?;

    Ok(config)
  }

  pub fn is_admin(&self, email: &str) -> bool {
    email == self.admin_email
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub plan: sv::Plan<'a>,
  pub server: sv::Server<'a>,
  pub subscription: sv::Subscription<'a>,
  pub credential: sv::Credential<'a>,
  pub payment: sv::Payment<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub sessions: Sessions,
  pub config: Config,
}

impl AppState {
  pub async fn new(db_url: &str, config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(db_url)
      .await
      .context("Failed to connect to database")?;

    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    Self::with_connection(db, config).await
  }

  pub async fn with_connection(
    db: DatabaseConnection,
    config: Config,
  ) -> anyhow::Result<Self> {
    tokio::fs::create_dir_all(&config.uploads_directory)
      .await
      .with_context(|| {
        format!("Failed to create {}", config.uploads_directory.display())
      })?;

    let app = Self { db, sessions: DashMap::new(), config };
    app.seed().await?;
    Ok(app)
  }

  async fn seed(&self) -> anyhow::Result<()> {
    let sv = self.sv();

    sv.plan.seed_defaults().await.context("Failed to seed plans")?;
    sv.server.seed_defaults().await.context("Failed to seed servers")?;

    if self.config.admin_password == DEFAULT_ADMIN_PASSWORD {
      warn!("ADMIN_PASSWORD not set, using the default admin password");
    }
    sv.user
      .ensure(&self.config.admin_email, &self.config.admin_password)
      .await
      .context("Failed to create admin account")?;

    debug!("Database ready with {} accounts", sv.user.count().await?);
    Ok(())
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      plan: sv::Plan::new(&self.db),
      server: sv::Server::new(&self.db),
      subscription: sv::Subscription::new(&self.db),
      credential: sv::Credential::new(&self.db, &self.config),
      payment: sv::Payment::new(&self.db, &self.config),
    }
  }

  /// Refreshes and returns `id` when it names a live session.
  pub fn resume_session(&self, id: Option<&str>) -> Option<String> {
    let id = id?;
    let mut session = self.sessions.get_mut(id)?;
    session.last_seen = now();
    Some(id.to_string())
  }

  /// Id for a visitor without a live session. Nothing is stored until the
  /// first login or flash message.
  pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
  }

  fn open_session(
    &self,
    id: &str,
  ) -> dashmap::mapref::one::RefMut<'_, String, Session> {
    self
      .sessions
      .entry(id.to_string())
      .or_insert_with(|| Session::fresh(now()))
  }

  pub fn session_user(&self, id: &str) -> Option<SessionUser> {
    self.sessions.get(id).and_then(|s| s.user.clone())
  }

  pub fn login(&self, id: &str, user: SessionUser) {
    self.open_session(id).user = Some(user);
  }

  pub fn logout(&self, id: &str) {
    self.sessions.remove(id);
  }

  pub fn flash(&self, id: &str, level: Level, text: impl Into<String>) {
    self.open_session(id).flash.push(Flash { level, text: text.into() });
  }

  pub fn take_flash(&self, id: &str) -> Vec<Flash> {
    self
      .sessions
      .get_mut(id)
      .map(|mut s| std::mem::take(&mut s.flash))
      .unwrap_or_default()
  }

  pub fn gc_sessions(&self) {
    let now = now();
    let timeout = self.config.session_lifetime.as_secs() as i64;

    self.sessions.retain(|_key, s| (now - s.last_seen).num_seconds() < timeout);
  }
}

#[cfg(test)]
pub(crate) async fn test_app(uploads: &std::path::Path) -> AppState {
  let config = Config {
    uploads_directory: uploads.to_path_buf(),
    ..Config::default()
  };
  AppState::with_connection(sv::test_db().await, config).await.unwrap()
}
