use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] DbErr),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Email already registered")]
  EmailTaken,

  #[error("Invalid email format")]
  InvalidEmail,

  #[error("Password must be at least 6 characters")]
  WeakPassword,

  #[error("Passwords do not match")]
  PasswordMismatch,

  #[error("Invalid email or password")]
  InvalidCredentials,

  #[error("Account is disabled")]
  AccountDisabled,

  #[error("User not found")]
  UserNotFound,

  #[error("Plan not found")]
  PlanNotFound,

  #[error("Plan is in use")]
  PlanInUse,

  #[error("Server not found")]
  ServerNotFound,

  #[error("Payment not found or already processed")]
  PaymentNotPending,

  #[error("No config found")]
  CredentialNotFound,

  #[error("File not found")]
  FileNotFound,

  #[error("Invalid file type. Please upload PNG, JPG, JPEG, PDF, or GIF")]
  InvalidFileType,

  #[error("Access denied")]
  Forbidden,

  #[error("{0}")]
  InvalidArgs(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::Database(_) | Self::Io(_) | Self::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      Self::UserNotFound
      | Self::PlanNotFound
      | Self::ServerNotFound
      | Self::PaymentNotPending
      | Self::CredentialNotFound
      | Self::FileNotFound => StatusCode::NOT_FOUND,
      Self::Forbidden => StatusCode::FORBIDDEN,
      Self::InvalidCredentials | Self::AccountDisabled => StatusCode::UNAUTHORIZED,
      Self::EmailTaken | Self::PlanInUse => StatusCode::CONFLICT,
      Self::InvalidEmail
      | Self::WeakPassword
      | Self::PasswordMismatch
      | Self::InvalidFileType
      | Self::InvalidArgs(_) => StatusCode::BAD_REQUEST,
    }
  }

  /// Message safe to show to end users. Storage failures are logged and
  /// replaced with a generic text.
  pub fn public_message(&self) -> String {
    match self {
      Self::Database(err) => {
        tracing::error!("Database error: {err}");
        "Database error".to_string()
      }
      Self::Io(err) => {
        tracing::error!("IO error: {err}");
        "IO error".to_string()
      }
      Self::Internal(err) => {
        tracing::error!("Internal error: {err}");
        "Internal error".to_string()
      }
      other => other.to_string(),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    (self.status(), self.public_message()).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn not_pending_payment_reads_as_already_processed() {
    let err = Error::PaymentNotPending;
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert!(err.to_string().contains("not found or already processed"));
  }

  #[test]
  fn storage_failures_hide_details() {
    let err = Error::Internal("secret path /var/db".into());
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.public_message(), "Internal error");
  }
}
