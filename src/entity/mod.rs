//! SeaORM entity definitions

pub mod credential;
pub mod payment;
pub mod plan;
pub mod server;
pub mod subscription;
pub mod user;

pub use credential::Protocol;
pub use payment::PaymentStatus;
pub use server::ServerStatus;
pub use subscription::SubscriptionStatus;
