pub mod account_store;
pub mod auth_service;
pub mod contact_service;
pub mod credential_service;
pub mod newsletter_service;
pub mod payment_service;
pub mod refresh_throttle;
pub mod subscription_sync_service;

#[cfg(test)]
pub mod test_support;

pub use account_store::*;
pub use auth_service::*;
pub use contact_service::*;
pub use credential_service::*;
pub use newsletter_service::*;
pub use payment_service::*;
pub use refresh_throttle::*;
pub use subscription_sync_service::*;
