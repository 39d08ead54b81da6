pub mod newsletters;
pub mod users;

pub use newsletters as newsletter_entity;
pub use users as user_entity;
pub use users::{SubscriptionTier, UserRole};
