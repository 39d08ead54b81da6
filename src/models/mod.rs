pub mod auth;
pub mod common;
pub mod contact;
pub mod credential;
pub mod newsletter;
pub mod payment;
pub mod session;

pub use auth::*;
pub use common::*;
pub use contact::*;
pub use credential::*;
pub use newsletter::*;
pub use payment::*;
pub use session::*;
