pub mod mailer;
pub mod stripe;

pub use self::mailer::*;
pub use self::stripe::*;
