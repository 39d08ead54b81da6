pub mod code_generator;
pub mod email;
pub mod jwt;
pub mod password;
pub mod secure_compare;

pub use code_generator::{generate_reset_token, generate_six_digit_code};
pub use email::validate_email;
pub use jwt::*;
pub use password::*;
pub use secure_compare::constant_time_str_eq;
