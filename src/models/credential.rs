use chrono::Duration;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::{generate_reset_token, generate_six_digit_code};

/// The two kinds of single-use secrets bound to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Otp,
    PasswordReset,
}

impl CredentialKind {
    pub fn validity(self) -> Duration {
        match self {
            CredentialKind::Otp => Duration::minutes(10),
            CredentialKind::PasswordReset => Duration::hours(1),
        }
    }

    pub fn generate(self) -> String {
        match self {
            CredentialKind::Otp => generate_six_digit_code(),
            CredentialKind::PasswordReset => generate_reset_token(),
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialKind::Otp => write!(f, "otp"),
            CredentialKind::PasswordReset => write!(f, "password_reset"),
        }
    }
}

// Missing fields deserialize as empty strings so they fail validation with
// the same message as malformed ones.

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendOtpRequest {
    #[serde(default)]
    #[schema(example = "ada@example.com")]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "123456")]
    pub otp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    #[serde(default)]
    #[schema(example = "ada@example.com")]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    #[schema(example = "5b0c7a1e-2f0b-4d4e-9b8e-0d7c3b1f2a10")]
    pub token: String,
    #[serde(default)]
    #[schema(example = "new-password")]
    pub password: String,
}
