use rand::Rng;
use uuid::Uuid;

/// 6-digit numeric one-time passcode.
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(100000..=999999))
}

/// Password reset token (122 random bits).
pub fn generate_reset_token() -> String {
    Uuid::new_v4().to_string()
}
