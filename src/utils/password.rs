use crate::error::{AppError, AppResult};
use bcrypt::{hash, verify};

const BCRYPT_COST: u32 = 10;

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < 6 {
        return Err(AppError::ValidationError(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if password.len() > 72 {
        // bcrypt silently truncates past 72 bytes
        return Err(AppError::ValidationError(
            "Password must be at most 72 bytes".to_string(),
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, BCRYPT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))
}
