use crate::entities::{SubscriptionTier, UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        validate_registration(&request)?;

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(&request.email))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(Some(request.name)),
            email: Set(request.email),
            password_hash: Set(Some(password_hash)),
            role: Set(UserRole::User),
            subscription: Set(SubscriptionTier::Free),
            email_verified: Set(None),
            otp_code: Set(None),
            otp_expiry: Set(None),
            reset_token: Set(None),
            reset_token_expiry: Set(None),
            stripe_customer_id: Set(None),
            stripe_subscription_id: Set(None),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
        }
        .insert(&self.pool)
        .await?;

        log::info!("Registered user {}", user.id);
        Ok(RegisterResponse {
            user: UserResponse::from(user),
            message: "User registered successfully".to_string(),
        })
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let invalid = || AppError::AuthError("Invalid email or password".to_string());

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(&request.email))
            .one(&self.pool)
            .await?
            .ok_or_else(invalid)?;

        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
        if !verify_password(&request.password, hash)? {
            return Err(invalid());
        }

        if user.email_verified.is_none() {
            return Err(AppError::Forbidden(
                "Please verify your email before logging in".to_string(),
            ));
        }

        let access_token =
            self.jwt_service
                .generate_access_token(user.id, user.role, user.subscription)?;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    /// Re-reads the user and mints a token reflecting the current role and tier.
    pub async fn issue_session_token(&self, user_id: Uuid) -> AppResult<(users::Model, String)> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let token = self
            .jwt_service
            .generate_access_token(user.id, user.role, user.subscription)?;
        Ok((user, token))
    }
}

fn validate_registration(request: &RegisterRequest) -> AppResult<()> {
    if request.name.trim().chars().count() < 2 {
        return Err(AppError::ValidationError(
            "Name must be at least 2 characters".to_string(),
        ));
    }
    validate_email(&request.email)?;
    validate_password(&request.password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_registration_reports_first_failure() {
        let err = validate_registration(&request("A", "bad", "123")).unwrap_err();
        assert!(
            matches!(err, AppError::ValidationError(ref m) if m == "Name must be at least 2 characters")
        );

        let err = validate_registration(&request("Ada", "bad", "123")).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "Invalid email address"));

        assert!(validate_registration(&request("Ada", "ada@example.com", "secret")).is_ok());
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_generic_auth_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let service = AuthService::new(db, JwtService::new("secret", 3600));

        let err = service
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(ref m) if m == "Invalid email or password"));
    }

    #[tokio::test]
    async fn test_login_requires_verified_email() {
        let mut user = crate::services::test_support::user_with_email("ada@example.com");
        user.password_hash = Some(hash_password("secret").unwrap());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user]])
            .into_connection();
        let service = AuthService::new(db, JwtService::new("secret", 3600));

        let err = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
