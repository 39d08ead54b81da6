use crate::entities::user_entity as users;
use crate::error::AppResult;
use crate::models::CredentialKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Account lookups and credential bookkeeping used by the verification flow.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>>;

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<users::Model>>;

    /// Overwrites any previous credential of the same kind.
    async fn store_credential(
        &self,
        user_id: Uuid,
        kind: CredentialKind,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Clears the OTP and marks the email verified, but only if `code` is still
    /// the stored value. Returns false when another caller consumed it first.
    async fn consume_otp(
        &self,
        user_id: Uuid,
        code: &str,
        verified_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Clears the reset token and stores the new password hash, under the same
    /// compare-and-clear rule as [`AccountStore::consume_otp`].
    async fn consume_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct SeaOrmAccountStore {
    pool: DatabaseConnection,
}

impl SeaOrmAccountStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for SeaOrmAccountStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::ResetToken.eq(token))
            .one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn store_credential(
        &self,
        user_id: Uuid,
        kind: CredentialKind,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut model = users::ActiveModel {
            id: Set(user_id),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        match kind {
            CredentialKind::Otp => {
                model.otp_code = Set(Some(code.to_string()));
                model.otp_expiry = Set(Some(expires_at));
            }
            CredentialKind::PasswordReset => {
                model.reset_token = Set(Some(code.to_string()));
                model.reset_token_expiry = Set(Some(expires_at));
            }
        }
        model.update(&self.pool).await?;
        Ok(())
    }

    async fn consume_otp(
        &self,
        user_id: Uuid,
        code: &str,
        verified_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::OtpCode, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::OtpExpiry,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(users::Column::EmailVerified, Expr::value(Some(verified_at)))
            .col_expr(users::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::OtpCode.eq(code))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn consume_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> AppResult<bool> {
        let result = users::Entity::update_many()
            .col_expr(
                users::Column::PasswordHash,
                Expr::value(Some(password_hash.to_string())),
            )
            .col_expr(users::Column::ResetToken, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::ResetTokenExpiry,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::ResetToken.eq(token))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected == 1)
    }
}
