use crate::error::{AppError, AppResult};
use crate::external::{EmailKind, EmailMessage, Mailer};
use crate::models::{CredentialKind, MessageResponse};
use crate::services::AccountStore;
use crate::utils::{constant_time_str_eq, hash_password, validate_email, validate_password};
use chrono::{DateTime, Utc};
use std::sync::Arc;

const INVALID_OTP: &str = "Invalid OTP";
const EXPIRED_OTP: &str = "OTP has expired";
const INVALID_RESET_TOKEN: &str = "Invalid reset token";
const EXPIRED_RESET_TOKEN: &str = "Reset token has expired";

/// Issues, verifies and consumes single-use OTP codes and password reset tokens.
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    base_url: String,
}

impl CredentialService {
    pub fn new(store: Arc<dyn AccountStore>, mailer: Arc<dyn Mailer>, base_url: &str) -> Self {
        Self {
            store,
            mailer,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn issue(&self, email: &str, kind: CredentialKind) -> AppResult<MessageResponse> {
        self.issue_at(email, kind, Utc::now()).await
    }

    /// Generates a fresh credential and emails it. Unknown addresses get the
    /// same success shape without any store or mail side effects.
    pub async fn issue_at(
        &self,
        email: &str,
        kind: CredentialKind,
        now: DateTime<Utc>,
    ) -> AppResult<MessageResponse> {
        validate_email(email)?;

        let Some(user) = self.store.find_by_email(email).await? else {
            log::info!("{kind} requested for an unknown email, nothing sent");
            return Ok(MessageResponse::ok(match kind {
                CredentialKind::Otp => "If this email exists, an OTP has been sent",
                CredentialKind::PasswordReset => {
                    "If this email exists, a password reset link has been sent"
                }
            }));
        };

        let code = kind.generate();
        let expires_at = now + kind.validity();
        self.store
            .store_credential(user.id, kind, &code, expires_at)
            .await?;

        let email_kind = match kind {
            CredentialKind::Otp => EmailKind::Otp { code },
            CredentialKind::PasswordReset => EmailKind::PasswordReset {
                reset_url: self.reset_url(&code),
            },
        };
        self.mailer
            .send(&EmailMessage {
                to: user.email.clone(),
                name: user.name.clone(),
                kind: email_kind,
            })
            .await?;

        log::info!("Issued {kind} for user {}, expires at {expires_at}", user.id);
        Ok(MessageResponse::ok(match kind {
            CredentialKind::Otp => "OTP sent successfully",
            CredentialKind::PasswordReset => "Password reset email sent successfully",
        }))
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> AppResult<MessageResponse> {
        self.verify_otp_at(email, otp, Utc::now()).await
    }

    /// Mismatch and expiry are reported separately; unknown accounts look
    /// exactly like a wrong code.
    pub async fn verify_otp_at(
        &self,
        email: &str,
        otp: &str,
        now: DateTime<Utc>,
    ) -> AppResult<MessageResponse> {
        validate_email(email)?;
        if otp.len() != 6 || !otp.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::ValidationError("OTP must be 6 digits".to_string()));
        }

        let user = self
            .store
            .find_by_email(email)
            .await?
            .filter(|u| {
                u.otp_code
                    .as_deref()
                    .is_some_and(|stored| constant_time_str_eq(stored, otp))
            })
            .ok_or_else(|| AppError::InvalidCredential(INVALID_OTP.to_string()))?;

        if !is_live(user.otp_expiry, now) {
            return Err(AppError::Expired(EXPIRED_OTP.to_string()));
        }

        if !self.store.consume_otp(user.id, otp, now).await? {
            return Err(AppError::InvalidCredential(INVALID_OTP.to_string()));
        }

        log::info!("Email verified for user {}", user.id);
        Ok(MessageResponse::ok("Email verified successfully"))
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> AppResult<MessageResponse> {
        self.reset_password_at(token, password, Utc::now()).await
    }

    pub async fn reset_password_at(
        &self,
        token: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> AppResult<MessageResponse> {
        validate_password(password)?;
        if token.is_empty() {
            return Err(AppError::InvalidCredential(INVALID_RESET_TOKEN.to_string()));
        }

        let user = self
            .store
            .find_by_reset_token(token)
            .await?
            .filter(|u| {
                u.reset_token
                    .as_deref()
                    .is_some_and(|stored| constant_time_str_eq(stored, token))
            })
            .ok_or_else(|| AppError::InvalidCredential(INVALID_RESET_TOKEN.to_string()))?;

        if !is_live(user.reset_token_expiry, now) {
            return Err(AppError::Expired(EXPIRED_RESET_TOKEN.to_string()));
        }

        let password_hash = hash_password(password)?;
        if !self
            .store
            .consume_reset_token(user.id, token, &password_hash)
            .await?
        {
            return Err(AppError::InvalidCredential(INVALID_RESET_TOKEN.to_string()));
        }

        log::info!("Password reset for user {}", user.id);
        Ok(MessageResponse::ok("Password has been reset successfully"))
    }

    fn reset_url(&self, token: &str) -> String {
        format!("{}/auth/reset-password?token={token}", self.base_url)
    }
}

fn is_live(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|exp| now < exp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{InMemoryAccountStore, RecordingMailer, user_with_email};
    use crate::utils::verify_password;
    use chrono::Duration;

    const EMAIL: &str = "ada@example.com";

    fn setup() -> (CredentialService, Arc<InMemoryAccountStore>, Arc<RecordingMailer>) {
        let store = Arc::new(InMemoryAccountStore::with_users(vec![user_with_email(EMAIL)]));
        let mailer = Arc::new(RecordingMailer::default());
        let service = CredentialService::new(store.clone(), mailer.clone(), "http://localhost:3000/");
        (service, store, mailer)
    }

    fn sent_otp(mailer: &RecordingMailer) -> String {
        match mailer.sent().last().map(|m| m.kind.clone()) {
            Some(EmailKind::Otp { code }) => code,
            other => panic!("expected an OTP email, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_issue_otp_stores_and_sends() {
        let (service, store, mailer) = setup();
        let now = Utc::now();

        let response = service.issue_at(EMAIL, CredentialKind::Otp, now).await.unwrap();
        assert!(response.success);
        assert_eq!(response.message, "OTP sent successfully");

        let user = store.get(EMAIL).unwrap();
        let code = sent_otp(&mailer);
        assert_eq!(user.otp_code.as_deref(), Some(code.as_str()));
        assert_eq!(user.otp_expiry, Some(now + Duration::minutes(10)));
        assert_eq!(mailer.sent()[0].to, EMAIL);
    }

    #[tokio::test]
    async fn test_issue_for_unknown_email_has_no_side_effects() {
        let (service, store, mailer) = setup();

        let otp = service
            .issue("nobody@example.com", CredentialKind::Otp)
            .await
            .unwrap();
        assert!(otp.success);
        assert_eq!(otp.message, "If this email exists, an OTP has been sent");

        let reset = service
            .issue("nobody@example.com", CredentialKind::PasswordReset)
            .await
            .unwrap();
        assert!(reset.success);

        assert_eq!(store.write_count(), 0);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_issue_rejects_malformed_email() {
        let (service, _, mailer) = setup();
        let err = service
            .issue("not-an-email", CredentialKind::Otp)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "Invalid email address"));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_mailer_failure_surfaces_as_external_error() {
        let store = Arc::new(InMemoryAccountStore::with_users(vec![user_with_email(EMAIL)]));
        let service = CredentialService::new(
            store,
            Arc::new(RecordingMailer::failing()),
            "http://localhost:3000",
        );
        let err = service.issue(EMAIL, CredentialKind::Otp).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApiError(_)));
    }

    #[tokio::test]
    async fn test_verify_without_stored_otp_is_invalid() {
        let (service, _, _) = setup();
        let err = service.verify_otp(EMAIL, "123456").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(ref m) if m == "Invalid OTP"));

        let err = service
            .verify_otp("nobody@example.com", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_verify_otp_marks_email_verified_once() {
        let (service, store, mailer) = setup();
        let now = Utc::now();
        service.issue_at(EMAIL, CredentialKind::Otp, now).await.unwrap();
        let code = sent_otp(&mailer);

        let verified_at = now + Duration::minutes(3);
        let response = service.verify_otp_at(EMAIL, &code, verified_at).await.unwrap();
        assert_eq!(response.message, "Email verified successfully");

        let user = store.get(EMAIL).unwrap();
        assert_eq!(user.email_verified, Some(verified_at));
        assert!(user.otp_code.is_none());
        assert!(user.otp_expiry.is_none());

        let err = service
            .verify_otp_at(EMAIL, &code, verified_at)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_wrong_otp_is_invalid_and_keeps_credential() {
        let (service, store, mailer) = setup();
        service.issue(EMAIL, CredentialKind::Otp).await.unwrap();
        let code = sent_otp(&mailer);
        let wrong = if code == "999999" { "100000" } else { "999999" };

        let err = service.verify_otp(EMAIL, wrong).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(_)));
        assert_eq!(store.get(EMAIL).unwrap().otp_code, Some(code));
    }

    #[tokio::test]
    async fn test_otp_expires_after_ten_minutes() {
        let (service, store, mailer) = setup();
        let now = Utc::now();
        service.issue_at(EMAIL, CredentialKind::Otp, now).await.unwrap();
        let code = sent_otp(&mailer);

        let err = service
            .verify_otp_at(EMAIL, &code, now + Duration::minutes(11))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Expired(ref m) if m == "OTP has expired"));

        // exactly at expiry is already too late
        let err = service
            .verify_otp_at(EMAIL, &code, now + Duration::minutes(10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Expired(_)));
        assert!(store.get(EMAIL).unwrap().email_verified.is_none());
    }

    #[tokio::test]
    async fn test_reissued_otp_replaces_previous() {
        let (service, _, mailer) = setup();
        let now = Utc::now();

        service.issue_at(EMAIL, CredentialKind::Otp, now).await.unwrap();
        let first = sent_otp(&mailer);
        // regenerate until the codes differ so the old one can't match by chance
        let mut second = first.clone();
        while second == first {
            service.issue_at(EMAIL, CredentialKind::Otp, now).await.unwrap();
            second = sent_otp(&mailer);
        }

        let err = service.verify_otp_at(EMAIL, &first, now).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(_)));
        assert!(service.verify_otp_at(EMAIL, &second, now).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_otp_validates_input_first() {
        let (service, _, _) = setup();

        let err = service.verify_otp("bad", "123456").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "Invalid email address"));

        let err = service.verify_otp(EMAIL, "12345").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ref m) if m == "OTP must be 6 digits"));
    }

    #[tokio::test]
    async fn test_reset_token_flow() {
        let (service, store, mailer) = setup();
        let now = Utc::now();

        let response = service
            .issue_at(EMAIL, CredentialKind::PasswordReset, now)
            .await
            .unwrap();
        assert_eq!(response.message, "Password reset email sent successfully");

        let token = store.get(EMAIL).unwrap().reset_token.unwrap();
        assert_eq!(
            store.get(EMAIL).unwrap().reset_token_expiry,
            Some(now + Duration::hours(1))
        );
        match &mailer.sent()[0].kind {
            EmailKind::PasswordReset { reset_url } => assert_eq!(
                reset_url,
                &format!("http://localhost:3000/auth/reset-password?token={token}")
            ),
            other => panic!("unexpected email {other:?}"),
        }

        service
            .reset_password_at(&token, "new-secret", now + Duration::minutes(30))
            .await
            .unwrap();

        let user = store.get(EMAIL).unwrap();
        assert!(user.reset_token.is_none());
        assert!(user.reset_token_expiry.is_none());
        assert!(verify_password("new-secret", user.password_hash.as_deref().unwrap()).unwrap());

        let err = service
            .reset_password_at(&token, "another-secret", now + Duration::minutes(31))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(ref m) if m == "Invalid reset token"));
    }

    #[tokio::test]
    async fn test_expired_reset_token_is_distinguished() {
        let (service, store, _) = setup();
        let now = Utc::now();
        service
            .issue_at(EMAIL, CredentialKind::PasswordReset, now)
            .await
            .unwrap();
        let token = store.get(EMAIL).unwrap().reset_token.unwrap();

        let err = service
            .reset_password_at(&token, "new-secret", now + Duration::minutes(61))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Expired(ref m) if m == "Reset token has expired"));
        assert!(store.get(EMAIL).unwrap().password_hash.is_none());
    }

    #[tokio::test]
    async fn test_second_reset_request_invalidates_first_token() {
        let (service, store, _) = setup();
        let now = Utc::now();

        service
            .issue_at(EMAIL, CredentialKind::PasswordReset, now)
            .await
            .unwrap();
        let first = store.get(EMAIL).unwrap().reset_token.unwrap();
        service
            .issue_at(EMAIL, CredentialKind::PasswordReset, now)
            .await
            .unwrap();
        let second = store.get(EMAIL).unwrap().reset_token.unwrap();
        assert_ne!(first, second);

        let err = service
            .reset_password_at(&first, "new-secret", now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential(_)));
        assert!(service.reset_password_at(&second, "new-secret", now).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_rejects_short_password() {
        let (service, _, _) = setup();
        let err = service.reset_password("whatever", "abc").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ValidationError(ref m) if m == "Password must be at least 6 characters"
        ));
    }
}
