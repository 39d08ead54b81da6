//! In-memory collaborators for service and handler tests.

use crate::entities::{SubscriptionTier, UserRole, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::external::{EmailMessage, Mailer};
use crate::models::CredentialKind;
use crate::services::AccountStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::Uuid;

pub fn user_with_email(email: &str) -> users::Model {
    users::Model {
        id: Uuid::new_v4(),
        name: Some("Ada".to_string()),
        email: email.to_string(),
        password_hash: None,
        role: UserRole::User,
        subscription: SubscriptionTier::Free,
        email_verified: None,
        otp_code: None,
        otp_expiry: None,
        reset_token: None,
        reset_token_expiry: None,
        stripe_customer_id: None,
        stripe_subscription_id: None,
        created_at: Some(Utc::now()),
        updated_at: Some(Utc::now()),
    }
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    users: Mutex<Vec<users::Model>>,
    writes: Mutex<usize>,
}

impl InMemoryAccountStore {
    pub fn with_users(users: Vec<users::Model>) -> Self {
        Self {
            users: Mutex::new(users),
            writes: Mutex::new(0),
        }
    }

    pub fn get(&self, email: &str) -> Option<users::Model> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    fn modify<F: FnOnce(&mut users::Model) -> bool>(&self, user_id: Uuid, f: F) -> bool {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == user_id) else {
            return false;
        };
        let changed = f(user);
        if changed {
            *self.writes.lock().unwrap() += 1;
        }
        changed
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>> {
        Ok(self.get(email))
    }

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<users::Model>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn store_credential(
        &self,
        user_id: Uuid,
        kind: CredentialKind,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let found = self.modify(user_id, |u| {
            match kind {
                CredentialKind::Otp => {
                    u.otp_code = Some(code.to_string());
                    u.otp_expiry = Some(expires_at);
                }
                CredentialKind::PasswordReset => {
                    u.reset_token = Some(code.to_string());
                    u.reset_token_expiry = Some(expires_at);
                }
            }
            true
        });
        if found {
            Ok(())
        } else {
            Err(AppError::NotFound("User not found".to_string()))
        }
    }

    async fn consume_otp(
        &self,
        user_id: Uuid,
        code: &str,
        verified_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.modify(user_id, |u| {
            if u.otp_code.as_deref() != Some(code) {
                return false;
            }
            u.otp_code = None;
            u.otp_expiry = None;
            u.email_verified = Some(verified_at);
            true
        }))
    }

    async fn consume_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        password_hash: &str,
    ) -> AppResult<bool> {
        Ok(self.modify(user_id, |u| {
            if u.reset_token.as_deref() != Some(token) {
                return false;
            }
            u.reset_token = None;
            u.reset_token_expiry = None;
            u.password_hash = Some(password_hash.to_string());
            true
        }))
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if self.fail {
            return Err(AppError::ExternalApiError("Failed to send email".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
