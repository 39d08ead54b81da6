use crate::entities::newsletter_entity as newsletters;
use crate::error::AppResult;
use crate::external::{EmailKind, EmailMessage, Mailer};
use crate::models::MessageResponse;
use crate::utils::validate_email;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;

#[derive(Clone)]
pub struct NewsletterService {
    pool: DatabaseConnection,
    mailer: Arc<dyn Mailer>,
}

impl NewsletterService {
    pub fn new(pool: DatabaseConnection, mailer: Arc<dyn Mailer>) -> Self {
        Self { pool, mailer }
    }

    pub async fn subscribe(&self, email: &str) -> AppResult<MessageResponse> {
        validate_email(email)?;

        let existing = newsletters::Entity::find()
            .filter(newsletters::Column::Email.eq(email))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Ok(MessageResponse::ok("Email already subscribed"));
        }

        newsletters::ActiveModel {
            email: Set(email.to_string()),
            subscribed_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        self.mailer
            .send(&EmailMessage {
                to: email.to_string(),
                name: None,
                kind: EmailKind::SubscriptionConfirmation,
            })
            .await?;

        Ok(MessageResponse::ok(
            "Successfully subscribed to the newsletter",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::RecordingMailer;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_existing_subscriber_is_not_mailed_again() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![newsletters::Model {
                id: 1,
                email: "ada@example.com".to_string(),
                subscribed_at: Utc::now(),
            }]])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());
        let service = NewsletterService::new(db, mailer.clone());

        let response = service.subscribe("ada@example.com").await.unwrap();
        assert_eq!(response.message, "Email already subscribed");
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_new_subscriber_gets_confirmation() {
        let now = Utc::now();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<newsletters::Model>::new()])
            .append_query_results([vec![newsletters::Model {
                id: 7,
                email: "grace@example.com".to_string(),
                subscribed_at: now,
            }]])
            .into_connection();
        let mailer = Arc::new(RecordingMailer::default());
        let service = NewsletterService::new(db, mailer.clone());

        let response = service.subscribe("grace@example.com").await.unwrap();
        assert_eq!(response.message, "Successfully subscribed to the newsletter");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, EmailKind::SubscriptionConfirmation);
        assert_eq!(sent[0].to, "grace@example.com");
    }
}
