use crate::error::{AppError, AppResult};
use crate::external::{EmailKind, EmailMessage, Mailer};
use crate::models::{ContactRequest, MessageResponse};
use crate::utils::validate_email;
use std::sync::Arc;

/// Forwards contact form submissions to the site inbox.
#[derive(Clone)]
pub struct ContactService {
    mailer: Arc<dyn Mailer>,
    recipient: String,
}

impl ContactService {
    pub fn new(mailer: Arc<dyn Mailer>, recipient: &str) -> Self {
        Self {
            mailer,
            recipient: recipient.to_string(),
        }
    }

    pub async fn send(&self, request: ContactRequest) -> AppResult<MessageResponse> {
        validate_contact(&request)?;

        self.mailer
            .send(&EmailMessage {
                to: self.recipient.clone(),
                name: None,
                kind: EmailKind::Contact {
                    name: request.name,
                    email: request.email,
                    subject: request.subject,
                    message: request.message,
                },
            })
            .await?;

        Ok(MessageResponse::ok("Contact form submitted successfully"))
    }
}

fn validate_contact(request: &ContactRequest) -> AppResult<()> {
    if request.name.is_empty() {
        return Err(AppError::ValidationError("Name is required".to_string()));
    }
    validate_email(&request.email)?;
    if request.subject.is_empty() {
        return Err(AppError::ValidationError("Subject is required".to_string()));
    }
    if request.message.chars().count() < 10 {
        return Err(AppError::ValidationError(
            "Message must be at least 10 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::RecordingMailer;

    fn request() -> ContactRequest {
        ContactRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Team pricing".to_string(),
            message: "Do you offer discounts for teams?".to_string(),
        }
    }

    fn assert_validation(err: AppError, expected: &str) {
        assert!(matches!(err, AppError::ValidationError(ref m) if m == expected), "{err:?}");
    }

    #[tokio::test]
    async fn test_sends_to_site_inbox() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = ContactService::new(mailer.clone(), "support@example.com");

        let response = service.send(request()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.message, "Contact form submitted successfully");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "support@example.com");
        assert_eq!(sent[0].reply_to(), Some("ada@example.com"));
        assert_eq!(sent[0].subject(), "New contact form submission: Team pricing");
    }

    #[tokio::test]
    async fn test_first_invalid_field_is_reported() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = ContactService::new(mailer.clone(), "support@example.com");

        let err = service
            .send(ContactRequest {
                name: String::new(),
                email: "bad".to_string(),
                ..request()
            })
            .await
            .unwrap_err();
        assert_validation(err, "Name is required");

        let err = service
            .send(ContactRequest {
                email: "bad".to_string(),
                ..request()
            })
            .await
            .unwrap_err();
        assert_validation(err, "Invalid email address");

        let err = service
            .send(ContactRequest {
                subject: String::new(),
                ..request()
            })
            .await
            .unwrap_err();
        assert_validation(err, "Subject is required");

        let err = service
            .send(ContactRequest {
                message: "too short".to_string(),
                ..request()
            })
            .await
            .unwrap_err();
        assert_validation(err, "Message must be at least 10 characters");

        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_mail_failure_propagates() {
        let service = ContactService::new(Arc::new(RecordingMailer::failing()), "support@example.com");
        let err = service.send(request()).await.unwrap_err();
        assert!(!err.is_client_error());
    }
}
