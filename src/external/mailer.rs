use crate::config::SmtpConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailKind {
    Otp { code: String },
    PasswordReset { reset_url: String },
    SubscriptionConfirmation,
    /// Contact form submission, delivered to the site's own inbox.
    Contact {
        name: String,
        email: String,
        subject: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub name: Option<String>,
    pub kind: EmailKind,
}

impl EmailMessage {
    pub fn subject(&self) -> String {
        match &self.kind {
            EmailKind::Otp { .. } => "Your One-Time Password".to_string(),
            EmailKind::PasswordReset { .. } => "Reset Your Password".to_string(),
            EmailKind::SubscriptionConfirmation => "Thanks for subscribing!".to_string(),
            EmailKind::Contact { subject, .. } => format!("New contact form submission: {subject}"),
        }
    }

    /// Replies to a contact message go to whoever filled in the form.
    pub fn reply_to(&self) -> Option<&str> {
        match &self.kind {
            EmailKind::Contact { email, .. } => Some(email),
            _ => None,
        }
    }

    pub fn render_html(&self) -> String {
        let name = escape_html(self.name.as_deref().unwrap_or("User"));
        match &self.kind {
            EmailKind::Otp { code } => format!(
                "<p>Hello {name},</p>\
                 <p>Your one-time password is:</p>\
                 <p style=\"font-size:28px;letter-spacing:6px;font-weight:bold\">{code}</p>\
                 <p>This code expires in 10 minutes. If you didn't request it, you can ignore this email.</p>"
            ),
            EmailKind::PasswordReset { reset_url } => {
                let reset_url = escape_html(reset_url);
                format!(
                    "<p>Hello {name},</p>\
                     <p>We received a request to reset your password.</p>\
                     <p><a href=\"{reset_url}\">Reset your password</a></p>\
                     <p>This link expires in 1 hour. If you didn't request a reset, you can ignore this email.</p>"
                )
            }
            EmailKind::SubscriptionConfirmation => "<p>Hello,</p>\
                 <p>You're now subscribed to our newsletter. We'll keep you posted on new features and releases.</p>"
                .to_string(),
            EmailKind::Contact {
                name,
                email,
                subject,
                message,
            } => {
                let (name, email, subject) =
                    (escape_html(name), escape_html(email), escape_html(subject));
                let message = escape_html(message).replace('\n', "<br>");
                format!(
                    "<h2>New Contact Message</h2>\
                     <p><strong>From:</strong> {name} ({email})</p>\
                     <p><strong>Subject:</strong> {subject}</p>\
                     <hr>\
                     <p><strong>Message:</strong></p>\
                     <p>{message}</p>\
                     <hr>\
                     <p>This email was sent from the contact form on your OPTCL website.</p>"
                )
            }
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Port 465 is SMTPS; anything else (587, 25) upgrades with STARTTLS.
fn uses_implicit_tls(port: u16) -> bool {
    port == 465
}

/// Outbound transactional email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let builder = if uses_implicit_tls(config.port) {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        };
        let transport = builder
            .map_err(|e| AppError::ConfigError(format!("Invalid SMTP host {}: {e}", config.host)))?
            .port(config.port)
            .credentials(creds)
            .build();

        let address: Address = config
            .from_address
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid sender address: {e}")))?;

        Ok(Self {
            transport,
            from: Mailbox::new(Some(config.from_name.clone()), address),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::ExternalApiError(format!("Invalid recipient address: {e}")))?;

        let mut builder = Message::builder().from(self.from.clone()).to(to);
        if let Some(reply_to) = message.reply_to() {
            let reply_to: Mailbox = reply_to
                .parse()
                .map_err(|e| AppError::ValidationError(format!("Invalid reply-to address: {e}")))?;
            builder = builder.reply_to(reply_to);
        }

        let email = builder
            .subject(message.subject())
            .header(ContentType::TEXT_HTML)
            .body(message.render_html())
            .map_err(|e| AppError::InternalError(format!("Failed to build email: {e}")))?;

        match self.transport.send(email).await {
            Ok(_) => {
                log::info!("{} email sent to {}", message.subject(), message.to);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to send email to {}: {e}", message.to);
                Err(AppError::ExternalApiError("Failed to send email".to_string()))
            }
        }
    }
}
