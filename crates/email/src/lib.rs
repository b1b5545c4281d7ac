//! Regdesk Email Service
//!
//! Outbound notifications for the registration workflows:
//! - AWS SES integration for production email delivery
//! - Mock email service capturing messages in memory for tests
//! - LocalStack support through a custom endpoint URL

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod aws_ses;
pub mod content;
pub mod mock;

pub use aws_ses::SesEmailService;
pub use mock::{CapturedEmail, MockEmailService};

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email configuration error: {0}")]
    Configuration(String),

    #[error("Email validation error: {0}")]
    Validation(String),

    #[error("AWS SES error: {0}")]
    AwsSes(String),
}

/// Email message to be sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl EmailMessage {
    pub fn new(to: String, from: String, subject: String, body_text: String) -> Self {
        Self {
            to,
            from,
            reply_to: None,
            subject,
            body_text,
            body_html: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_html(mut self, body_html: String) -> Self {
        self.body_html = Some(body_html);
        self
    }

    pub fn with_reply_to(mut self, reply_to: String) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Add metadata for tracking
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Kind of notification, as tagged by the `EmailService` helpers
    pub fn email_type(&self) -> Option<&str> {
        self.metadata.get("email_type").map(String::as_str)
    }
}

/// Email delivery receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
    pub provider: String,
    pub metadata: HashMap<String, String>,
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Email service provider (ses, mock)
    pub provider: String,
    pub aws_region: Option<String>,
    /// AWS endpoint URL (for LocalStack)
    pub aws_endpoint_url: Option<String>,
    pub default_from: String,
    /// Enable email sending (can disable for testing)
    pub enabled: bool,
    /// Base URL of the participant portal, used in links
    pub app_base_url: String,
}

impl EmailConfig {
    pub fn from_env() -> Result<Self, EmailError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "mock".to_string());

        let aws_region = std::env::var("AWS_REGION").ok();
        let aws_endpoint_url = std::env::var("AWS_ENDPOINT_URL").ok();

        let default_from =
            std::env::var("FROM_EMAIL").unwrap_or_else(|_| "noreply@regdesk.app".to_string());

        let enabled = std::env::var("EMAIL_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let app_base_url =
            std::env::var("APP_BASE_URL").unwrap_or_else(|_| "https://regdesk.app".to_string());

        if !default_from.contains('@') {
            return Err(EmailError::Configuration(format!(
                "FROM_EMAIL is not an email address: {}",
                default_from
            )));
        }

        Ok(Self {
            provider,
            aws_region,
            aws_endpoint_url,
            default_from,
            enabled,
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Email service trait for different implementations
#[async_trait::async_trait]
pub trait EmailService: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError>;

    /// Return the default "from" address for outgoing emails
    fn default_from(&self) -> String;

    /// Return the application base URL for building links
    fn app_base_url(&self) -> &str;

    /// Tell a participant their payment was verified and their seat is confirmed
    async fn send_payment_confirmed(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        event_name: &str,
        participation_id: Uuid,
    ) -> Result<EmailReceipt, EmailError> {
        let subject = format!("Registration confirmed: {}", event_name);
        let link = format!("{}/participations/{}", self.app_base_url(), participation_id);

        let message = EmailMessage::new(
            recipient_email.to_string(),
            self.default_from(),
            subject,
            content::payment_confirmed_text(recipient_name, event_name, &link),
        )
        .with_html(content::payment_confirmed_html(recipient_name, event_name, &link))
        .with_metadata("email_type", "payment_confirmed")
        .with_metadata("participation_id", participation_id);

        self.send_email(message).await
    }

    /// Tell a participant their payment proof was rejected
    async fn send_payment_rejected(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        event_name: &str,
        participation_id: Uuid,
        reason: &str,
    ) -> Result<EmailReceipt, EmailError> {
        let subject = format!("Payment not accepted: {}", event_name);
        let link = format!("{}/participations/{}", self.app_base_url(), participation_id);

        let message = EmailMessage::new(
            recipient_email.to_string(),
            self.default_from(),
            subject,
            content::payment_rejected_text(recipient_name, event_name, reason, &link),
        )
        .with_metadata("email_type", "payment_rejected")
        .with_metadata("participation_id", participation_id);

        self.send_email(message).await
    }

    /// Notify a team leader about a new join request
    async fn send_join_request_received(
        &self,
        leader_email: &str,
        team_name: &str,
        team_id: Uuid,
        requester_name: &str,
        request_message: Option<&str>,
    ) -> Result<EmailReceipt, EmailError> {
        let subject = format!("New request to join {}", team_name);
        let link = format!("{}/teams/{}/join-requests", self.app_base_url(), team_id);

        let message = EmailMessage::new(
            leader_email.to_string(),
            self.default_from(),
            subject,
            content::join_request_received_text(team_name, requester_name, request_message, &link),
        )
        .with_metadata("email_type", "join_request_received")
        .with_metadata("team_id", team_id);

        self.send_email(message).await
    }

    /// Tell a requester whether the leader approved or rejected their request
    async fn send_join_request_decided(
        &self,
        requester_email: &str,
        requester_name: &str,
        team_name: &str,
        team_id: Uuid,
        approved: bool,
    ) -> Result<EmailReceipt, EmailError> {
        let subject = if approved {
            format!("You joined {}", team_name)
        } else {
            format!("Your request to join {} was declined", team_name)
        };

        let message = EmailMessage::new(
            requester_email.to_string(),
            self.default_from(),
            subject,
            content::join_request_decided_text(requester_name, team_name, approved),
        )
        .with_metadata(
            "email_type",
            if approved {
                "join_request_approved"
            } else {
                "join_request_rejected"
            },
        )
        .with_metadata("team_id", team_id);

        self.send_email(message).await
    }
}

/// Email service factory
pub struct EmailServiceFactory;

impl EmailServiceFactory {
    /// Create email service based on configuration
    pub async fn create(config: EmailConfig) -> Result<Arc<dyn EmailService>, EmailError> {
        if !config.enabled {
            tracing::info!("Email service disabled, using mock implementation");
            return Ok(Arc::new(mock::MockEmailService::with_config(config)));
        }

        match config.provider.as_str() {
            "ses" | "aws-ses" => {
                tracing::info!("Creating AWS SES email service");
                let ses_service = aws_ses::SesEmailService::new(config).await?;
                Ok(Arc::new(ses_service))
            }
            "mock" => {
                tracing::info!("Creating mock email service");
                Ok(Arc::new(mock::MockEmailService::with_config(config)))
            }
            provider => Err(EmailError::Configuration(format!(
                "Unknown email provider: {}. Supported providers: ses, mock",
                provider
            ))),
        }
    }
}
