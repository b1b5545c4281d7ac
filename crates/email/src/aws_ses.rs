//! AWS SES Email Service Implementation
//!
//! Production email delivery through AWS Simple Email Service (SES),
//! with support for a LocalStack endpoint.

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_ses::config::SharedCredentialsProvider;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use aws_sdk_ses::Client as SesClient;
use chrono::Utc;

use crate::{EmailConfig, EmailError, EmailMessage, EmailReceipt, EmailService};

/// AWS SES email service implementation
pub struct SesEmailService {
    client: SesClient,
    config: EmailConfig,
}

impl SesEmailService {
    pub async fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let region = config
            .aws_region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let aws_config = match config.aws_endpoint_url.as_ref() {
            Some(endpoint_url) => {
                tracing::info!(endpoint_url = %endpoint_url, "Using custom AWS endpoint");

                // LocalStack accepts any static credentials
                let credentials = Credentials::new(
                    "test-access-key",
                    "test-secret-key",
                    None,
                    None,
                    "localstack-email-provider",
                );

                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .endpoint_url(endpoint_url)
                    .credentials_provider(SharedCredentialsProvider::new(credentials))
                    .load()
                    .await
            }
            None => {
                aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .load()
                    .await
            }
        };

        let client = SesClient::new(&aws_config);

        Ok(Self { client, config })
    }
}

fn utf8_content(data: &str, part: &str) -> Result<Content, EmailError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| EmailError::AwsSes(format!("Failed to build {}: {}", part, e)))
}

/// Convert an email message to the SES wire shape
fn build_ses_message(message: &EmailMessage) -> Result<Message, EmailError> {
    let subject = utf8_content(&message.subject, "subject")?;
    let mut body_builder = Body::builder().text(utf8_content(&message.body_text, "text content")?);

    if let Some(html_body) = &message.body_html {
        body_builder = body_builder.html(utf8_content(html_body, "HTML content")?);
    }

    Ok(Message::builder()
        .subject(subject)
        .body(body_builder.build())
        .build())
}

fn validate_addresses(message: &EmailMessage) -> Result<(), EmailError> {
    if !message.to.contains('@') || !message.from.contains('@') {
        return Err(EmailError::Validation(
            "Invalid email address format".to_string(),
        ));
    }
    Ok(())
}

#[async_trait::async_trait]
impl EmailService for SesEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        validate_addresses(&message)?;

        tracing::info!(to = %message.to, "Sending email via AWS SES");

        let ses_message = build_ses_message(&message)?;
        let destination = Destination::builder().to_addresses(&message.to).build();

        let mut send_builder = self
            .client
            .send_email()
            .source(&message.from)
            .destination(destination)
            .message(ses_message);

        if let Some(reply_to) = &message.reply_to {
            send_builder = send_builder.reply_to_addresses(reply_to);
        }

        let result = send_builder
            .send()
            .await
            .map_err(|e| EmailError::AwsSes(format!("Failed to send email: {}", e)))?;

        let message_id = result.message_id().to_string();

        tracing::info!(message_id = %message_id, "Email sent via SES");

        Ok(EmailReceipt {
            message_id,
            sent_at: Utc::now(),
            provider: "aws-ses".to_string(),
            metadata: message.metadata.clone(),
        })
    }

    fn default_from(&self) -> String {
        self.config.default_from.clone()
    }

    fn app_base_url(&self) -> &str {
        &self.config.app_base_url
    }
}
