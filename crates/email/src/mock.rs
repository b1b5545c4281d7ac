//! Mock Email Service Implementation
//!
//! In-memory email capture for tests and local development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{EmailConfig, EmailError, EmailMessage, EmailReceipt, EmailService};

/// Email captured by the mock service
#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub message: EmailMessage,
    pub receipt: EmailReceipt,
    pub captured_at: DateTime<Utc>,
}

impl CapturedEmail {
    pub fn email_type(&self) -> Option<&str> {
        self.message.email_type()
    }

    /// Team referenced by a join-request notification
    pub fn team_id(&self) -> Option<Uuid> {
        self.message
            .metadata
            .get("team_id")
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}

/// Mock email service for testing
#[derive(Debug, Clone)]
pub struct MockEmailService {
    emails: Arc<Mutex<Vec<CapturedEmail>>>,
    email_by_recipient: Arc<Mutex<HashMap<String, Vec<CapturedEmail>>>>,
    default_from: String,
    app_base_url: String,
    /// When set, every send fails; used to exercise best-effort delivery
    failing: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockEmailService {
    pub fn new() -> Self {
        Self {
            emails: Arc::new(Mutex::new(Vec::new())),
            email_by_recipient: Arc::new(Mutex::new(HashMap::new())),
            default_from: "noreply@regdesk.app".to_string(),
            app_base_url: "https://regdesk.app".to_string(),
            failing: false,
        }
    }

    pub fn with_config(config: EmailConfig) -> Self {
        Self {
            default_from: config.default_from,
            app_base_url: config.app_base_url,
            ..Self::new()
        }
    }

    /// A mock whose sends always fail
    pub fn new_failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn get_all_emails(&self) -> Vec<CapturedEmail> {
        lock(&self.emails).clone()
    }

    pub fn get_emails_for_recipient(&self, email: &str) -> Vec<CapturedEmail> {
        lock(&self.email_by_recipient)
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    /// Most recent email of the given type sent to a recipient
    pub fn latest_of_type(&self, email: &str, email_type: &str) -> Option<CapturedEmail> {
        self.get_emails_for_recipient(email)
            .into_iter()
            .filter(|e| e.email_type() == Some(email_type))
            .max_by_key(|e| e.captured_at)
    }

    pub fn email_count(&self) -> usize {
        lock(&self.emails).len()
    }

    pub fn clear(&self) {
        lock(&self.emails).clear();
        lock(&self.email_by_recipient).clear();
    }
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        if self.failing {
            return Err(EmailError::AwsSes("mock delivery failure".to_string()));
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Mock email service capturing email");

        let receipt = EmailReceipt {
            message_id: format!("mock-{}", Uuid::new_v4()),
            sent_at: Utc::now(),
            provider: "mock".to_string(),
            metadata: message.metadata.clone(),
        };

        let captured = CapturedEmail {
            message: message.clone(),
            receipt: receipt.clone(),
            captured_at: Utc::now(),
        };

        lock(&self.emails).push(captured.clone());

        lock(&self.email_by_recipient)
            .entry(message.to)
            .or_default()
            .push(captured);

        Ok(receipt)
    }

    fn default_from(&self) -> String {
        self.default_from.clone()
    }

    fn app_base_url(&self) -> &str {
        &self.app_base_url
    }
}
