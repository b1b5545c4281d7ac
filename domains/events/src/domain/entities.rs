//! Domain entities for the events domain
//!
//! Events and participations. Participations carry a profile snapshot and
//! the payment metadata reviewed by administrators. User accounts are read
//! through `regdesk_auth::AuthIdentity`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use regdesk_common::{Error, Result, StorageConfig};

use crate::domain::state::{
    ParticipationEvent, ParticipationGuardContext, ParticipationStateMachine,
};
use crate::domain::validation::{validate_event_slug, validate_phone};

/// Largest team size an event may allow (leader included)
pub const MAX_TEAM_SIZE: i32 = 50;

/// Maximum display name length (varchar(200))
const MAX_NAME_LENGTH: usize = 200;

/// Who pays the registration fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "payment_mode", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Every participant pays for themselves
    #[default]
    Individual,
    /// The team leader pays for the whole team
    Team,
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMode::Individual => write!(f, "individual"),
            PaymentMode::Team => write!(f, "team"),
        }
    }
}

/// Event entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    /// Team size bounds, leader included; 1 means a solo event
    pub min_team_size: i32,
    pub max_team_size: i32,
    pub fee: Decimal,
    pub payment_mode: PaymentMode,
    pub registration_open: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(slug: String, name: String, fee: Decimal, max_team_size: i32) -> Result<Self> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            slug,
            name,
            description: None,
            min_team_size: 1,
            max_team_size,
            fee,
            payment_mode: PaymentMode::default(),
            registration_open: true,
            starts_at: None,
            created_at: now,
            updated_at: now,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn validate(&self) -> Result<()> {
        if !validate_event_slug(&self.slug) {
            return Err(Error::Validation(
                "Slug must be lowercase letters, digits and single hyphens".to_string(),
            ));
        }

        let name = self.name.trim();
        if name.is_empty() || name.len() > MAX_NAME_LENGTH {
            return Err(Error::Validation(format!(
                "Event name must be 1-{} characters",
                MAX_NAME_LENGTH
            )));
        }

        if self.fee.is_sign_negative() {
            return Err(Error::Validation("Fee cannot be negative".to_string()));
        }

        if self.min_team_size < 1
            || self.max_team_size < self.min_team_size
            || self.max_team_size > MAX_TEAM_SIZE
        {
            return Err(Error::Validation(format!(
                "Team size must satisfy 1 <= min <= max <= {}",
                MAX_TEAM_SIZE
            )));
        }

        if self.payment_mode == PaymentMode::Team && !self.allows_teams() {
            return Err(Error::Validation(
                "Team payment mode requires an event that allows teams".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_free(&self) -> bool {
        self.fee.is_zero()
    }

    pub fn allows_teams(&self) -> bool {
        self.max_team_size > 1
    }

    /// Status a new participation starts in
    pub fn initial_status(&self) -> ParticipationStatus {
        if self.is_free() {
            ParticipationStatus::Registered
        } else {
            ParticipationStatus::PendingPayment
        }
    }

    /// Amount owed by a payer covering `seats` participants
    pub fn amount_due(&self, seats: i64) -> Decimal {
        self.fee * Decimal::from(seats.max(1))
    }
}

/// Participation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipationStatus {
    Registered,
    PendingPayment,
    PaymentSubmitted,
    Confirmed,
    Cancelled,
}

impl ParticipationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => write!(f, "REGISTERED"),
            Self::PendingPayment => write!(f, "PENDING_PAYMENT"),
            Self::PaymentSubmitted => write!(f, "PAYMENT_SUBMITTED"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Contact details captured at registration time.
///
/// Copied onto join requests so team leaders see who is asking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileSnapshot {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub institution: Option<String>,
}

impl ProfileSnapshot {
    pub fn validate(&self) -> Result<()> {
        let name = self.full_name.trim();
        if name.is_empty() || name.len() > MAX_NAME_LENGTH {
            return Err(Error::Validation(format!(
                "Full name must be 1-{} characters",
                MAX_NAME_LENGTH
            )));
        }
        if !self.email.validate_email() {
            return Err(Error::Validation("Invalid email format".to_string()));
        }
        if let Some(ref phone) = self.phone {
            if !validate_phone(phone) {
                return Err(Error::Validation("Invalid phone number".to_string()));
            }
        }
        if let Some(ref institution) = self.institution {
            if institution.len() > MAX_NAME_LENGTH {
                return Err(Error::Validation(format!(
                    "Institution must be at most {} characters",
                    MAX_NAME_LENGTH
                )));
            }
        }
        Ok(())
    }
}

/// A user's registration record for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: ProfileSnapshot,
    pub status: ParticipationStatus,
    pub amount: Option<Decimal>,
    pub transaction_id: Option<String>,
    pub screenshot_key: Option<String>,
    pub payment_submitted_at: Option<DateTime<Utc>>,
    pub payment_verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participation {
    pub fn new(user_id: Uuid, event: &Event, profile: ProfileSnapshot) -> Result<Self> {
        profile.validate()?;

        let now = Utc::now();
        Ok(Participation {
            id: Uuid::new_v4(),
            user_id,
            event_id: event.id,
            profile,
            status: event.initial_status(),
            amount: None,
            transaction_id: None,
            screenshot_key: None,
            payment_submitted_at: None,
            payment_verified_at: None,
            verified_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Compute the next status for `event` without mutating
    pub fn next_status(
        &self,
        event: ParticipationEvent,
        context: Option<&ParticipationGuardContext>,
    ) -> Result<ParticipationStatus> {
        Ok(ParticipationStateMachine::transition(self.status, event, context)?)
    }

    /// Record a payment proof
    pub fn submit_payment(
        &mut self,
        amount: Decimal,
        transaction_id: String,
        screenshot_key: String,
    ) -> Result<()> {
        self.status = self.next_status(ParticipationEvent::SubmitPayment, None)?;
        self.amount = Some(amount);
        self.transaction_id = Some(transaction_id);
        self.screenshot_key = Some(screenshot_key);
        self.payment_submitted_at = Some(Utc::now());
        self.rejection_reason = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn verify_payment(&mut self, verified_by: Uuid) -> Result<()> {
        self.status = self.next_status(ParticipationEvent::VerifyPayment, None)?;
        self.payment_verified_at = Some(Utc::now());
        self.verified_by = Some(verified_by);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Confirm a free registration
    pub fn confirm(&mut self, confirmed_by: Uuid) -> Result<()> {
        self.status = self.next_status(ParticipationEvent::Confirm, None)?;
        self.payment_verified_at = Some(Utc::now());
        self.verified_by = Some(confirmed_by);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn reject_payment(&mut self, reason: String) -> Result<()> {
        if reason.trim().is_empty() {
            return Err(Error::Validation("Rejection reason is required".to_string()));
        }
        self.status = self.next_status(ParticipationEvent::RejectPayment, None)?;
        self.rejection_reason = Some(reason);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.status = self.next_status(ParticipationEvent::Cancel, None)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Public URL of the uploaded payment screenshot
    pub fn payment_proof_url(&self, storage: &StorageConfig) -> Option<String> {
        self.screenshot_key
            .as_deref()
            .map(|key| storage.object_url(key))
    }

    /// Replace the contact details; not allowed once cancelled
    pub fn update_profile(&mut self, profile: ProfileSnapshot) -> Result<()> {
        if !self.is_active() {
            return Err(Error::Conflict(
                "Cannot edit a cancelled registration".to_string(),
            ));
        }
        profile.validate()?;
        self.profile = profile;
        self.updated_at = Utc::now();
        Ok(())
    }
}
