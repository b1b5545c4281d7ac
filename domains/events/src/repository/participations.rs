//! Participation repository

use crate::domain::entities::{Participation, ParticipationStatus, ProfileSnapshot};
use regdesk_common::{is_unique_violation, Error, Result};
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const PARTICIPATION_COLUMNS: &str = r#"
    id, user_id, event_id, full_name, email, phone, institution, status,
    amount, transaction_id, screenshot_key, payment_submitted_at,
    payment_verified_at, verified_by, rejection_reason, created_at, updated_at
"#;

#[derive(Clone)]
pub struct ParticipationRepository {
    pool: PgPool,
}

impl ParticipationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Participation>> {
        let row = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// The caller's registration for one event
    pub async fn find_by_user_and_event(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Participation>> {
        let row = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE user_id = $1 AND event_id = $2"
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Participation>> {
        let rows = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Page through an event's participations, optionally filtered by status
    pub async fn list_by_event(
        &self,
        event_id: Uuid,
        status: Option<ParticipationStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Participation>> {
        let rows = sqlx::query_as::<_, Participation>(&format!(
            r#"
            SELECT {PARTICIPATION_COLUMNS}
            FROM participations
            WHERE event_id = $1 AND ($2::participation_status IS NULL OR status = $2)
            ORDER BY created_at ASC, id ASC
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(event_id)
        .bind(status)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_by_event(
        &self,
        event_id: Uuid,
        status: Option<ParticipationStatus>,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM participations
            WHERE event_id = $1 AND ($2::participation_status IS NULL OR status = $2)
            "#,
        )
        .bind(event_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn create(&self, participation: &Participation) -> Result<Participation> {
        let created = sqlx::query_as::<_, Participation>(&format!(
            r#"
            INSERT INTO participations (id, user_id, event_id, full_name, email, phone,
                                        institution, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PARTICIPATION_COLUMNS}
            "#
        ))
        .bind(participation.id)
        .bind(participation.user_id)
        .bind(participation.event_id)
        .bind(&participation.profile.full_name)
        .bind(&participation.profile.email)
        .bind(&participation.profile.phone)
        .bind(&participation.profile.institution)
        .bind(participation.status)
        .bind(participation.created_at)
        .bind(participation.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, Some("participations_user_event_key")) {
                Error::Conflict("Already registered for this event".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(created)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        profile: &ProfileSnapshot,
    ) -> Result<Participation> {
        let updated = sqlx::query_as::<_, Participation>(&format!(
            r#"
            UPDATE participations SET
                full_name = $2,
                email = $3,
                phone = $4,
                institution = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PARTICIPATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.institution)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Participation not found".to_string()))?;

        Ok(updated)
    }
}
