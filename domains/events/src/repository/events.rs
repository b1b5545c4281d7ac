//! Event repository

use crate::domain::entities::Event;
use regdesk_common::{is_unique_violation, Error, Result};
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const EVENT_COLUMNS: &str = r#"
    id, slug, name, description, min_team_size, max_team_size, fee,
    payment_mode, registration_open, starts_at, created_at, updated_at
"#;

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// List all events, upcoming first
    pub async fn list(&self) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at ASC NULLS LAST, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn create(&self, event: &Event) -> Result<Event> {
        let created = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (id, slug, name, description, min_team_size, max_team_size,
                                fee, payment_mode, registration_open, starts_at,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(&event.slug)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.min_team_size)
        .bind(event.max_team_size)
        .bind(event.fee)
        .bind(event.payment_mode)
        .bind(event.registration_open)
        .bind(event.starts_at)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, Some("events_slug_key")) {
                Error::Conflict(format!("Event slug '{}' already exists", event.slug))
            } else {
                e.into()
            }
        })?;

        Ok(created)
    }

    /// Persist the editable fields of an event
    pub async fn update(&self, event: &Event) -> Result<Event> {
        let updated = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events SET
                name = $2,
                description = $3,
                min_team_size = $4,
                max_team_size = $5,
                fee = $6,
                payment_mode = $7,
                registration_open = $8,
                starts_at = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.min_team_size)
        .bind(event.max_team_size)
        .bind(event.fee)
        .bind(event.payment_mode)
        .bind(event.registration_open)
        .bind(event.starts_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Event not found".to_string()))?;

        Ok(updated)
    }
}
