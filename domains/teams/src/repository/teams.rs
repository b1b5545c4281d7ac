//! Team repository

use crate::domain::entities::{PublicTeam, RosterEntry, Team};
use regdesk_common::{is_unique_violation, Error, Result};
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) const TEAM_COLUMNS: &str = r#"
    id, event_id, leader_id, name, max_members, code, visibility, created_at, updated_at
"#;

/// Translate a team write failure into the conflict the caller should see
pub fn map_team_write_error(e: sqlx::Error) -> Error {
    if is_unique_violation(&e, Some("teams_event_name_key")) {
        Error::Conflict("A team with this name already exists for this event".to_string())
    } else if is_unique_violation(&e, Some("teams_event_code_key")) {
        Error::Conflict("This team code is already in use".to_string())
    } else if is_unique_violation(&e, Some("teams_leader_key")) {
        Error::Conflict("You already lead a team for this event".to_string())
    } else {
        e.into()
    }
}

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    /// Resolve a team by its code within an event
    pub async fn find_by_code(&self, event_id: Uuid, code: &str) -> Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE event_id = $1 AND code = $2"
        ))
        .bind(event_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    /// The team a participation leads or belongs to
    pub async fn find_for_participation(&self, participation_id: Uuid) -> Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(&format!(
            r#"
            SELECT {TEAM_COLUMNS}
            FROM teams
            WHERE leader_id = $1
               OR id = (SELECT team_id FROM team_members WHERE participation_id = $1)
            "#
        ))
        .bind(participation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    /// Public teams of an event with their leader and member count
    pub async fn list_public(&self, event_id: Uuid) -> Result<Vec<PublicTeam>> {
        let teams = sqlx::query_as::<_, PublicTeam>(
            r#"
            SELECT t.id, t.event_id, t.name, t.max_members,
                   p.full_name AS leader_name,
                   (SELECT COUNT(*) FROM team_members m WHERE m.team_id = t.id) AS member_count,
                   t.created_at
            FROM teams t
            INNER JOIN participations p ON p.id = t.leader_id
            WHERE t.event_id = $1 AND t.visibility = 'public'
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    /// Leader followed by members in join order
    pub async fn roster(&self, team: &Team) -> Result<Vec<RosterEntry>> {
        let entries = sqlx::query_as::<_, RosterEntry>(
            r#"
            SELECT p.id AS participation_id, p.full_name, p.email, p.institution, p.status,
                   NULL::timestamptz AS joined_at
            FROM participations p
            WHERE p.id = $2
            UNION ALL
            SELECT p.id, p.full_name, p.email, p.institution, p.status, m.joined_at
            FROM team_members m
            INNER JOIN participations p ON p.id = m.participation_id
            WHERE m.team_id = $1
            ORDER BY joined_at ASC NULLS FIRST
            "#,
        )
        .bind(team.id)
        .bind(team.leader_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn count_members(&self, team_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE team_id = $1")
            .bind(team_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Persist name, code and visibility
    pub async fn update(&self, team: &Team) -> Result<Team> {
        let updated = sqlx::query_as::<_, Team>(&format!(
            r#"
            UPDATE teams
            SET name = $2, code = $3, visibility = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.code)
        .bind(team.visibility)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_team_write_error)?;

        updated.ok_or_else(|| Error::NotFound("Team not found".to_string()))
    }

    pub async fn code_exists(&self, event_id: Uuid, code: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE event_id = $1 AND code = $2)",
        )
        .bind(event_id)
        .bind(code)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
