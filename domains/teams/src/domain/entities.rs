//! Domain entities for the teams domain
//!
//! A team belongs to one event and is led by a participation. Members are
//! other participations of the same event. The leader is not a
//! `team_members` row, so a team of `n` people has `n - 1` member rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use regdesk_common::{Error, Result};
use regdesk_events::{Event, Participation, ParticipationStatus, ProfileSnapshot};

use crate::domain::state::{JoinRequestEvent, JoinRequestGuardContext, JoinRequestStateMachine};
use crate::domain::validation::{
    normalize_team_code, validate_team_name, MAX_TEAM_NAME_LENGTH, MIN_TEAM_NAME_LENGTH,
};

/// Whether a team shows up in the public listing and accepts direct joins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "team_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamVisibility {
    #[default]
    Public,
    /// Reachable only through its code
    Private,
}

impl std::fmt::Display for TeamVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamVisibility::Public => write!(f, "public"),
            TeamVisibility::Private => write!(f, "private"),
        }
    }
}

/// Team entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub event_id: Uuid,
    /// Participation of the leader
    pub leader_id: Uuid,
    pub name: String,
    /// Team size including the leader, fixed at creation
    pub max_members: i32,
    pub code: Option<String>,
    pub visibility: TeamVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn new(
        event: &Event,
        leader: &Participation,
        name: &str,
        code: Option<String>,
        visibility: TeamVisibility,
    ) -> Result<Self> {
        if !event.allows_teams() {
            return Err(Error::Validation(
                "This event does not allow teams".to_string(),
            ));
        }
        if leader.event_id != event.id {
            return Err(Error::Validation(
                "Participation belongs to another event".to_string(),
            ));
        }

        let now = Utc::now();
        let mut team = Team {
            id: Uuid::new_v4(),
            event_id: event.id,
            leader_id: leader.id,
            name: String::new(),
            max_members: event.max_team_size,
            code: None,
            visibility,
            created_at: now,
            updated_at: now,
        };
        team.rename(name)?;
        if let Some(code) = code {
            team.set_code(&code)?;
        }
        Ok(team)
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        if !validate_team_name(name) {
            return Err(Error::Validation(format!(
                "Team name must be {}-{} characters",
                MIN_TEAM_NAME_LENGTH, MAX_TEAM_NAME_LENGTH
            )));
        }
        self.name = name.trim().to_string();
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_code(&mut self, code: &str) -> Result<()> {
        let code = normalize_team_code(code).ok_or_else(|| {
            Error::Validation("Team code must be 4-12 letters or digits".to_string())
        })?;
        self.code = Some(code);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_leader(&self, participation_id: Uuid) -> bool {
        self.leader_id == participation_id
    }

    pub fn is_public(&self) -> bool {
        self.visibility == TeamVisibility::Public
    }

    /// Whether one more member fits, given the current member row count
    pub fn has_capacity(&self, member_count: i64) -> bool {
        member_count + 1 < i64::from(self.max_members)
    }

    pub fn free_slots(&self, member_count: i64) -> i64 {
        (i64::from(self.max_members) - 1 - member_count).max(0)
    }
}

/// Membership of a non-leader participation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub participation_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl TeamMember {
    pub fn new(team_id: Uuid, participation_id: Uuid) -> Self {
        TeamMember {
            id: Uuid::new_v4(),
            team_id,
            participation_id,
            joined_at: Utc::now(),
        }
    }
}

/// Caller's role within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Leader,
    Member,
}

/// Join request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "join_request_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl JoinRequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for JoinRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Application from a participation to join a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamJoinRequest {
    pub id: Uuid,
    pub team_id: Uuid,
    pub participation_id: Uuid,
    /// Requester's contact details when the request was made
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: ProfileSnapshot,
    pub message: Option<String>,
    pub status: JoinRequestStatus,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TeamJoinRequest {
    pub fn new(team: &Team, requester: &Participation, message: Option<String>) -> Result<Self> {
        if requester.event_id != team.event_id {
            return Err(Error::Validation(
                "Team belongs to another event".to_string(),
            ));
        }
        if team.is_leader(requester.id) {
            return Err(Error::Conflict("You already lead this team".to_string()));
        }

        Ok(TeamJoinRequest {
            id: Uuid::new_v4(),
            team_id: team.id,
            participation_id: requester.id,
            profile: requester.profile.clone(),
            message: message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            status: JoinRequestStatus::Pending,
            responded_at: None,
            created_at: Utc::now(),
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == JoinRequestStatus::Pending
    }

    /// Approve, given the team's current member row count
    pub fn approve(&mut self, team: &Team, member_count: i64) -> Result<()> {
        let ctx = JoinRequestGuardContext {
            has_capacity: team.has_capacity(member_count),
        };
        self.status =
            JoinRequestStateMachine::transition(self.status, JoinRequestEvent::Approve, Some(&ctx))?;
        self.responded_at = Some(Utc::now());
        Ok(())
    }

    pub fn reject(&mut self) -> Result<()> {
        self.status = JoinRequestStateMachine::transition(self.status, JoinRequestEvent::Reject, None)?;
        self.responded_at = Some(Utc::now());
        Ok(())
    }
}

/// Public listing entry; never carries the team code
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PublicTeam {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub max_members: i32,
    pub leader_name: String,
    /// Member rows, leader excluded
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

impl PublicTeam {
    pub fn free_slots(&self) -> i64 {
        (i64::from(self.max_members) - 1 - self.member_count).max(0)
    }
}

/// A person on a team roster
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RosterEntry {
    pub participation_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub institution: Option<String>,
    pub status: ParticipationStatus,
    /// `None` for the leader
    pub joined_at: Option<DateTime<Utc>>,
}

/// Join request together with the team it targets
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct JoinRequestWithTeam {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: TeamJoinRequest,
    pub team_name: String,
}
