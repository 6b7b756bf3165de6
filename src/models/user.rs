// Conduct participants (trainers and the conducting body)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::cycle::{CycleState, CycleView, Role, UserStatus};
use crate::domain::zones::Zone;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub conduct_id: i64,
    pub name: String,
    pub role: Role,
    pub location: Option<String>,
    pub cycle: CycleState,
}

impl User {
    pub fn is_trainer(&self) -> bool {
        self.role == Role::Trainer
    }

    pub fn is_conducting_body(&self) -> bool {
        self.role == Role::ConductingBody
    }

    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            user: self.name.clone(),
            role: self.role,
            location: self.location.clone(),
            cycle: CycleView::from(&self.cycle),
        }
    }
}

/// Broadcast and monitor view of a participant.
#[derive(Debug, Clone, Serialize)]
pub struct UserSnapshot {
    pub user: String,
    pub role: Role,
    pub location: Option<String>,
    #[serde(flatten)]
    pub cycle: CycleView,
}

/// Raw `conduct_users` row; enums are stored as text.
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub conduct_id: i64,
    pub name: String,
    pub role: String,
    pub status: String,
    pub zone: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub work_completed: bool,
    pub pending_rest: bool,
    pub most_stringent_zone: Option<String>,
}

fn parse_zone(value: Option<String>) -> anyhow::Result<Option<Zone>> {
    value.map(|z| z.parse::<Zone>()).transpose().map_err(anyhow::Error::from)
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status: UserStatus = row.status.parse().map_err(anyhow::Error::msg)?;

        Ok(Self {
            id: row.id,
            conduct_id: row.conduct_id,
            name: row.name,
            role: row.role.parse().map_err(anyhow::Error::msg)?,
            location: row.location,
            cycle: CycleState {
                status,
                zone: parse_zone(row.zone)?,
                start_time: row.start_time,
                end_time: row.end_time,
                work_completed: row.work_completed,
                pending_rest: row.pending_rest,
                most_stringent_zone: parse_zone(row.most_stringent_zone)?,
            },
        })
    }
}
