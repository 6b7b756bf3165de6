// Conducts: one training session joined by PIN

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConductStatus {
    Active,
    Inactive,
}

impl ConductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConductStatus::Active => "active",
            ConductStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ConductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConductStatus::Active),
            "inactive" => Ok(ConductStatus::Inactive),
            other => Err(format!("unknown conduct status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Conduct {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub pin: String,
    pub status: ConductStatus,
    pub created_at: NaiveDateTime,
    pub last_activity_at: Option<NaiveDateTime>,
}

impl Conduct {
    pub fn is_active(&self) -> bool {
        self.status == ConductStatus::Active
    }
}

/// Raw `conducts` row; status is stored as text.
#[derive(Debug, sqlx::FromRow)]
pub struct ConductRow {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub pin: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub last_activity_at: Option<NaiveDateTime>,
}

impl TryFrom<ConductRow> for Conduct {
    type Error = anyhow::Error;

    fn try_from(row: ConductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            pin: row.pin,
            status: row.status.parse().map_err(anyhow::Error::msg)?,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
        })
    }
}
