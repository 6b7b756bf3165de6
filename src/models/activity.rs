// Conduct activity log

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::clock::{detail_time, history_time};

/// Username recorded for entries produced by the server itself.
pub const SYSTEM_USER: &str = "SYSTEM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    UserJoined,
    StartWork,
    StartRest,
    CompletedWork,
    CompletedRest,
    EarlyCompletion,
    InterfaceReset,
    ClearCommands,
    UserRemoved,
    ConductDeactivated,
    ConductReactivated,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::UserJoined => "user_joined",
            ActivityAction::StartWork => "start_work",
            ActivityAction::StartRest => "start_rest",
            ActivityAction::CompletedWork => "completed_work",
            ActivityAction::CompletedRest => "completed_rest",
            ActivityAction::EarlyCompletion => "early_completion",
            ActivityAction::InterfaceReset => "interface_reset",
            ActivityAction::ClearCommands => "clear_commands",
            ActivityAction::UserRemoved => "user_removed",
            ActivityAction::ConductDeactivated => "conduct_deactivated",
            ActivityAction::ConductReactivated => "conduct_reactivated",
        }
    }

    /// Details used when the caller supplies none. Only some actions have a template.
    pub fn default_details(&self, zone: Option<&str>, at: NaiveDateTime) -> Option<String> {
        let zone: &str = zone.unwrap_or("None");
        let time: String = detail_time(at);

        match self {
            ActivityAction::UserJoined => Some(format!("User joined conduct at {time}")),
            ActivityAction::StartRest => Some(format!("Started rest period for {zone} zone at {time}")),
            ActivityAction::CompletedRest => Some(format!("Completed rest period for {zone} zone at {time}")),
            ActivityAction::CompletedWork => Some(format!("Completed work cycle for {zone} zone at {time}")),
            ActivityAction::EarlyCompletion => Some(format!("Cycle ended early by user at {time}")),
            ActivityAction::InterfaceReset => Some(format!("Trainer interface reset at {time}")),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivityLog {
    pub id: i64,
    pub conduct_id: i64,
    pub username: String,
    pub action: String,
    pub zone: Option<String>,
    pub details: Option<String>,
    pub timestamp: NaiveDateTime,
}

/// History line shown on monitors.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub username: String,
    pub action: String,
    pub zone: Option<String>,
    pub details: Option<String>,
}

impl From<ActivityLog> for HistoryEntry {
    fn from(log: ActivityLog) -> Self {
        Self {
            timestamp: history_time(log.timestamp),
            username: log.username,
            action: log.action,
            zone: log.zone,
            details: log.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn templates_fill_zone_and_time() {
        assert_eq!(
            ActivityAction::StartRest.default_details(Some("red"), at(14, 15, 0)).as_deref(),
            Some("Started rest period for red zone at 02:15:00 PM")
        );
        assert_eq!(
            ActivityAction::EarlyCompletion.default_details(None, at(9, 0, 5)).as_deref(),
            Some("Cycle ended early by user at 09:00:05 AM")
        );
    }

    #[test]
    fn actions_without_template_have_no_default() {
        assert_eq!(ActivityAction::StartWork.default_details(Some("red"), at(9, 0, 0)), None);
        assert_eq!(ActivityAction::ConductDeactivated.default_details(None, at(9, 0, 0)), None);
    }

    #[test]
    fn history_entry_uses_twelve_hour_clock() {
        let entry: HistoryEntry = ActivityLog {
            id: 1,
            conduct_id: 2,
            username: "alpha".into(),
            action: ActivityAction::StartWork.to_string(),
            zone: Some("green".into()),
            details: None,
            timestamp: at(13, 4, 5),
        }
        .into();

        assert_eq!(entry.timestamp, "2025-06-01 01:04:05 PM");
        assert_eq!(entry.action, "start_work");
    }
}
