// Wire format of WebSocket frames: {"event": name, "data": payload}

use serde::{Deserialize, Serialize};

use crate::domain::system_status::SystemStatus;
use crate::models::{HistoryEntry, UserSnapshot};

/// Events pushed from the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    UserUpdate(UserSnapshot),
    SystemStatusUpdate(SystemStatus),
    HistoryUpdate(HistoryUpdate),
    ShowWorkCompleteModal(WorkCompleteModal),
    WorkCycleCompleted {
        username: String,
        zone: Option<String>,
        rest_time: f64,
        action: &'static str,
    },
    RestCycleCompleted {
        user: String,
        zone: Option<String>,
        action: &'static str,
    },
    ForceHistoryRefresh {
        conduct_id: i64,
        message: String,
        action: &'static str,
    },
    UserRemoved {
        user: String,
    },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::UserUpdate(_) => "user_update",
            ServerEvent::SystemStatusUpdate(_) => "system_status_update",
            ServerEvent::HistoryUpdate(_) => "history_update",
            ServerEvent::ShowWorkCompleteModal(_) => "show_work_complete_modal",
            ServerEvent::WorkCycleCompleted { .. } => "work_cycle_completed",
            ServerEvent::RestCycleCompleted { .. } => "rest_cycle_completed",
            ServerEvent::ForceHistoryRefresh { .. } => "force_history_refresh",
            ServerEvent::UserRemoved { .. } => "user_removed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryUpdate {
    pub history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conduct_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkCompleteModal {
    pub username: String,
    pub zone: Option<String>,
    /// Minutes of rest the participant now owes.
    pub rest_duration: f64,
    pub title: &'static str,
    pub message: &'static str,
}

/// Frames a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinConduct { conduct_id: i64 },
    LeaveConduct { conduct_id: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn server_events_are_adjacently_tagged() {
        let event: ServerEvent = ServerEvent::UserRemoved { user: "alpha".into() };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "event": "user_removed", "data": { "user": "alpha" } })
        );
        assert_eq!(event.name(), "user_removed");
    }

    #[test]
    fn history_update_omits_absent_trigger() {
        let event: ServerEvent = ServerEvent::HistoryUpdate(HistoryUpdate {
            history: Vec::new(),
            conduct_id: None,
            trigger: None,
        });
        let value: Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "history_update");
        assert_eq!(value["data"], json!({ "history": [] }));
    }

    #[test]
    fn client_messages_parse() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"event":"join_conduct","data":{"conduct_id":4}}"#).unwrap();
        assert_eq!(join, ClientMessage::JoinConduct { conduct_id: 4 });

        assert!(serde_json::from_str::<ClientMessage>(r#"{"event":"shout","data":{}}"#).is_err());
    }
}
