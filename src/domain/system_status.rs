// Per-conduct cut-off state kept in memory

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::domain::clock::clock_string;

/// Length of the mandatory rest that follows a lifted cut-off.
pub const MANDATORY_REST_MINUTES: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    pub cut_off: bool,
    #[serde(serialize_with = "clock_string::serialize")]
    pub cut_off_end_time: Option<NaiveDateTime>,
}

/// What a toggle did, so callers know how to move the trainers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutOffTransition {
    /// Cut-off switched on; trainers stop where they are.
    Activated,
    /// Cut-off lifted; trainers enter mandatory rest until the given time.
    Lifted { rest_until: NaiveDateTime },
}

impl SystemStatus {
    pub fn toggle(&mut self, now: NaiveDateTime) -> CutOffTransition {
        if self.cut_off {
            let rest_until: NaiveDateTime = now + mandatory_rest();
            self.cut_off = false;
            self.cut_off_end_time = Some(rest_until);
            CutOffTransition::Lifted { rest_until }
        } else {
            self.cut_off = true;
            self.cut_off_end_time = None;
            CutOffTransition::Activated
        }
    }
}

pub fn mandatory_rest() -> Duration {
    Duration::minutes(MANDATORY_REST_MINUTES)
}

/// Concurrent map of conduct id to its system status. Conducts never seen
/// report the default (no cut-off, no mandatory rest).
#[derive(Debug, Clone, Default)]
pub struct ConductStatusRegistry {
    statuses: Arc<RwLock<HashMap<i64, SystemStatus>>>,
}

impl ConductStatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, conduct_id: i64) -> SystemStatus {
        let statuses: tokio::sync::RwLockReadGuard<'_, HashMap<i64, SystemStatus>> = self.statuses.read().await;
        statuses.get(&conduct_id).cloned().unwrap_or_default()
    }

    /// Applies `f` to the conduct's status under the write lock and returns its result
    /// together with the updated status.
    pub async fn update<F, T>(&self, conduct_id: i64, f: F) -> (T, SystemStatus)
    where
        F: FnOnce(&mut SystemStatus) -> T,
    {
        let mut statuses: tokio::sync::RwLockWriteGuard<'_, HashMap<i64, SystemStatus>> = self.statuses.write().await;
        let status: &mut SystemStatus = statuses.entry(conduct_id).or_default();
        let result: T = f(status);
        (result, status.clone())
    }

    pub async fn reset(&self, conduct_id: i64) -> SystemStatus {
        let mut statuses: tokio::sync::RwLockWriteGuard<'_, HashMap<i64, SystemStatus>> = self.statuses.write().await;
        statuses.remove(&conduct_id);
        SystemStatus::default()
    }

    pub async fn forget(&self, conduct_ids: &[i64]) {
        let mut statuses: tokio::sync::RwLockWriteGuard<'_, HashMap<i64, SystemStatus>> = self.statuses.write().await;
        for id in conduct_ids {
            statuses.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn toggle_alternates_between_cut_off_and_mandatory_rest() {
        let mut status: SystemStatus = SystemStatus::default();

        assert_eq!(status.toggle(at(10, 0, 0)), CutOffTransition::Activated);
        assert!(status.cut_off);
        assert_eq!(status.cut_off_end_time, None);

        let transition: CutOffTransition = status.toggle(at(10, 5, 0));
        assert_eq!(transition, CutOffTransition::Lifted { rest_until: at(10, 35, 0) });
        assert!(!status.cut_off);
        assert_eq!(status.cut_off_end_time, Some(at(10, 35, 0)));
    }

    #[test]
    fn serializes_end_time_as_clock_string() {
        let status: SystemStatus = SystemStatus { cut_off: false, cut_off_end_time: Some(at(23, 50, 1)) };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({ "cut_off": false, "cut_off_end_time": "23:50:01" })
        );
        assert_eq!(
            serde_json::to_value(SystemStatus::default()).unwrap(),
            json!({ "cut_off": false, "cut_off_end_time": null })
        );
    }

    #[tokio::test]
    async fn registry_isolates_conducts() {
        let registry: ConductStatusRegistry = ConductStatusRegistry::new();

        let (transition, status) = registry.update(1, |s| s.toggle(at(8, 0, 0))).await;
        assert_eq!(transition, CutOffTransition::Activated);
        assert!(status.cut_off);

        assert!(registry.get(1).await.cut_off);
        assert_eq!(registry.get(2).await, SystemStatus::default());

        assert_eq!(registry.reset(1).await, SystemStatus::default());
        assert!(!registry.get(1).await.cut_off);
    }

    #[tokio::test]
    async fn forget_drops_deleted_conducts() {
        let registry: ConductStatusRegistry = ConductStatusRegistry::new();
        registry.update(7, |s| s.cut_off = true).await;
        registry.forget(&[7]).await;
        assert_eq!(registry.get(7).await, SystemStatus::default());
    }
}
