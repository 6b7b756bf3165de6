// Work/rest cycle state machine for a single conduct participant

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::clock::clock_string;
use crate::domain::system_status::SystemStatus;
use crate::domain::zones::{most_stringent, rest_for, Zone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Trainer,
    ConductingBody,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Trainer => "trainer",
            Role::ConductingBody => "conducting_body",
        }
    }

    /// Status a participant starts in when joining with this role.
    pub fn initial_status(&self) -> UserStatus {
        match self {
            Role::Trainer => UserStatus::Idle,
            Role::ConductingBody => UserStatus::Monitoring,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trainer" => Ok(Role::Trainer),
            "conducting_body" => Ok(Role::ConductingBody),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Idle,
    Working,
    Resting,
    Monitoring,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Idle => "idle",
            UserStatus::Working => "working",
            UserStatus::Resting => "resting",
            UserStatus::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(UserStatus::Idle),
            "working" => Ok(UserStatus::Working),
            "resting" => Ok(UserStatus::Resting),
            "monitoring" => Ok(UserStatus::Monitoring),
            other => Err(format!("unknown user status '{other}'")),
        }
    }
}

/// Timing state of one participant. Start and end are conduct-local timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleState {
    pub status: UserStatus,
    pub zone: Option<Zone>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub work_completed: bool,
    pub pending_rest: bool,
    pub most_stringent_zone: Option<Zone>,
}

impl CycleState {
    pub fn new(status: UserStatus) -> Self {
        Self {
            status,
            zone: None,
            start_time: None,
            end_time: None,
            work_completed: false,
            pending_rest: false,
            most_stringent_zone: None,
        }
    }

    /// Starts (or overwrites) a work cycle. When a cycle is already running and
    /// its end is still ahead, the earlier of the two end times is kept.
    pub fn start_work(&mut self, zone: Zone, now: NaiveDateTime) {
        let proposed_end: NaiveDateTime = now + zone.work_duration();

        let end: NaiveDateTime = match self.end_time {
            Some(current_end)
                if self.status == UserStatus::Working && !self.work_completed && current_end > now =>
            {
                current_end.min(proposed_end)
            }
            _ => proposed_end,
        };

        self.status = UserStatus::Working;
        self.zone = Some(zone);
        self.start_time = Some(now);
        self.end_time = Some(end);
        self.work_completed = false;
        self.pending_rest = false;
        self.most_stringent_zone = Some(most_stringent(zone, self.most_stringent_zone));
    }

    /// Marks the work period done. Zone and times stay so the rest period can be derived.
    pub fn complete_work(&mut self) {
        self.work_completed = true;
        self.pending_rest = true;
        self.status = UserStatus::Idle;
    }

    /// Zone the next rest is sized by: the strictest worked this cycle, else the current one.
    pub fn rest_zone(&self) -> Option<Zone> {
        self.most_stringent_zone.or(self.zone)
    }

    /// Starts the rest period sized by the strictest zone worked this cycle.
    /// Returns the zone the rest was based on and its length.
    pub fn start_rest(&mut self, now: NaiveDateTime) -> (Option<Zone>, Duration) {
        let rest_zone: Option<Zone> = self.rest_zone();
        let rest: Duration = rest_for(rest_zone);

        self.status = UserStatus::Resting;
        self.start_time = Some(now);
        self.end_time = Some(now + rest);
        self.most_stringent_zone = None;
        self.work_completed = false;
        self.pending_rest = false;

        (rest_zone, rest)
    }

    /// Early stop requested by the participant. The stringency tracker survives
    /// so the next rest still reflects the hottest zone worked.
    pub fn stop(&mut self) {
        self.status = UserStatus::Idle;
        self.zone = None;
        self.start_time = None;
        self.end_time = None;
        self.work_completed = false;
        self.pending_rest = false;
    }

    pub fn reset(&mut self) {
        *self = Self::new(UserStatus::Idle);
    }

    pub fn enter_cut_off(&mut self) {
        self.status = UserStatus::Idle;
        self.zone = None;
        self.start_time = None;
        self.end_time = None;
    }

    pub fn mandatory_rest(&mut self, now: NaiveDateTime, duration: Duration) {
        self.status = UserStatus::Resting;
        self.zone = None;
        self.start_time = Some(now);
        self.end_time = Some(now + duration);
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.end_time.is_some_and(|end| end <= now)
    }

    pub fn awaiting_rest(&self) -> bool {
        self.work_completed && self.pending_rest
    }
}

/// Wire view of a cycle with clock-formatted times.
#[derive(Debug, Clone, Serialize)]
pub struct CycleView {
    pub status: UserStatus,
    pub zone: Option<Zone>,
    pub most_stringent_zone: Option<Zone>,
    #[serde(serialize_with = "clock_string::serialize")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(serialize_with = "clock_string::serialize")]
    pub end_time: Option<NaiveDateTime>,
    pub work_completed: bool,
    pub pending_rest: bool,
}

impl From<&CycleState> for CycleView {
    fn from(cycle: &CycleState) -> Self {
        Self {
            status: cycle.status,
            zone: cycle.zone,
            most_stringent_zone: cycle.most_stringent_zone,
            start_time: cycle.start_time,
            end_time: cycle.end_time,
            work_completed: cycle.work_completed,
            pending_rest: cycle.pending_rest,
        }
    }
}

/// Reasons a zone change is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneChangeDenied {
    CutOffActive,
    MandatoryRest,
    NotOwnZone,
    Resting,
    RestPending,
}

impl ZoneChangeDenied {
    pub fn message(&self) -> &'static str {
        match self {
            ZoneChangeDenied::CutOffActive => "System is in cut-off mode",
            ZoneChangeDenied::MandatoryRest => "Mandatory rest period is still active",
            ZoneChangeDenied::NotOwnZone => "Trainers can only set their own zone",
            ZoneChangeDenied::Resting => "Cannot start work cycle during rest period",
            ZoneChangeDenied::RestPending => "Must start rest cycle before beginning new work cycle",
        }
    }
}

/// Who is asking for the change.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub name: &'a str,
    pub role: Role,
}

/// Checks whether `actor` may start a work cycle for `target`.
/// The conducting body bypasses every restriction except ownership, which only binds trainers.
pub fn authorize_zone_change(
    actor: Actor<'_>,
    target_name: &str,
    target: &CycleState,
    status: &SystemStatus,
    now: NaiveDateTime,
) -> Result<(), ZoneChangeDenied> {
    let supervisor: bool = actor.role == Role::ConductingBody;

    if status.cut_off && !supervisor {
        return Err(ZoneChangeDenied::CutOffActive);
    }

    if let Some(rest_end) = status.cut_off_end_time {
        if now < rest_end && !supervisor {
            return Err(ZoneChangeDenied::MandatoryRest);
        }
    }

    if actor.role == Role::Trainer && actor.name != target_name {
        return Err(ZoneChangeDenied::NotOwnZone);
    }

    if target.status == UserStatus::Resting && !supervisor {
        return Err(ZoneChangeDenied::Resting);
    }

    if target.awaiting_rest() && !supervisor {
        return Err(ZoneChangeDenied::RestPending);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn trainer() -> Actor<'static> {
        Actor { name: "alpha", role: Role::Trainer }
    }

    fn supervisor() -> Actor<'static> {
        Actor { name: "cb", role: Role::ConductingBody }
    }

    #[test]
    fn start_work_sets_the_zone_window() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::Green, at(9, 0, 0));

        assert_eq!(cycle.status, UserStatus::Working);
        assert_eq!(cycle.zone, Some(Zone::Green));
        assert_eq!(cycle.start_time, Some(at(9, 0, 0)));
        assert_eq!(cycle.end_time, Some(at(9, 45, 0)));
        assert_eq!(cycle.most_stringent_zone, Some(Zone::Green));
    }

    #[test]
    fn overwriting_a_running_cycle_keeps_the_earlier_end() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::Black, at(9, 0, 0)); // ends 09:15
        cycle.start_work(Zone::White, at(9, 5, 0)); // would end 10:05

        assert_eq!(cycle.zone, Some(Zone::White));
        assert_eq!(cycle.start_time, Some(at(9, 5, 0)));
        assert_eq!(cycle.end_time, Some(at(9, 15, 0)));
        assert_eq!(cycle.most_stringent_zone, Some(Zone::Black));
    }

    #[test]
    fn stricter_zone_shortens_a_running_cycle() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::White, at(9, 0, 0)); // ends 10:00
        cycle.start_work(Zone::Black, at(9, 10, 0)); // ends 09:25

        assert_eq!(cycle.end_time, Some(at(9, 25, 0)));
    }

    #[test]
    fn expired_cycle_is_not_used_for_overwrite() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::Black, at(9, 0, 0)); // ends 09:15
        cycle.start_work(Zone::Green, at(9, 20, 0));

        assert_eq!(cycle.end_time, Some(at(10, 5, 0)));
    }

    #[test]
    fn rest_uses_most_stringent_zone_and_clears_tracker() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::Red, at(9, 0, 0));
        cycle.start_work(Zone::Green, at(9, 1, 0));
        cycle.complete_work();
        assert!(cycle.awaiting_rest());
        assert_eq!(cycle.status, UserStatus::Idle);
        assert_eq!(cycle.zone, Some(Zone::Green));

        let (rest_zone, rest) = cycle.start_rest(at(9, 30, 0));

        assert_eq!(rest_zone, Some(Zone::Red));
        assert_eq!(rest, Duration::minutes(30));
        assert_eq!(cycle.status, UserStatus::Resting);
        assert_eq!(cycle.end_time, Some(at(10, 0, 0)));
        assert_eq!(cycle.most_stringent_zone, None);
        assert!(!cycle.awaiting_rest());
    }

    #[test]
    fn rest_zone_falls_back_to_current_zone() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        assert_eq!(cycle.rest_zone(), None);

        cycle.zone = Some(Zone::Yellow);
        assert_eq!(cycle.rest_zone(), Some(Zone::Yellow));

        cycle.most_stringent_zone = Some(Zone::Black);
        assert_eq!(cycle.rest_zone(), Some(Zone::Black));
    }

    #[test]
    fn test_zone_rests_for_ten_seconds() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::Test, at(9, 0, 0));
        assert_eq!(cycle.end_time, Some(at(9, 0, 7)));
        cycle.complete_work();

        let (_, rest) = cycle.start_rest(at(9, 0, 7));
        assert_eq!(rest, Duration::seconds(10));
        assert_eq!(cycle.end_time, Some(at(9, 0, 17)));
    }

    #[test]
    fn rest_without_any_zone_defaults_to_fifteen_minutes() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        let (rest_zone, rest) = cycle.start_rest(at(9, 0, 0));
        assert_eq!(rest_zone, None);
        assert_eq!(rest, Duration::minutes(15));
    }

    #[test]
    fn stop_keeps_the_stringency_tracker() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::Black, at(9, 0, 0));
        cycle.stop();

        assert_eq!(cycle.status, UserStatus::Idle);
        assert_eq!(cycle.zone, None);
        assert_eq!(cycle.end_time, None);
        assert_eq!(cycle.most_stringent_zone, Some(Zone::Black));

        cycle.reset();
        assert_eq!(cycle, CycleState::new(UserStatus::Idle));
    }

    #[test]
    fn cut_off_and_mandatory_rest() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::Red, at(9, 0, 0));
        cycle.enter_cut_off();
        assert_eq!(cycle.status, UserStatus::Idle);
        assert_eq!(cycle.zone, None);
        assert_eq!(cycle.end_time, None);

        cycle.mandatory_rest(at(9, 10, 0), Duration::minutes(30));
        assert_eq!(cycle.status, UserStatus::Resting);
        assert_eq!(cycle.end_time, Some(at(9, 40, 0)));
    }

    #[test]
    fn is_due_at_or_after_end() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        assert!(!cycle.is_due(at(9, 0, 0)));
        cycle.start_work(Zone::Test, at(9, 0, 0));
        assert!(!cycle.is_due(at(9, 0, 6)));
        assert!(cycle.is_due(at(9, 0, 7)));
        assert!(cycle.is_due(at(9, 1, 0)));
    }

    #[test]
    fn cut_off_zone_is_due_immediately() {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::CutOff, at(9, 0, 0));
        assert!(cycle.is_due(at(9, 0, 0)));
    }

    #[test]
    fn authorization_order_and_supervisor_bypass() {
        let now: NaiveDateTime = at(9, 0, 0);
        let idle: CycleState = CycleState::new(UserStatus::Idle);
        let mut status: SystemStatus = SystemStatus::default();

        assert_eq!(authorize_zone_change(trainer(), "alpha", &idle, &status, now), Ok(()));
        assert_eq!(
            authorize_zone_change(trainer(), "bravo", &idle, &status, now),
            Err(ZoneChangeDenied::NotOwnZone)
        );
        assert_eq!(authorize_zone_change(supervisor(), "bravo", &idle, &status, now), Ok(()));

        status.cut_off = true;
        assert_eq!(
            authorize_zone_change(trainer(), "bravo", &idle, &status, now),
            Err(ZoneChangeDenied::CutOffActive)
        );
        assert_eq!(authorize_zone_change(supervisor(), "alpha", &idle, &status, now), Ok(()));

        status.cut_off = false;
        status.cut_off_end_time = Some(at(9, 30, 0));
        assert_eq!(
            authorize_zone_change(trainer(), "alpha", &idle, &status, now),
            Err(ZoneChangeDenied::MandatoryRest)
        );
        assert_eq!(authorize_zone_change(trainer(), "alpha", &idle, &status, at(9, 30, 0)), Ok(()));
    }

    #[test]
    fn resting_or_pending_rest_blocks_trainers() {
        let now: NaiveDateTime = at(9, 0, 0);
        let status: SystemStatus = SystemStatus::default();

        let mut resting: CycleState = CycleState::new(UserStatus::Idle);
        resting.start_rest(now);
        assert_eq!(
            authorize_zone_change(trainer(), "alpha", &resting, &status, now),
            Err(ZoneChangeDenied::Resting)
        );
        assert_eq!(authorize_zone_change(supervisor(), "alpha", &resting, &status, now), Ok(()));

        let mut pending: CycleState = CycleState::new(UserStatus::Idle);
        pending.start_work(Zone::Red, now);
        pending.complete_work();
        assert_eq!(
            authorize_zone_change(trainer(), "alpha", &pending, &status, now),
            Err(ZoneChangeDenied::RestPending)
        );
    }

    #[test]
    fn role_and_status_round_trip_through_strings() {
        assert_eq!("conducting_body".parse::<Role>(), Ok(Role::ConductingBody));
        assert_eq!(Role::Trainer.initial_status(), UserStatus::Idle);
        assert_eq!(Role::ConductingBody.initial_status(), UserStatus::Monitoring);
        assert_eq!("resting".parse::<UserStatus>(), Ok(UserStatus::Resting));
        assert!("sleeping".parse::<UserStatus>().is_err());
    }
}
