// Conduct-local wall clock

use anyhow::{anyhow, Result};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use chrono_tz::Tz;

pub const CLOCK_FORMAT: &str = "%H:%M:%S";
pub const HISTORY_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";
pub const DETAIL_FORMAT: &str = "%I:%M:%S %p";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Produces naive local timestamps in the configured zone, truncated to whole seconds.
/// All cycle times are stored and compared in this zone.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    tz: Tz,
}

impl Clock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        let tz: Tz = name
            .parse()
            .map_err(|e| anyhow!("Invalid TIMEZONE '{}': {}", name, e))?;
        Ok(Self::new(tz))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local().trunc_subsecs(0)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Singapore)
    }
}

pub fn clock_time(at: NaiveDateTime) -> String {
    at.format(CLOCK_FORMAT).to_string()
}

pub fn history_time(at: NaiveDateTime) -> String {
    at.format(HISTORY_FORMAT).to_string()
}

pub fn detail_time(at: NaiveDateTime) -> String {
    at.format(DETAIL_FORMAT).to_string()
}

/// Serde adapter writing an optional timestamp as `HH:MM:SS`.
pub mod clock_string {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => serializer.serialize_str(&super::clock_time(*at)),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn formats_clock_and_history_times() {
        assert_eq!(clock_time(at(14, 5, 9)), "14:05:09");
        assert_eq!(history_time(at(14, 5, 9)), "2025-06-01 02:05:09 PM");
        assert_eq!(detail_time(at(0, 30, 0)), "12:30:00 AM");
    }

    #[test]
    fn now_has_no_subseconds() {
        let clock: Clock = Clock::default();
        assert_eq!(clock.now().nanosecond(), 0);
    }

    #[test]
    fn rejects_unknown_timezones() {
        assert!(Clock::from_name("Asia/Singapore").is_ok());
        assert!(Clock::from_name("Mars/Olympus").is_err());
    }
}
