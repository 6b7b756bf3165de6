// WBGT heat zones and their work/rest limits

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Rest period applied when no zone was recorded for the cycle.
pub const DEFAULT_REST_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Zone {
    White,
    Green,
    Yellow,
    Red,
    Black,
    Test,
    CutOff,
}

impl Zone {
    pub const ALL: [Zone; 7] = [
        Zone::White,
        Zone::Green,
        Zone::Yellow,
        Zone::Red,
        Zone::Black,
        Zone::Test,
        Zone::CutOff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::White => "white",
            Zone::Green => "green",
            Zone::Yellow => "yellow",
            Zone::Red => "red",
            Zone::Black => "black",
            Zone::Test => "test",
            Zone::CutOff => "cut-off",
        }
    }

    pub fn work_duration(&self) -> Duration {
        match self {
            Zone::White => Duration::minutes(60),
            Zone::Green => Duration::minutes(45),
            Zone::Yellow | Zone::Red => Duration::minutes(30),
            Zone::Black => Duration::minutes(15),
            Zone::Test => Duration::seconds(7),
            Zone::CutOff => Duration::zero(),
        }
    }

    pub fn rest_duration(&self) -> Duration {
        match self {
            Zone::White | Zone::Green | Zone::Yellow => Duration::minutes(15),
            Zone::Red | Zone::Black | Zone::CutOff => Duration::minutes(30),
            Zone::Test => Duration::seconds(10),
        }
    }

    /// Higher is stricter. The test zone outranks everything so short
    /// test cycles are never shortened by a real zone.
    pub fn stringency(&self) -> u8 {
        match self {
            Zone::White => 0,
            Zone::Green => 1,
            Zone::Yellow => 2,
            Zone::Red => 3,
            Zone::Black => 4,
            Zone::CutOff => 5,
            Zone::Test => 6,
        }
    }

    /// Zone work/rest table in minutes, keyed by zone name.
    pub fn table() -> Value {
        let mut zones: Map<String, Value> = Map::new();
        for zone in Zone::ALL {
            zones.insert(
                zone.as_str().to_string(),
                json!({
                    "work": minutes(zone.work_duration()),
                    "rest": minutes(zone.rest_duration()),
                }),
            );
        }
        Value::Object(zones)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownZone(pub String);

impl fmt::Display for UnknownZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown WBGT zone '{}'", self.0)
    }
}

impl std::error::Error for UnknownZone {}

impl FromStr for Zone {
    type Err = UnknownZone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zone::ALL
            .into_iter()
            .find(|zone| zone.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownZone(s.to_string()))
    }
}

// * Request bodies parse the same way stored rows do
impl TryFrom<String> for Zone {
    type Error = UnknownZone;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The stricter of the zone just entered and the strictest seen so far this cycle.
/// Ties go to the current zone.
pub fn most_stringent(current: Zone, previous: Option<Zone>) -> Zone {
    match previous {
        Some(previous) if previous.stringency() > current.stringency() => previous,
        _ => current,
    }
}

pub fn rest_for(zone: Option<Zone>) -> Duration {
    zone.map(|z| z.rest_duration())
        .unwrap_or_else(|| Duration::minutes(DEFAULT_REST_MINUTES))
}

/// Duration expressed in (possibly fractional) minutes.
pub fn minutes(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("red".parse::<Zone>(), Ok(Zone::Red));
        assert_eq!(" Black ".parse::<Zone>(), Ok(Zone::Black));
        assert_eq!("cut-off".parse::<Zone>(), Ok(Zone::CutOff));
        assert!("purple".parse::<Zone>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Zone::CutOff).unwrap(), "\"cut-off\"");
        let zone: Zone = serde_json::from_str("\"yellow\"").unwrap();
        assert_eq!(zone, Zone::Yellow);
    }

    #[test]
    fn json_zones_are_case_insensitive_like_stored_ones() {
        let zone: Zone = serde_json::from_str("\"Red\"").unwrap();
        assert_eq!(zone, Zone::Red);
        assert_eq!(serde_json::from_str::<Zone>("\"CUT-OFF\"").unwrap(), Zone::CutOff);
        assert!(serde_json::from_str::<Zone>("\"purple\"").is_err());
    }

    #[test]
    fn durations_match_the_wbgt_table() {
        assert_eq!(Zone::White.work_duration(), Duration::minutes(60));
        assert_eq!(Zone::Green.work_duration(), Duration::minutes(45));
        assert_eq!(Zone::Black.work_duration(), Duration::minutes(15));
        assert_eq!(Zone::Red.rest_duration(), Duration::minutes(30));
        assert_eq!(Zone::Test.work_duration(), Duration::seconds(7));
        assert_eq!(Zone::Test.rest_duration(), Duration::seconds(10));
        assert_eq!(Zone::CutOff.work_duration(), Duration::zero());
    }

    #[test]
    fn most_stringent_keeps_the_strictest_zone() {
        assert_eq!(most_stringent(Zone::Green, None), Zone::Green);
        assert_eq!(most_stringent(Zone::Green, Some(Zone::Black)), Zone::Black);
        assert_eq!(most_stringent(Zone::Red, Some(Zone::Yellow)), Zone::Red);
        assert_eq!(most_stringent(Zone::Red, Some(Zone::Red)), Zone::Red);
        assert_eq!(most_stringent(Zone::White, Some(Zone::Test)), Zone::Test);
    }

    #[test]
    fn rest_defaults_to_fifteen_minutes() {
        assert_eq!(rest_for(None), Duration::minutes(15));
        assert_eq!(rest_for(Some(Zone::Black)), Duration::minutes(30));
    }

    #[test]
    fn table_reports_minutes() {
        let table: Value = Zone::table();
        assert_eq!(table["white"]["work"], 60.0);
        assert_eq!(table["red"]["rest"], 30.0);
        assert!((table["test"]["rest"].as_f64().unwrap() - 10.0 / 60.0).abs() < 1e-9);
    }
}
