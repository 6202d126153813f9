//! Scored result records produced by the engine

use chrono::NaiveTime;
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use super::{Factor, SensorRecord, SpeciesPreference};
use crate::types::{CompassPoint, DayPart, Season, Turbidity};

/// A day-part window as local clock times; `end` before `start` means the
/// window spans midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ClockWindow {
    pub fn spans_midnight(&self) -> bool {
        self.end < self.start
    }
}

impl Serialize for ClockWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.start.format("%H:%M").to_string())?;
        tuple.serialize_element(&self.end.format("%H:%M").to_string())?;
        tuple.end()
    }
}

/// Current and recommended value for a factor that did not match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Improvement {
    #[serde(rename = "aktuell")]
    pub current: String,
    #[serde(rename = "empfohlen")]
    pub recommended: String,
}

/// Input record and preference profile, enriched with everything the
/// engine computed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    #[serde(flatten)]
    pub record: SensorRecord,
    #[serde(flatten)]
    pub preference: SpeciesPreference,
    #[serde(rename = "Jahreszeit")]
    pub season: Season,
    #[serde(rename = "Errechnete_Wassertemperatur")]
    pub water_temp_at_depth_c: Option<f64>,
    #[serde(rename = "Errechnete_Wassertiefe")]
    pub fishing_depth_m: Option<f64>,
    #[serde(rename = "TempTiefe_Match")]
    pub temp_depth_match: bool,
    /// Resolved from the bearing; null when the bearing is unknown
    #[serde(rename = "Windrichtung")]
    pub wind_direction: Option<CompassPoint>,
    #[serde(rename = "Trübung_Einstufung")]
    pub turbidity: Turbidity,
    #[serde(rename = "Bestes_Fangfenster")]
    pub best_window: BTreeMap<DayPart, ClockWindow>,
    #[serde(rename = "Fangwahrscheinlichkeit_%")]
    pub probability_pct: u8,
    #[serde(rename = "Score")]
    pub score: f64,
    #[serde(rename = "Teilwertungen")]
    pub contributions: BTreeMap<Factor, f64>,
    #[serde(rename = "Tipps")]
    pub tips: String,
    #[serde(rename = "Verbesserungen")]
    pub improvements: BTreeMap<String, Improvement>,
    /// Null when the profile has no parseable closed season
    #[serde(rename = "Schonzeit_aktiv")]
    pub closed_season_active: Option<bool>,
}

impl ScoredResult {
    pub fn species(&self) -> &str {
        &self.record.species
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_window_serializes_as_pair() {
        let window = ClockWindow {
            start: NaiveTime::from_hms_opt(20, 30, 0).unwrap(),
            end: NaiveTime::from_hms_opt(6, 5, 0).unwrap(),
        };
        assert!(window.spans_midnight());
        assert_eq!(serde_json::to_string(&window).unwrap(), r#"["20:30","06:05"]"#);
    }
}
