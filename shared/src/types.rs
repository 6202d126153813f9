//! Label vocabularies used across preferences, sensor records and results
//!
//! Labels render in German, the language of the existing preference files
//! and of downstream consumers. Parsing is lenient: German labels, English
//! synonyms and any letter case are accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A label that is not part of the expected vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: {value}")]
pub struct LabelError {
    pub kind: &'static str,
    pub value: String,
}

impl LabelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

// ============================================================================
// Season
// ============================================================================

/// Meteorological season derived from the calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "Frühling", alias = "spring")]
    Spring,
    #[serde(rename = "Sommer", alias = "summer")]
    Summer,
    #[serde(rename = "Herbst", alias = "autumn")]
    Autumn,
    #[serde(rename = "Winter", alias = "winter")]
    Winter,
}

impl Season {
    /// Months 3-5 spring, 6-8 summer, 9-11 autumn, everything else winter
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Spring => "Frühling",
            Season::Summer => "Sommer",
            Season::Autumn => "Herbst",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Day-parts
// ============================================================================

/// Named time-of-day window relative to sunrise and sunset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayPart {
    #[serde(rename = "Morgen", alias = "morning")]
    Morning,
    #[serde(rename = "Tag", alias = "day")]
    Day,
    #[serde(rename = "Abend", alias = "evening")]
    Evening,
    #[serde(rename = "Nacht", alias = "night")]
    Night,
}

impl DayPart {
    pub const ALL: [DayPart; 4] = [
        DayPart::Morning,
        DayPart::Day,
        DayPart::Evening,
        DayPart::Night,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DayPart::Morning => "Morgen",
            DayPart::Day => "Tag",
            DayPart::Evening => "Abend",
            DayPart::Night => "Nacht",
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DayPart {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "morgen" | "morning" => Ok(DayPart::Morning),
            "tag" | "day" | "midday" => Ok(DayPart::Day),
            "abend" | "evening" => Ok(DayPart::Evening),
            "nacht" | "night" => Ok(DayPart::Night),
            _ => Err(LabelError::new("day-part", s)),
        }
    }
}

// ============================================================================
// Compass
// ============================================================================

/// Eight-point compass octant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "NO", alias = "NE")]
    NorthEast,
    #[serde(rename = "O", alias = "E")]
    East,
    #[serde(rename = "SO", alias = "SE")]
    SouthEast,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "SW")]
    SouthWest,
    #[serde(rename = "W")]
    West,
    #[serde(rename = "NW")]
    NorthWest,
}

impl CompassPoint {
    const OCTANTS: [CompassPoint; 8] = [
        CompassPoint::North,
        CompassPoint::NorthEast,
        CompassPoint::East,
        CompassPoint::SouthEast,
        CompassPoint::South,
        CompassPoint::SouthWest,
        CompassPoint::West,
        CompassPoint::NorthWest,
    ];

    /// Octant for a bearing in degrees: `floor((deg + 22.5) / 45) mod 8`.
    ///
    /// The lower edge of every octant belongs to it, so 22.5° is already NO.
    /// Returns `None` for non-finite bearings.
    pub fn from_bearing(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let index = ((degrees + 22.5) / 45.0).floor().rem_euclid(8.0) as usize;
        Some(Self::OCTANTS[index % 8])
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompassPoint::North => "N",
            CompassPoint::NorthEast => "NO",
            CompassPoint::East => "O",
            CompassPoint::SouthEast => "SO",
            CompassPoint::South => "S",
            CompassPoint::SouthWest => "SW",
            CompassPoint::West => "W",
            CompassPoint::NorthWest => "NW",
        }
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CompassPoint {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "n" | "nord" | "north" => Ok(CompassPoint::North),
            "no" | "ne" | "nordost" | "northeast" => Ok(CompassPoint::NorthEast),
            "o" | "e" | "ost" | "east" => Ok(CompassPoint::East),
            "so" | "se" | "südost" | "southeast" => Ok(CompassPoint::SouthEast),
            "s" | "süd" | "south" => Ok(CompassPoint::South),
            "sw" | "südwest" | "southwest" => Ok(CompassPoint::SouthWest),
            "w" | "west" => Ok(CompassPoint::West),
            "nw" | "nordwest" | "northwest" => Ok(CompassPoint::NorthWest),
            _ => Err(LabelError::new("compass", s)),
        }
    }
}

// ============================================================================
// Moon phase
// ============================================================================

/// Moon phase as reported by the astronomy collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoonPhase {
    #[serde(rename = "Neumond", alias = "new")]
    New,
    #[serde(rename = "Vollmond", alias = "full")]
    Full,
    #[serde(rename = "Halbmond", alias = "half")]
    Half,
    #[serde(rename = "Zunehmender Mond", alias = "waxing")]
    Waxing,
    #[serde(rename = "Abnehmender Mond", alias = "waning")]
    Waning,
}

impl MoonPhase {
    /// Classify from the illuminated percentage today and tomorrow.
    ///
    /// ≤1 % new, ≥99 % full, 40-60 % half, otherwise waxing or waning
    /// depending on whether tomorrow is brighter.
    pub fn classify(illuminated_pct: f64, next_day_pct: f64) -> Self {
        if illuminated_pct <= 1.0 {
            MoonPhase::New
        } else if illuminated_pct >= 99.0 {
            MoonPhase::Full
        } else if (40.0..=60.0).contains(&illuminated_pct) {
            MoonPhase::Half
        } else if next_day_pct > illuminated_pct {
            MoonPhase::Waxing
        } else {
            MoonPhase::Waning
        }
    }

    /// Waxing and waning phases count as the half-moon category
    pub fn in_half_moon_category(&self) -> bool {
        matches!(self, MoonPhase::Waxing | MoonPhase::Waning)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoonPhase::New => "Neumond",
            MoonPhase::Full => "Vollmond",
            MoonPhase::Half => "Halbmond",
            MoonPhase::Waxing => "Zunehmender Mond",
            MoonPhase::Waning => "Abnehmender Mond",
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MoonPhase {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "neumond" | "new" | "new moon" => Ok(MoonPhase::New),
            "vollmond" | "full" | "full moon" => Ok(MoonPhase::Full),
            "halbmond" | "half" | "half moon" | "halfmoon" => Ok(MoonPhase::Half),
            "zunehmender mond" | "waxing" => Ok(MoonPhase::Waxing),
            "abnehmender mond" | "waning" => Ok(MoonPhase::Waning),
            _ => Err(LabelError::new("moon phase", s)),
        }
    }
}

// ============================================================================
// Pressure trend
// ============================================================================

/// Barometric trend between two evaluation cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PressureTrend {
    #[serde(rename = "steigend", alias = "rising")]
    Rising,
    #[serde(rename = "fallend", alias = "falling")]
    Falling,
    #[serde(rename = "stagnierend", alias = "unchanged")]
    Unchanged,
    #[default]
    #[serde(rename = "unbekannt", alias = "unknown")]
    Unknown,
}

impl PressureTrend {
    /// Compare the current reading with the one stored by the previous cycle
    pub fn derive(current: Option<f64>, previous: Option<f64>) -> Self {
        match (current, previous) {
            (Some(curr), Some(prev)) if curr > prev => PressureTrend::Rising,
            (Some(curr), Some(prev)) if curr < prev => PressureTrend::Falling,
            (Some(curr), Some(prev)) if curr == prev => PressureTrend::Unchanged,
            _ => PressureTrend::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PressureTrend::Rising => "steigend",
            PressureTrend::Falling => "fallend",
            PressureTrend::Unchanged => "stagnierend",
            PressureTrend::Unknown => "unbekannt",
        }
    }
}

impl fmt::Display for PressureTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A species' pressure-trend preference after synonym mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendPreference {
    pub trend: PressureTrend,
    /// Raw label started with "leicht"/"slightly"
    pub slight: bool,
}

impl FromStr for TrendPreference {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize(s);
        let (slight, rest) = match label
            .strip_prefix("leicht ")
            .or_else(|| label.strip_prefix("slightly "))
        {
            Some(rest) => (true, rest.trim()),
            None => (false, label.as_str()),
        };
        let trend = match rest {
            "steigend" | "rising" => PressureTrend::Rising,
            "fallend" | "falling" => PressureTrend::Falling,
            "stagnierend" | "stabil" | "gleichbleibend" | "stable" | "unchanged" | "steady" => {
                PressureTrend::Unchanged
            }
            "unbekannt" | "unknown" => PressureTrend::Unknown,
            _ => return Err(LabelError::new("pressure trend", s)),
        };
        Ok(TrendPreference { trend, slight })
    }
}

// ============================================================================
// Turbidity
// ============================================================================

/// Water clarity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Turbidity {
    #[default]
    #[serde(rename = "klar", alias = "clear")]
    Clear,
    #[serde(rename = "leicht trüb", alias = "slightly turbid")]
    SlightlyTurbid,
    #[serde(rename = "trüb", alias = "turbid")]
    Turbid,
}

impl Turbidity {
    pub fn label(&self) -> &'static str {
        match self {
            Turbidity::Clear => "klar",
            Turbidity::SlightlyTurbid => "leicht trüb",
            Turbidity::Turbid => "trüb",
        }
    }
}

impl fmt::Display for Turbidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Turbidity {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "klar" | "clear" => Ok(Turbidity::Clear),
            "leicht trüb" | "slightly turbid" => Ok(Turbidity::SlightlyTurbid),
            "trüb" | "stark trüb" | "turbid" | "very turbid" => Ok(Turbidity::Turbid),
            _ => Err(LabelError::new("turbidity", s)),
        }
    }
}

// ============================================================================
// Cloud cover
// ============================================================================

/// Sky condition derived from the cloud fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudCover {
    #[serde(rename = "klar", alias = "clear")]
    Clear,
    #[serde(rename = "wechselhaft", alias = "variable")]
    Variable,
    #[serde(rename = "bewölkt", alias = "overcast")]
    Overcast,
}

impl CloudCover {
    /// ≥0.5 overcast, ≤0.2 clear, otherwise variable
    pub fn classify(fraction: f64) -> Self {
        if fraction >= 0.5 {
            CloudCover::Overcast
        } else if fraction <= 0.2 {
            CloudCover::Clear
        } else {
            CloudCover::Variable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CloudCover::Clear => "klar",
            CloudCover::Variable => "wechselhaft",
            CloudCover::Overcast => "bewölkt",
        }
    }
}

impl fmt::Display for CloudCover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Weather descriptor used in species preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherDescriptor {
    Sky(CloudCover),
    Windy,
}

impl FromStr for WeatherDescriptor {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "klar" | "fast klar" | "clear" | "mostly clear" => {
                Ok(WeatherDescriptor::Sky(CloudCover::Clear))
            }
            "wechselhaft" | "dunstig" | "neblig" | "variable" | "hazy" | "foggy" => {
                Ok(WeatherDescriptor::Sky(CloudCover::Variable))
            }
            "bewölkt" | "bedeckt" | "overcast" | "cloudy" => {
                Ok(WeatherDescriptor::Sky(CloudCover::Overcast))
            }
            "windig" | "windy" => Ok(WeatherDescriptor::Windy),
            _ => Err(LabelError::new("weather", s)),
        }
    }
}

/// `true` for the "all"/"alle" wildcard used in preference lists
pub fn is_wildcard(label: &str) -> bool {
    matches!(normalize(label).as_str(), "alle" | "all")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_from_month() {
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(5), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
        assert_eq!(Season::from_month(11), Season::Autumn);
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
    }

    #[test]
    fn test_compass_boundaries() {
        assert_eq!(CompassPoint::from_bearing(0.0), Some(CompassPoint::North));
        assert_eq!(CompassPoint::from_bearing(22.4), Some(CompassPoint::North));
        assert_eq!(CompassPoint::from_bearing(22.5), Some(CompassPoint::NorthEast));
        assert_eq!(CompassPoint::from_bearing(44.0), Some(CompassPoint::NorthEast));
        assert_eq!(CompassPoint::from_bearing(67.5), Some(CompassPoint::East));
        assert_eq!(CompassPoint::from_bearing(180.0), Some(CompassPoint::South));
        assert_eq!(CompassPoint::from_bearing(337.4), Some(CompassPoint::NorthWest));
        assert_eq!(CompassPoint::from_bearing(337.5), Some(CompassPoint::North));
        assert_eq!(CompassPoint::from_bearing(360.0), Some(CompassPoint::North));
        assert_eq!(CompassPoint::from_bearing(-90.0), Some(CompassPoint::West));
        assert_eq!(CompassPoint::from_bearing(f64::NAN), None);
    }

    #[test]
    fn test_compass_parsing_accepts_english() {
        assert_eq!("NE".parse::<CompassPoint>().unwrap(), CompassPoint::NorthEast);
        assert_eq!("no".parse::<CompassPoint>().unwrap(), CompassPoint::NorthEast);
        assert_eq!("E".parse::<CompassPoint>().unwrap(), CompassPoint::East);
        assert!("XYZ".parse::<CompassPoint>().is_err());
    }

    #[test]
    fn test_moon_classification() {
        assert_eq!(MoonPhase::classify(0.5, 2.0), MoonPhase::New);
        assert_eq!(MoonPhase::classify(99.5, 98.0), MoonPhase::Full);
        assert_eq!(MoonPhase::classify(50.0, 60.0), MoonPhase::Half);
        assert_eq!(MoonPhase::classify(20.0, 30.0), MoonPhase::Waxing);
        assert_eq!(MoonPhase::classify(80.0, 70.0), MoonPhase::Waning);
        assert!(MoonPhase::Waxing.in_half_moon_category());
        assert!(!MoonPhase::Half.in_half_moon_category());
    }

    #[test]
    fn test_pressure_trend_derivation() {
        assert_eq!(PressureTrend::derive(Some(1015.0), Some(1012.0)), PressureTrend::Rising);
        assert_eq!(PressureTrend::derive(Some(1010.0), Some(1012.0)), PressureTrend::Falling);
        assert_eq!(PressureTrend::derive(Some(1012.0), Some(1012.0)), PressureTrend::Unchanged);
        assert_eq!(PressureTrend::derive(None, Some(1012.0)), PressureTrend::Unknown);
        assert_eq!(PressureTrend::derive(Some(1012.0), None), PressureTrend::Unknown);
    }

    #[test]
    fn test_trend_preference_synonyms() {
        let slight: TrendPreference = "leicht fallend".parse().unwrap();
        assert_eq!(slight.trend, PressureTrend::Falling);
        assert!(slight.slight);

        let stable: TrendPreference = "stabil".parse().unwrap();
        assert_eq!(stable.trend, PressureTrend::Unchanged);
        assert!(!stable.slight);

        let english: TrendPreference = "Slightly rising".parse().unwrap();
        assert_eq!(english.trend, PressureTrend::Rising);
        assert!(english.slight);

        let unknown: TrendPreference = "unbekannt".parse().unwrap();
        assert_eq!(unknown.trend, PressureTrend::Unknown);
        assert!(!unknown.slight);
        assert!("sinkend".parse::<TrendPreference>().is_err());
    }

    #[test]
    fn test_cloud_classification_edges() {
        assert_eq!(CloudCover::classify(0.5), CloudCover::Overcast);
        assert_eq!(CloudCover::classify(0.2), CloudCover::Clear);
        assert_eq!(CloudCover::classify(0.35), CloudCover::Variable);
    }

    #[test]
    fn test_weather_descriptor_mapping() {
        assert_eq!(
            "fast klar".parse::<WeatherDescriptor>().unwrap(),
            WeatherDescriptor::Sky(CloudCover::Clear)
        );
        assert_eq!(
            "neblig".parse::<WeatherDescriptor>().unwrap(),
            WeatherDescriptor::Sky(CloudCover::Variable)
        );
        assert_eq!("windig".parse::<WeatherDescriptor>().unwrap(), WeatherDescriptor::Windy);
    }

    #[test]
    fn test_labels_serialize_in_german() {
        assert_eq!(serde_json::to_string(&DayPart::Night).unwrap(), "\"Nacht\"");
        assert_eq!(serde_json::to_string(&CompassPoint::NorthEast).unwrap(), "\"NO\"");
        let phase: MoonPhase = serde_json::from_str("\"waxing\"").unwrap();
        assert_eq!(phase, MoonPhase::Waxing);
    }
}
