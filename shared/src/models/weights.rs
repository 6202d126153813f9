//! Weight and buffer tables that parameterize the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scoring factors, serialized under their weight-table keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Factor {
    #[serde(rename = "Saison")]
    Season,
    #[serde(rename = "Temperatur")]
    Temperature,
    #[serde(rename = "Wassertiefe")]
    Depth,
    #[serde(rename = "TempTiefe_Match")]
    TempDepthMatch,
    #[serde(rename = "Tageszeitfenster")]
    TimeOfDay,
    #[serde(rename = "Nacht_Boost")]
    NightBoost,
    #[serde(rename = "Luftdruck_trend")]
    PressureTrend,
    #[serde(rename = "Windrichtung")]
    WindDirection,
    #[serde(rename = "Windig")]
    Windy,
    #[serde(rename = "Bewölkung")]
    CloudCover,
    #[serde(rename = "Regen_Bonus")]
    RainBonus,
    #[serde(rename = "Regen_Malus")]
    RainMalus,
    #[serde(rename = "Mondphase")]
    MoonPhase,
    #[serde(rename = "Trübung")]
    Turbidity,
}

impl Factor {
    pub fn key(&self) -> &'static str {
        match self {
            Factor::Season => "Saison",
            Factor::Temperature => "Temperatur",
            Factor::Depth => "Wassertiefe",
            Factor::TempDepthMatch => "TempTiefe_Match",
            Factor::TimeOfDay => "Tageszeitfenster",
            Factor::NightBoost => "Nacht_Boost",
            Factor::PressureTrend => "Luftdruck_trend",
            Factor::WindDirection => "Windrichtung",
            Factor::Windy => "Windig",
            Factor::CloudCover => "Bewölkung",
            Factor::RainBonus => "Regen_Bonus",
            Factor::RainMalus => "Regen_Malus",
            Factor::MoonPhase => "Mondphase",
            Factor::Turbidity => "Trübung",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Weight per factor; a key missing from the document keeps its default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    #[serde(rename = "Saison")]
    pub season: f64,
    #[serde(rename = "Temperatur")]
    pub temperature: f64,
    #[serde(rename = "Wassertiefe")]
    pub depth: f64,
    #[serde(rename = "TempTiefe_Match")]
    pub temp_depth_match: f64,
    #[serde(rename = "Tageszeitfenster")]
    pub time_of_day: f64,
    #[serde(rename = "Nacht_Boost")]
    pub night_boost: f64,
    #[serde(rename = "Luftdruck_trend")]
    pub pressure_trend: f64,
    #[serde(rename = "Windrichtung")]
    pub wind_direction: f64,
    #[serde(rename = "Windig")]
    pub windy: f64,
    #[serde(rename = "Bewölkung")]
    pub cloud_cover: f64,
    #[serde(rename = "Regen_Bonus")]
    pub rain_bonus: f64,
    #[serde(rename = "Regen_Malus")]
    pub rain_malus: f64,
    #[serde(rename = "Mondphase")]
    pub moon_phase: f64,
    #[serde(rename = "Trübung")]
    pub turbidity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            season: 8.0,
            temperature: 15.0,
            depth: 10.0,
            temp_depth_match: 15.0,
            time_of_day: 12.0,
            night_boost: 6.0,
            pressure_trend: 6.0,
            wind_direction: 3.0,
            windy: 4.0,
            cloud_cover: 4.0,
            rain_bonus: 4.0,
            rain_malus: 4.0,
            moon_phase: 4.0,
            turbidity: 4.0,
        }
    }
}

impl ScoringWeights {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Season => self.season,
            Factor::Temperature => self.temperature,
            Factor::Depth => self.depth,
            Factor::TempDepthMatch => self.temp_depth_match,
            Factor::TimeOfDay => self.time_of_day,
            Factor::NightBoost => self.night_boost,
            Factor::PressureTrend => self.pressure_trend,
            Factor::WindDirection => self.wind_direction,
            Factor::Windy => self.windy,
            Factor::CloudCover => self.cloud_cover,
            Factor::RainBonus => self.rain_bonus,
            Factor::RainMalus => self.rain_malus,
            Factor::MoonPhase => self.moon_phase,
            Factor::Turbidity => self.turbidity,
        }
    }

    /// Sum of every configured weight, the rain malus included
    pub fn total(&self) -> f64 {
        [
            self.season,
            self.temperature,
            self.depth,
            self.temp_depth_match,
            self.time_of_day,
            self.night_boost,
            self.pressure_trend,
            self.wind_direction,
            self.windy,
            self.cloud_cover,
            self.rain_bonus,
            self.rain_malus,
            self.moon_phase,
            self.turbidity,
        ]
        .iter()
        .sum()
    }

    /// Normalization divisor; never zero
    pub fn normalizer(&self) -> f64 {
        let total = self.total();
        if total > 0.0 {
            total
        } else {
            1.0
        }
    }
}

/// Base buffer minutes around the sun anchors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowBuffers {
    #[serde(rename = "Dämmerung", alias = "dawn_dusk")]
    pub dawn_dusk_min: f64,
    #[serde(rename = "Tag", alias = "midday")]
    pub midday_min: f64,
    #[serde(rename = "Nacht", alias = "night")]
    pub night_min: f64,
}

impl Default for WindowBuffers {
    fn default() -> Self {
        Self {
            dawn_dusk_min: 45.0,
            midday_min: 30.0,
            night_min: 30.0,
        }
    }
}

pub const DEFAULT_LIGHT_FLOOR: f64 = 0.3;

fn default_light_floor() -> f64 {
    DEFAULT_LIGHT_FLOOR
}

/// Everything the engine is parameterized with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(rename = "Bevorzugte_Gewichtungen", default)]
    pub weights: ScoringWeights,
    #[serde(rename = "Zeitfenster_Puffer", default)]
    pub buffers: WindowBuffers,
    /// Lower bound of the light factor applied to time-of-day points
    #[serde(rename = "Licht_Untergrenze", default = "default_light_floor")]
    pub light_floor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            buffers: WindowBuffers::default(),
            light_floor: DEFAULT_LIGHT_FLOOR,
        }
    }
}

impl EngineConfig {
    /// Parse a `weights.json` document
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a document, falling back to the built-in tables when it is
    /// malformed or fails validation
    pub fn from_json_str_or_default(json: &str) -> Self {
        match Self::from_json_str(json) {
            Ok(config) => match crate::validation::validate_engine_config(&config) {
                Ok(()) => config,
                Err(reason) => {
                    tracing::warn!("Invalid weight configuration, using built-in defaults: {}", reason);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Malformed weight configuration, using built-in defaults: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_total_includes_malus() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.total(), 99.0);
        assert_eq!(weights.get(Factor::RainMalus), 4.0);
    }

    #[test]
    fn test_partial_document_keeps_missing_defaults() {
        let json = r#"{"Bevorzugte_Gewichtungen": {"Saison": 20}, "Zeitfenster_Puffer": {"Tag": 10}}"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.weights.season, 20.0);
        assert_eq!(config.weights.temperature, 15.0);
        assert_eq!(config.buffers.midday_min, 10.0);
        assert_eq!(config.buffers.dawn_dusk_min, 45.0);
        assert_eq!(config.light_floor, DEFAULT_LIGHT_FLOOR);
    }

    #[test]
    fn test_malformed_document_falls_back() {
        let config = EngineConfig::from_json_str_or_default(r#"{"Bevorzugte_Gewichtungen": [1, 2]}"#);
        assert_eq!(config, EngineConfig::default());

        let config = EngineConfig::from_json_str_or_default("not json");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        let config =
            EngineConfig::from_json_str_or_default(r#"{"Zeitfenster_Puffer": {"Dämmerung": 1e12}}"#);
        assert_eq!(config, EngineConfig::default());

        let config =
            EngineConfig::from_json_str_or_default(r#"{"Bevorzugte_Gewichtungen": {"Saison": -8}}"#);
        assert_eq!(config, EngineConfig::default());

        let config =
            EngineConfig::from_json_str_or_default(r#"{"Zeitfenster_Puffer": {"Dämmerung": 60}}"#);
        assert_eq!(config.buffers.dawn_dusk_min, 60.0);
    }

    #[test]
    fn test_zero_weights_normalize_to_one() {
        let weights: ScoringWeights = serde_json::from_str(
            r#"{"Saison":0,"Temperatur":0,"Wassertiefe":0,"TempTiefe_Match":0,"Tageszeitfenster":0,
                "Nacht_Boost":0,"Luftdruck_trend":0,"Windrichtung":0,"Windig":0,"Bewölkung":0,
                "Regen_Bonus":0,"Regen_Malus":0,"Mondphase":0,"Trübung":0}"#,
        )
        .unwrap();
        assert_eq!(weights.normalizer(), 1.0);
    }

    #[test]
    fn test_factor_serializes_as_weight_key() {
        assert_eq!(serde_json::to_string(&Factor::CloudCover).unwrap(), "\"Bewölkung\"");
        assert_eq!(Factor::TempDepthMatch.to_string(), "TempTiefe_Match");
    }
}
