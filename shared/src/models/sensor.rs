//! Per-species environmental readings for one evaluation cycle

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::types::{MoonPhase, PressureTrend, Turbidity};

/// Turbidity as observed: a label or a level 0 (clear) to 2 (turbid)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurbidityObservation {
    Level(i64),
    Label(String),
}

impl TurbidityObservation {
    /// "trüb"/"stark trüb"/2 turbid, "leicht trüb"/1 slightly turbid,
    /// anything else clear
    pub fn classify(&self) -> Turbidity {
        match self {
            TurbidityObservation::Level(2) => Turbidity::Turbid,
            TurbidityObservation::Level(1) => Turbidity::SlightlyTurbid,
            TurbidityObservation::Level(_) => Turbidity::Clear,
            TurbidityObservation::Label(label) => label.parse().unwrap_or_default(),
        }
    }
}

/// One species' readings for one cycle
///
/// Optional fields are "unknown", never zero. Cloud fraction and
/// precipitation default to 0.0 when the source has no value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    #[serde(rename = "Art", alias = "species")]
    pub species: String,
    #[serde(rename = "Temperatur jetzt", alias = "air_temp_c", default)]
    pub air_temp_c: Option<f64>,
    #[serde(rename = "Luftdruck", alias = "pressure_hpa", default)]
    pub pressure_hpa: Option<f64>,
    #[serde(rename = "Windgeschwindigkeit", alias = "wind_speed_ms", default)]
    pub wind_speed_ms: Option<f64>,
    #[serde(rename = "windBearing", alias = "wind_bearing_deg", default)]
    pub wind_bearing_deg: Option<f64>,
    #[serde(rename = "Mondphase", alias = "moon_phase", default)]
    pub moon_phase: Option<MoonPhase>,
    #[serde(rename = "Oberfläche_temp", alias = "surface_temp_c", default)]
    pub surface_temp_c: Option<f64>,
    #[serde(rename = "cloudFraction", alias = "cloud_fraction", default)]
    pub cloud_fraction: f64,
    #[serde(rename = "precipIntensity", alias = "precip_mm_h", default)]
    pub precip_mm_h: f64,
    #[serde(rename = "Luftdruck_trend", alias = "pressure_trend", default)]
    pub pressure_trend: PressureTrend,
    #[serde(rename = "Trübung_beobachtet", alias = "turbidity_observed", default)]
    pub turbidity: Option<TurbidityObservation>,
    /// Fixed fishing depth; skips depth selection when set
    #[serde(rename = "actual_depth", default)]
    pub actual_depth_m: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl SensorRecord {
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            ..Default::default()
        }
    }

    pub fn wind_speed(&self) -> f64 {
        self.wind_speed_ms.unwrap_or(0.0)
    }

    /// Unobserved turbidity counts as clear
    pub fn turbidity_class(&self) -> Turbidity {
        self.turbidity
            .as_ref()
            .map(TurbidityObservation::classify)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turbidity_classification() {
        assert_eq!(TurbidityObservation::Level(2).classify(), Turbidity::Turbid);
        assert_eq!(TurbidityObservation::Level(1).classify(), Turbidity::SlightlyTurbid);
        assert_eq!(TurbidityObservation::Level(0).classify(), Turbidity::Clear);
        assert_eq!(
            TurbidityObservation::Label("stark trüb".into()).classify(),
            Turbidity::Turbid
        );
        assert_eq!(
            TurbidityObservation::Label("milchig".into()).classify(),
            Turbidity::Clear
        );
        assert_eq!(SensorRecord::new("Hecht").turbidity_class(), Turbidity::Clear);
    }

    #[test]
    fn test_record_defaults_from_sparse_json() {
        let record: SensorRecord =
            serde_json::from_str(r#"{"Art": "Hecht", "Luftdruck": 1013.2, "Trübung_beobachtet": 1}"#)
                .unwrap();
        assert_eq!(record.species, "Hecht");
        assert_eq!(record.pressure_hpa, Some(1013.2));
        assert_eq!(record.surface_temp_c, None);
        assert_eq!(record.cloud_fraction, 0.0);
        assert_eq!(record.precip_mm_h, 0.0);
        assert_eq!(record.pressure_trend, PressureTrend::Unknown);
        assert_eq!(record.turbidity_class(), Turbidity::SlightlyTurbid);
    }
}
