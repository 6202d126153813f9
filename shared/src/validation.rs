//! Validation utilities for Fishcast
//!
//! The engine accepts anything; these checks let the loader warn about
//! entries that would silently never match.

use crate::engine::ClosedSeason;
use crate::models::{EngineConfig, ScoringWeights, SpeciesPreference, WindowBuffers};
use crate::types::{
    is_wildcard, CompassPoint, DayPart, MoonPhase, TrendPreference, Turbidity, WeatherDescriptor,
};

// ============================================================================
// Preference Validations
// ============================================================================

/// Validate a best-season month
pub fn validate_month(month: u32) -> Result<(), &'static str> {
    if !(1..=12).contains(&month) {
        return Err("Months must be between 1 and 12");
    }
    Ok(())
}

/// Validate preferred depths in metres
pub fn validate_depths(depths: &[f64]) -> Result<(), &'static str> {
    for depth in depths {
        if !depth.is_finite() {
            return Err("Depths must be finite numbers");
        }
        if *depth < 0.0 {
            return Err("Depths cannot be negative");
        }
    }
    Ok(())
}

/// Validate preferred water temperatures in °C (liquid fresh water)
pub fn validate_water_temperatures(temps: &[f64]) -> Result<(), &'static str> {
    for temp in temps {
        if !temp.is_finite() || *temp < 0.0 || *temp > 40.0 {
            return Err("Water temperatures must be between 0 and 40 °C");
        }
    }
    Ok(())
}

fn all_parse<T: std::str::FromStr>(labels: &[String]) -> bool {
    labels
        .iter()
        .all(|label| is_wildcard(label) || label.parse::<T>().is_ok())
}

/// Collect every problem found in a preference profile
pub fn validate_preference(pref: &SpeciesPreference) -> Vec<&'static str> {
    let mut issues = Vec::new();

    if pref.name.trim().is_empty() {
        issues.push("Species name is empty");
    }
    if let Some(err) = pref.best_months.iter().find_map(|m| validate_month(*m).err()) {
        issues.push(err);
    }
    for depths in [
        &pref.depths_spring_autumn_m,
        &pref.depths_summer_m,
        &pref.depths_winter_m,
    ] {
        if let Err(err) = validate_depths(depths) {
            issues.push(err);
            break;
        }
    }
    if let Err(err) = validate_water_temperatures(&pref.water_temps_c) {
        issues.push(err);
    }
    if !all_parse::<DayPart>(&pref.day_parts) {
        issues.push("Unknown day-part label");
    }
    if !all_parse::<CompassPoint>(&pref.wind_directions) {
        issues.push("Unknown wind direction label");
    }
    if !all_parse::<MoonPhase>(&pref.moon_phases) {
        issues.push("Unknown moon phase label");
    }
    if !all_parse::<WeatherDescriptor>(&pref.weather) {
        issues.push("Unknown weather label");
    }
    if !all_parse::<Turbidity>(&pref.turbidity) {
        issues.push("Unknown turbidity label");
    }
    if !all_parse::<TrendPreference>(&pref.pressure_trends) {
        issues.push("Unknown pressure trend label");
    }
    if let Some(span) = &pref.closed_season {
        if ClosedSeason::parse(span).is_none() {
            issues.push("Closed season is not in the form \"1. Mai bis 30. Juni\"");
        }
    }
    if matches!(pref.minimum_size_cm, Some(size) if size < 0.0 || size.is_nan()) {
        issues.push("Minimum size cannot be negative");
    }

    issues
}

// ============================================================================
// Engine Configuration Validations
// ============================================================================

/// Validate the weight table
pub fn validate_weights(weights: &ScoringWeights) -> Result<(), &'static str> {
    let all = [
        weights.season,
        weights.temperature,
        weights.depth,
        weights.temp_depth_match,
        weights.time_of_day,
        weights.night_boost,
        weights.pressure_trend,
        weights.wind_direction,
        weights.windy,
        weights.cloud_cover,
        weights.rain_bonus,
        weights.rain_malus,
        weights.moon_phase,
        weights.turbidity,
    ];
    if all.iter().any(|w| !w.is_finite()) {
        return Err("Weights must be finite numbers");
    }
    if all.iter().any(|w| *w < 0.0) {
        return Err("Weights cannot be negative");
    }
    if weights.total() <= 0.0 {
        return Err("At least one weight must be positive");
    }
    Ok(())
}

/// Validate buffer minutes
pub fn validate_buffers(buffers: &WindowBuffers) -> Result<(), &'static str> {
    for minutes in [buffers.dawn_dusk_min, buffers.midday_min, buffers.night_min] {
        if !minutes.is_finite() || minutes < 0.0 {
            return Err("Buffer minutes must be non-negative numbers");
        }
        if minutes > 360.0 {
            return Err("Buffer minutes cannot exceed 6 hours");
        }
    }
    Ok(())
}

/// Validate a complete engine configuration
pub fn validate_engine_config(config: &EngineConfig) -> Result<(), &'static str> {
    validate_weights(&config.weights)?;
    validate_buffers(&config.buffers)?;
    if !(0.0..=1.0).contains(&config.light_floor) {
        return Err("Light floor must be between 0 and 1");
    }
    Ok(())
}

// ============================================================================
// Site Validations
// ============================================================================

/// Validate geographic coordinates in decimal degrees
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), &'static str> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_month() {
        assert!(validate_month(1).is_ok());
        assert!(validate_month(12).is_ok());
        assert!(validate_month(0).is_err());
        assert!(validate_month(13).is_err());
    }

    #[test]
    fn test_validate_depths() {
        assert!(validate_depths(&[0.0, 2.5, 10.0]).is_ok());
        assert!(validate_depths(&[]).is_ok());
        assert!(validate_depths(&[-1.0]).is_err());
        assert!(validate_depths(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_valid_preference_has_no_issues() {
        let pref = SpeciesPreference {
            name: "Hecht".into(),
            water_temps_c: vec![14.0, 18.0],
            depths_summer_m: vec![2.0, 4.0],
            day_parts: vec!["Morgen".into(), "Abend".into()],
            wind_directions: vec!["alle".into()],
            moon_phases: vec!["Halbmond".into()],
            weather: vec!["bewölkt".into(), "windig".into()],
            turbidity: vec!["leicht trüb".into()],
            pressure_trends: vec!["leicht fallend".into()],
            best_months: vec![5, 6, 10],
            closed_season: Some("1. Februar bis 30. April".into()),
            ..Default::default()
        };
        assert!(validate_preference(&pref).is_empty());
    }

    #[test]
    fn test_preference_issues_are_collected() {
        let pref = SpeciesPreference {
            name: "Zander".into(),
            best_months: vec![14],
            day_parts: vec!["Mittag".into()],
            closed_season: Some("immer".into()),
            ..Default::default()
        };
        let issues = validate_preference(&pref);
        assert_eq!(issues.len(), 3);
        assert!(issues.contains(&"Months must be between 1 and 12"));
        assert!(issues.contains(&"Unknown day-part label"));
    }

    #[test]
    fn test_validate_weights() {
        assert!(validate_weights(&ScoringWeights::default()).is_ok());
        let negative = ScoringWeights {
            season: -1.0,
            ..Default::default()
        };
        assert_eq!(validate_weights(&negative), Err("Weights cannot be negative"));
    }

    #[test]
    fn test_validate_engine_config() {
        assert!(validate_engine_config(&EngineConfig::default()).is_ok());
        let config = EngineConfig {
            light_floor: 1.5,
            ..Default::default()
        };
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(52.52, 13.40).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -181.0).is_err());
    }
}
