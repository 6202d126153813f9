//! Species preference profiles

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::types::{is_wildcard, DayPart, Season};

/// Static preference profile of one species
///
/// Keys follow the German layout of `fisch.json`; English aliases are
/// accepted. Every list may be empty, meaning "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesPreference {
    #[serde(rename = "Art", alias = "species", skip_serializing)]
    pub name: String,
    #[serde(rename = "Bevorzugte_Wassertemperatur", alias = "preferred_water_temperature")]
    pub water_temps_c: Vec<f64>,
    #[serde(
        rename = "Bevorzugte_Wassertiefe_Frühling_Herbst",
        alias = "preferred_depth_spring_autumn"
    )]
    pub depths_spring_autumn_m: Vec<f64>,
    #[serde(rename = "Bevorzugte_Wassertiefe_Sommer", alias = "preferred_depth_summer")]
    pub depths_summer_m: Vec<f64>,
    #[serde(rename = "Bevorzugte_Wassertiefe_Winter", alias = "preferred_depth_winter")]
    pub depths_winter_m: Vec<f64>,
    #[serde(rename = "Bevorzugte_Tageszeit", alias = "preferred_day_parts")]
    pub day_parts: Vec<String>,
    #[serde(rename = "Bevorzugte_Windrichtung", alias = "preferred_wind_directions")]
    pub wind_directions: Vec<String>,
    #[serde(rename = "Bevorzugte_Mondphase", alias = "preferred_moon_phases")]
    pub moon_phases: Vec<String>,
    #[serde(rename = "Bevorzugte_Wetter", alias = "preferred_weather")]
    pub weather: Vec<String>,
    #[serde(rename = "Trübung", alias = "turbidity")]
    pub turbidity: Vec<String>,
    #[serde(rename = "Bevorzugter_Luftdrucktrend", alias = "preferred_pressure_trend")]
    pub pressure_trends: Vec<String>,
    #[serde(rename = "Regen", alias = "rain")]
    pub rain: bool,
    #[serde(
        rename = "Beste_Fangsaison",
        alias = "best_months",
        deserialize_with = "lenient_months"
    )]
    pub best_months: Vec<u32>,
    /// Closed season, e.g. "1. März bis 30. April"
    #[serde(rename = "Schonzeit", alias = "closed_season")]
    pub closed_season: Option<String>,
    #[serde(rename = "Schonmaß_cm", alias = "minimum_size_cm")]
    pub minimum_size_cm: Option<f64>,
    /// Jurisdiction of the closed season: "D" or "EU"
    #[serde(rename = "Schonbereich", alias = "closed_season_region")]
    pub closed_season_region: Option<String>,
}

impl SpeciesPreference {
    /// Preferred depths for the season group the season belongs to
    pub fn depths_for(&self, season: Season) -> &[f64] {
        match season {
            Season::Spring | Season::Autumn => &self.depths_spring_autumn_m,
            Season::Summer => &self.depths_summer_m,
            Season::Winter => &self.depths_winter_m,
        }
    }

    /// Requested day-parts; unknown labels are skipped
    pub fn requested_day_parts(&self) -> Vec<DayPart> {
        let mut parts: Vec<DayPart> = self
            .day_parts
            .iter()
            .filter_map(|label| label.parse().ok())
            .collect();
        parts.sort();
        parts.dedup();
        parts
    }

    pub fn accepts_any_wind_direction(&self) -> bool {
        self.wind_directions.iter().any(|d| is_wildcard(d))
    }
}

/// Month lists accept integers and digit strings; anything else is dropped
fn lenient_months<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::Number(n) => n.as_u64().map(|m| m as u32),
            serde_json::Value::String(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => {
                s.parse().ok()
            }
            _ => None,
        })
        .collect())
}

/// Preferences keyed by species name
#[derive(Debug, Clone, Default)]
pub struct PreferenceSet {
    species: HashMap<String, SpeciesPreference>,
    order: Vec<String>,
}

impl PreferenceSet {
    /// Build a set from profiles; the first profile of a name wins.
    /// Returns the set and the names that were dropped as duplicates.
    pub fn from_profiles(profiles: impl IntoIterator<Item = SpeciesPreference>) -> (Self, Vec<String>) {
        let mut set = PreferenceSet::default();
        let mut duplicates = Vec::new();
        for profile in profiles {
            if set.species.contains_key(&profile.name) {
                duplicates.push(profile.name.clone());
                continue;
            }
            set.order.push(profile.name.clone());
            set.species.insert(profile.name.clone(), profile);
        }
        (set, duplicates)
    }

    /// Parse a JSON preference document: a list of records carrying
    /// `"Art"`, or an object keyed by species name
    pub fn from_json_str(json: &str) -> Result<(Self, Vec<String>), serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let profiles = match value {
            serde_json::Value::Object(map) => {
                let mut profiles = Vec::with_capacity(map.len());
                for (name, entry) in map {
                    let mut profile: SpeciesPreference = serde_json::from_value(entry)?;
                    profile.name = name;
                    profiles.push(profile);
                }
                profiles
            }
            other => serde_json::from_value::<Vec<SpeciesPreference>>(other)?,
        };
        Ok(Self::from_profiles(profiles))
    }

    pub fn get(&self, species: &str) -> Option<&SpeciesPreference> {
        self.species.get(species)
    }

    pub fn get_mut(&mut self, species: &str) -> Option<&mut SpeciesPreference> {
        self.species.get_mut(species)
    }

    /// Species names in document order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
