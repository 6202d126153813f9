//! Simplified lake thermal profile
//!
//! Summer water is stratified into a warm epilimnion, a thermocline with a
//! steep gradient and a cold hypolimnion. Spring and autumn are fully mixed.
//! Winter shows inverse stratification with 4 °C water below a thin film.

use crate::types::Season;

/// Cooling per metre inside the epilimnion
const EPILIMNION_GRADIENT: f64 = 0.2;
/// Cooling per metre inside the thermocline
const THERMOCLINE_GRADIENT: f64 = 1.2;
/// Cooling per metre below the thermocline
const HYPOLIMNION_GRADIENT: f64 = 0.3;
/// Density maximum of fresh water
const DENSE_WATER_C: f64 = 4.0;

/// Summer layer geometry in metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stratification {
    pub epilimnion_m: f64,
    pub thermocline_m: f64,
}

impl Stratification {
    /// Depth of the thermocline floor
    pub fn mixed_limit_m(&self) -> f64 {
        self.epilimnion_m + self.thermocline_m
    }
}

/// Layer geometry for stratified (summer) water; `None` means unbounded
pub fn stratification_layers(
    surface_temp_c: f64,
    season: Season,
    wind_speed_ms: f64,
) -> Option<Stratification> {
    if season != Season::Summer {
        return None;
    }
    let wind = wind_speed_ms.clamp(0.0, 5.0);
    Some(Stratification {
        epilimnion_m: (0.2 * (surface_temp_c - 4.0) + 0.2 * wind).clamp(2.0, 6.0),
        thermocline_m: (3.0 + 0.3 * wind).clamp(3.0, 5.0),
    })
}

/// Estimated water temperature at `depth_m` below the surface
pub fn temperature_at_depth(
    depth_m: f64,
    surface_temp_c: f64,
    season: Season,
    wind_speed_ms: f64,
    cloud_fraction: f64,
) -> f64 {
    match season {
        Season::Summer => {
            let Some(layers) = stratification_layers(surface_temp_c, season, wind_speed_ms) else {
                return surface_temp_c;
            };
            let epi = layers.epilimnion_m;
            let temp = if depth_m <= epi {
                surface_temp_c - depth_m * EPILIMNION_GRADIENT
            } else if depth_m <= layers.mixed_limit_m() {
                surface_temp_c - epi * EPILIMNION_GRADIENT - (depth_m - epi) * THERMOCLINE_GRADIENT
            } else {
                let hypo_start = surface_temp_c
                    - epi * EPILIMNION_GRADIENT
                    - layers.thermocline_m * THERMOCLINE_GRADIENT;
                hypo_start - (depth_m - layers.mixed_limit_m()) * HYPOLIMNION_GRADIENT
            };
            temp.max(DENSE_WATER_C)
        }
        Season::Spring | Season::Autumn => {
            surface_temp_c + 0.5 * (1.0 - cloud_fraction.clamp(0.0, 1.0))
        }
        Season::Winter => {
            if depth_m <= 0.5 {
                surface_temp_c.max(0.1)
            } else {
                DENSE_WATER_C
            }
        }
    }
}
