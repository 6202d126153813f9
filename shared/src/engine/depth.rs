//! Fishing depth selection

use super::thermal::{stratification_layers, temperature_at_depth};
use crate::types::Season;

/// Step applied by a time-of-day depth bias
const BIAS_STEP_M: f64 = 0.5;

/// Time-of-day nudge toward the shallow or the deep end of the preferred
/// depths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthBias {
    Shallow,
    Deep,
}

/// Water conditions the thermal model needs besides the surface reading
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MixingConditions {
    pub wind_speed_ms: f64,
    pub cloud_fraction: f64,
}

/// Choose the preferred depth whose modeled temperature is closest to the
/// species' target temperature.
///
/// Candidates below the summer thermocline floor are skipped unless no
/// candidate is left. The first of several equally good depths wins.
/// Returns 0.0 when there are no preferred depths.
pub fn choose_best_depth(
    surface_temp_c: f64,
    season: Season,
    preferred_depths: &[f64],
    preferred_temps: &[f64],
    bias: Option<DepthBias>,
    conditions: MixingConditions,
) -> f64 {
    if preferred_depths.is_empty() {
        return 0.0;
    }

    let limit = stratification_layers(surface_temp_c, season, conditions.wind_speed_ms)
        .map(|layers| layers.mixed_limit_m())
        .unwrap_or(f64::INFINITY);
    let mut candidates: Vec<f64> = preferred_depths.iter().copied().filter(|d| *d <= limit).collect();
    if candidates.is_empty() {
        candidates = preferred_depths.to_vec();
    }

    let target = if preferred_temps.is_empty() {
        surface_temp_c
    } else {
        preferred_temps.iter().sum::<f64>() / preferred_temps.len() as f64
    };

    let mut best = candidates[0];
    let mut best_diff = f64::INFINITY;
    for depth in candidates {
        let modeled = temperature_at_depth(
            depth,
            surface_temp_c,
            season,
            conditions.wind_speed_ms,
            conditions.cloud_fraction,
        );
        let diff = (modeled - target).abs();
        if diff < best_diff {
            best = depth;
            best_diff = diff;
        }
    }

    let shallowest = preferred_depths.iter().copied().fold(f64::INFINITY, f64::min);
    let deepest = preferred_depths.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    match bias {
        Some(DepthBias::Shallow) if best > shallowest => shallowest.max(best - BIAS_STEP_M),
        Some(DepthBias::Deep) if best < deepest => deepest.min(best + BIAS_STEP_M),
        _ => best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> MixingConditions {
        MixingConditions::default()
    }

    #[test]
    fn test_no_preferred_depths() {
        assert_eq!(choose_best_depth(18.0, Season::Summer, &[], &[15.0], None, calm()), 0.0);
    }

    #[test]
    fn test_picks_depth_closest_to_target() {
        // Calm summer at 20 °C: epi 3.2 m, limit 6.2 m; 5 m models ~17.4 °C
        let depth = choose_best_depth(20.0, Season::Summer, &[1.0, 5.0], &[14.0], None, calm());
        assert_eq!(depth, 5.0);
    }

    #[test]
    fn test_skips_depths_below_thermocline() {
        let depth = choose_best_depth(20.0, Season::Summer, &[2.0, 12.0], &[4.0], None, calm());
        assert_eq!(depth, 2.0);
        // Nothing above the limit: the full list is used
        let depth = choose_best_depth(20.0, Season::Summer, &[12.0, 15.0], &[16.0], None, calm());
        assert_eq!(depth, 12.0);
    }

    #[test]
    fn test_first_minimal_depth_wins() {
        // Mixed water: every depth models the same temperature
        let depth = choose_best_depth(12.0, Season::Spring, &[3.0, 1.0, 2.0], &[], None, calm());
        assert_eq!(depth, 3.0);
    }

    #[test]
    fn test_bias_never_crosses_preferred_range() {
        let depths = [3.0, 1.0, 1.2];
        let shallow = choose_best_depth(12.0, Season::Spring, &depths, &[], Some(DepthBias::Shallow), calm());
        assert_eq!(shallow, 2.5);
        let shallow = choose_best_depth(12.0, Season::Spring, &[1.2, 1.0], &[], Some(DepthBias::Shallow), calm());
        assert_eq!(shallow, 1.0);
        let deep = choose_best_depth(12.0, Season::Spring, &[2.8, 3.0], &[], Some(DepthBias::Deep), calm());
        assert_eq!(deep, 3.0);
    }
}
