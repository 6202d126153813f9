//! Catch-probability scoring
//!
//! Every factor contributes independently to an unbounded score. The score
//! is normalized by the total configured weight, rounded up to a multiple of
//! five and floored at 10 % whenever anything matched at all.

use chrono::{DateTime, Datelike, Duration, FixedOffset};
use std::collections::BTreeMap;

use super::closed_season::closed_season_active;
use super::depth::{choose_best_depth, DepthBias, MixingConditions};
use super::thermal::temperature_at_depth;
use super::tips::build_tips;
use super::windows::{build_time_windows, LightConditions, SunTimes, RAIN_THRESHOLD_MM_H};
use crate::models::{
    EngineConfig, Factor, PreferenceSet, ScoredResult, ScoringWeights, SensorRecord,
    SpeciesPreference,
};
use crate::types::{
    is_wildcard, CloudCover, CompassPoint, DayPart, MoonPhase, Season, TrendPreference,
    Turbidity, WeatherDescriptor,
};

/// Precipitation above which the rain malus applies, in mm/h
pub const HEAVY_RAIN_MM_H: f64 = 5.0;
/// Share of the temperature weight needed for a temperature match
const MIN_TEMP_SHARE: f64 = 0.3;
/// Share of the pressure weight for a "slightly" preference
const SLIGHT_TREND_SHARE: f64 = 0.4;
/// Wind speed where the "windy" ramp starts and where it is full, in m/s
const WINDY_FROM_MS: f64 = 4.0;
const WINDY_FULL_MS: f64 = 8.0;

/// Round up to the next multiple of five, clamped to 0..=100
pub fn round_to_next_five(pct: f64) -> u8 {
    if !pct.is_finite() || pct <= 0.0 {
        return 0;
    }
    ((pct / 5.0).ceil() * 5.0).min(100.0) as u8
}

/// Gaussian bell scaled to `0..=weight`; zero for a non-positive sigma or
/// weight
pub fn gauss_score(diff: f64, weight: f64, sigma: f64) -> f64 {
    if sigma <= 0.0 || weight <= 0.0 {
        return 0.0;
    }
    weight * (-(diff * diff) / (2.0 * sigma * sigma)).exp()
}

/// Outcome of one factor, kept for tips and improvements
#[derive(Debug, Clone, PartialEq)]
pub struct FactorAssessment {
    pub factor: Factor,
    pub points: f64,
    pub matched: bool,
    pub current: String,
    pub recommended: String,
}

/// Temperature, depth and match sub-scores
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempDepthScore {
    pub temp_points: f64,
    pub depth_points: f64,
    pub match_points: f64,
    pub temp_at_depth_c: Option<f64>,
    pub depth_m: Option<f64>,
    pub matched: bool,
    pub temp_diff: Option<f64>,
    pub depth_diff: Option<f64>,
}

/// Score temperature at the fishing depth and the depth itself.
///
/// Without a surface temperature everything is zero and unknown.
pub fn score_temp_and_depth(
    record: &SensorRecord,
    pref: &SpeciesPreference,
    season: Season,
    bias: Option<DepthBias>,
    weights: &ScoringWeights,
) -> TempDepthScore {
    let Some(surface) = record.surface_temp_c else {
        return TempDepthScore::default();
    };
    let conditions = MixingConditions {
        wind_speed_ms: record.wind_speed(),
        cloud_fraction: record.cloud_fraction,
    };
    let preferred_depths = pref.depths_for(season);
    let depth = record.actual_depth_m.unwrap_or_else(|| {
        choose_best_depth(surface, season, preferred_depths, &pref.water_temps_c, bias, conditions)
    });
    let temp_at_depth = temperature_at_depth(
        depth,
        surface,
        season,
        conditions.wind_speed_ms,
        conditions.cloud_fraction,
    );

    let (temp_diff, sigma) = if pref.water_temps_c.is_empty() {
        ((temp_at_depth - surface).abs(), 2.0)
    } else {
        let diff = pref
            .water_temps_c
            .iter()
            .map(|t| (temp_at_depth - t).abs())
            .fold(f64::INFINITY, f64::min);
        let max = pref.water_temps_c.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = pref.water_temps_c.iter().copied().fold(f64::INFINITY, f64::min);
        let range = if max - min == 0.0 { 1.0 } else { max - min };
        (diff, 0.25 * range)
    };
    let temp_points = gauss_score(temp_diff, weights.temperature, sigma);
    let temp_ok = temp_points >= MIN_TEMP_SHARE * weights.temperature;

    let depth_diff = preferred_depths
        .iter()
        .map(|d| (depth - d).abs())
        .reduce(f64::min);
    let depth_points = match depth_diff {
        Some(diff) if diff <= 0.5 => weights.depth,
        Some(diff) if diff <= 1.0 => weights.depth * 0.5,
        _ => 0.0,
    };

    let matched = temp_ok && depth_points > 0.0;
    TempDepthScore {
        temp_points,
        depth_points,
        match_points: if matched { weights.temp_depth_match } else { 0.0 },
        temp_at_depth_c: Some(temp_at_depth),
        depth_m: Some(depth),
        matched,
        temp_diff: Some(temp_diff),
        depth_diff,
    }
}

/// Points for the pressure trend: full on a plain match, 40 % when only a
/// "slightly ..." preference matches
pub fn pressure_trend_share(record: &SensorRecord, pref: &SpeciesPreference) -> f64 {
    pref.pressure_trends
        .iter()
        .filter_map(|raw| raw.parse::<TrendPreference>().ok())
        .filter(|p| p.trend == record.pressure_trend)
        .map(|p| if p.slight { SLIGHT_TREND_SHARE } else { 1.0 })
        .fold(0.0, f64::max)
}

fn moon_matches(observed: Option<MoonPhase>, pref: &SpeciesPreference) -> bool {
    pref.moon_phases.iter().any(|label| {
        if is_wildcard(label) {
            return true;
        }
        match (label.parse::<MoonPhase>(), observed) {
            (Ok(wanted), Some(phase)) => {
                wanted == phase || (wanted == MoonPhase::Half && phase.in_half_moon_category())
            }
            _ => false,
        }
    })
}

fn wind_direction_matches(direction: Option<CompassPoint>, pref: &SpeciesPreference) -> bool {
    pref.accepts_any_wind_direction()
        || direction.is_some_and(|dir| {
            pref.wind_directions
                .iter()
                .any(|label| label.parse::<CompassPoint>().ok() == Some(dir))
        })
}

fn preferred_skies(pref: &SpeciesPreference) -> Vec<CloudCover> {
    pref.weather
        .iter()
        .filter_map(|label| match label.parse::<WeatherDescriptor>() {
            Ok(WeatherDescriptor::Sky(sky)) => Some(sky),
            _ => None,
        })
        .collect()
}

fn prefers_windy(pref: &SpeciesPreference) -> bool {
    pref.weather
        .iter()
        .any(|label| matches!(label.parse::<WeatherDescriptor>(), Ok(WeatherDescriptor::Windy)))
}

/// Full share in a best month, half next to one (December and January are
/// adjacent)
fn season_share(month: u32, best_months: &[u32]) -> f64 {
    let prev = if month == 1 { 12 } else { month - 1 };
    let next = if month == 12 { 1 } else { month + 1 };
    if best_months.contains(&month) {
        1.0
    } else if best_months.contains(&prev) || best_months.contains(&next) {
        0.5
    } else {
        0.0
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Running score for one record, logging each contribution
struct Tally<'a> {
    species: &'a str,
    score: f64,
    contributions: BTreeMap<Factor, f64>,
    assessments: Vec<FactorAssessment>,
}

impl<'a> Tally<'a> {
    fn new(species: &'a str) -> Self {
        Self {
            species,
            score: 0.0,
            contributions: BTreeMap::new(),
            assessments: Vec::new(),
        }
    }

    fn add(&mut self, factor: Factor, points: f64) {
        self.score += points;
        *self.contributions.entry(factor).or_insert(0.0) += points;
        tracing::debug!(
            species = self.species,
            factor = factor.key(),
            points,
            total = self.score,
            "score contribution"
        );
    }

    fn assess(
        &mut self,
        factor: Factor,
        points: f64,
        matched: bool,
        current: impl Into<String>,
        recommended: impl Into<String>,
    ) {
        self.add(factor, points);
        self.assessments.push(FactorAssessment {
            factor,
            points,
            matched,
            current: current.into(),
            recommended: recommended.into(),
        });
    }
}

/// Score one batch of sensor records against the species preferences.
///
/// Results keep the input order. `as_of` is the evaluation instant; season,
/// day-part containment and closed seasons all derive from it.
pub fn compute_catch_probability_and_window(
    records: &[SensorRecord],
    preferences: &PreferenceSet,
    sun: &SunTimes,
    config: &EngineConfig,
    as_of: DateTime<FixedOffset>,
) -> Vec<ScoredResult> {
    records
        .iter()
        .map(|record| {
            let pref = match preferences.get(&record.species) {
                Some(pref) => pref.clone(),
                None => {
                    tracing::warn!("No preferences for species {}, scoring without", record.species);
                    SpeciesPreference {
                        name: record.species.clone(),
                        ..Default::default()
                    }
                }
            };
            score_record(record, pref, sun, config, as_of)
        })
        .collect()
}

fn score_record(
    record: &SensorRecord,
    pref: SpeciesPreference,
    sun: &SunTimes,
    config: &EngineConfig,
    as_of: DateTime<FixedOffset>,
) -> ScoredResult {
    let weights = &config.weights;
    let now = as_of.time();
    let month = as_of.month();
    let season = Season::from_month(month);
    let light = LightConditions {
        cloud_fraction: record.cloud_fraction,
        wind_speed_ms: record.wind_speed(),
        precip_mm_h: record.precip_mm_h,
    };
    let is_dark = sun.is_dark_at(now);
    let mut tally = Tally::new(&record.species);

    // Temperature and depth
    let bias_windows = build_time_windows(
        sun,
        &[DayPart::Morning, DayPart::Evening, DayPart::Night],
        light,
        &config.buffers,
    );
    let bias = bias_windows
        .values()
        .any(|w| w.contains(now))
        .then_some(DepthBias::Shallow);
    let td = score_temp_and_depth(record, &pref, season, bias, weights);
    tally.add(Factor::Temperature, td.temp_points);
    tally.add(Factor::Depth, td.depth_points);
    let preferred_depths = pref.depths_for(season);
    if !pref.water_temps_c.is_empty() || !preferred_depths.is_empty() {
        let current = match (td.temp_at_depth_c, td.depth_m) {
            (Some(t), Some(d)) => format!("{:.1} °C in {} m", t, format_number(d)),
            _ => "unbekannt".to_string(),
        };
        let recommended = format!(
            "{} °C in {} m",
            join(&pref.water_temps_c.iter().map(|t| format_number(*t)).collect::<Vec<_>>()),
            join(&preferred_depths.iter().map(|d| format_number(*d)).collect::<Vec<_>>())
        );
        tally.assess(Factor::TempDepthMatch, td.match_points, td.matched, current, recommended);
    } else {
        tally.add(Factor::TempDepthMatch, td.match_points);
    }

    // Wind direction
    let wind_direction = record.wind_bearing_deg.and_then(CompassPoint::from_bearing);
    if !pref.wind_directions.is_empty() {
        let matched = wind_direction_matches(wind_direction, &pref);
        tally.assess(
            Factor::WindDirection,
            if matched { weights.wind_direction } else { 0.0 },
            matched,
            wind_direction.map_or("unbekannt".to_string(), |d| d.to_string()),
            join(&pref.wind_directions),
        );
    }

    // Turbidity
    let turbidity = record.turbidity_class();
    if !pref.turbidity.is_empty() {
        let matched = pref
            .turbidity
            .iter()
            .any(|label| label.parse::<Turbidity>().ok() == Some(turbidity));
        tally.assess(
            Factor::Turbidity,
            if matched { weights.turbidity } else { 0.0 },
            matched,
            turbidity.to_string(),
            join(&pref.turbidity),
        );
    }

    // Wind speed
    if prefers_windy(&pref) {
        let wind = record.wind_speed();
        let share = if wind >= WINDY_FROM_MS {
            ((wind - WINDY_FROM_MS) / (WINDY_FULL_MS - WINDY_FROM_MS)).min(1.0)
        } else {
            0.0
        };
        tally.assess(
            Factor::Windy,
            weights.windy * share,
            share > 0.0,
            format!("{} m/s", format_number(wind)),
            format!("ab {} m/s", format_number(WINDY_FULL_MS)),
        );
    }

    // Moon phase
    if !pref.moon_phases.is_empty() {
        let matched = moon_matches(record.moon_phase, &pref);
        tally.assess(
            Factor::MoonPhase,
            if matched { weights.moon_phase } else { 0.0 },
            matched,
            record.moon_phase.map_or("unbekannt".to_string(), |p| p.to_string()),
            join(&pref.moon_phases),
        );
    }

    // Season
    if !pref.best_months.is_empty() {
        let share = season_share(month, &pref.best_months);
        tally.assess(
            Factor::Season,
            weights.season * share,
            share > 0.0,
            format!("Monat {}", month),
            format!("Monate {}", join(&pref.best_months)),
        );
    }

    // Cloud cover, daylight only
    let skies = preferred_skies(&pref);
    if !skies.is_empty() && is_dark != Some(true) {
        let sky = CloudCover::classify(record.cloud_fraction);
        let matched = skies.contains(&sky);
        tally.assess(
            Factor::CloudCover,
            if matched { weights.cloud_cover } else { 0.0 },
            matched,
            sky.to_string(),
            join(&skies),
        );
    }

    // Rain bonus
    if pref.rain {
        let raining = record.precip_mm_h >= RAIN_THRESHOLD_MM_H;
        tally.assess(
            Factor::RainBonus,
            if raining { weights.rain_bonus } else { 0.0 },
            raining,
            if raining { "regen" } else { "trocken" },
            "regen",
        );
    }

    // Pressure trend
    if !pref.pressure_trends.is_empty() {
        let share = pressure_trend_share(record, &pref);
        tally.assess(
            Factor::PressureTrend,
            weights.pressure_trend * share,
            share > 0.0,
            record.pressure_trend.to_string(),
            join(&pref.pressure_trends),
        );
    }

    // Time of day
    let parts = pref.requested_day_parts();
    let windows = build_time_windows(sun, &parts, light, &config.buffers);
    if !parts.is_empty() {
        let per_window = weights.time_of_day * light.level().max(config.light_floor);
        let hits = windows
            .values()
            .filter(|w| w.contains(now) || w.near_edge(now, Duration::hours(1)))
            .count();
        let points = per_window * hits as f64;
        tally.assess(
            Factor::TimeOfDay,
            points,
            points > 0.0,
            now.format("%H:%M").to_string(),
            join(&parts),
        );
    }

    // Night boost
    if is_dark == Some(true) && parts.contains(&DayPart::Night) {
        tally.add(Factor::NightBoost, weights.night_boost);
    }

    // Probability
    let score = tally.score;
    let mut probability = if score > 0.0 {
        round_to_next_five(score / weights.normalizer() * 100.0).max(10)
    } else {
        0
    };
    let heavy_rain = record.precip_mm_h > HEAVY_RAIN_MM_H;
    if heavy_rain {
        let reduced = (f64::from(probability) - weights.rain_malus).max(0.0);
        probability = ((reduced / 5.0).floor() * 5.0) as u8;
        tally.contributions.insert(Factor::RainMalus, -weights.rain_malus);
        tally.assessments.push(FactorAssessment {
            factor: Factor::RainMalus,
            points: -weights.rain_malus,
            matched: false,
            current: format!("{} mm/h", format_number(record.precip_mm_h)),
            recommended: format!("höchstens {} mm/h", format_number(HEAVY_RAIN_MM_H)),
        });
        tracing::debug!(
            species = %record.species,
            malus = weights.rain_malus,
            probability,
            "rain malus applied"
        );
    }

    let closed_season = pref
        .closed_season
        .as_deref()
        .and_then(|span| closed_season_active(span, as_of.date_naive()));
    let (tips, improvements) = build_tips(&tally.assessments, closed_season, pref.closed_season.as_deref());

    tracing::debug!(
        species = %record.species,
        score,
        probability,
        "catch probability computed"
    );

    ScoredResult {
        season,
        water_temp_at_depth_c: td.temp_at_depth_c,
        fishing_depth_m: td.depth_m,
        temp_depth_match: td.matched,
        wind_direction,
        turbidity,
        best_window: windows.iter().map(|(part, w)| (*part, w.clock())).collect(),
        probability_pct: probability,
        score,
        contributions: tally.contributions,
        tips,
        improvements,
        closed_season_active: closed_season,
        record: record.clone(),
        preference: pref,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_next_five() {
        assert_eq!(round_to_next_five(0.0), 0);
        assert_eq!(round_to_next_five(1.0), 5);
        assert_eq!(round_to_next_five(5.0), 5);
        assert_eq!(round_to_next_five(41.2), 45);
        assert_eq!(round_to_next_five(180.0), 100);
        assert_eq!(round_to_next_five(-3.0), 0);
    }

    #[test]
    fn test_gauss_score() {
        assert_eq!(gauss_score(0.0, 15.0, 2.0), 15.0);
        assert_eq!(gauss_score(1.0, 15.0, 0.0), 0.0);
        assert_eq!(gauss_score(1.0, 0.0, 2.0), 0.0);
        let one_sigma = gauss_score(2.0, 10.0, 2.0);
        assert!((one_sigma - 10.0 * (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_season_share_wraps_year() {
        assert_eq!(season_share(7, &[6, 7, 8]), 1.0);
        assert_eq!(season_share(5, &[6, 7, 8]), 0.5);
        assert_eq!(season_share(3, &[6, 7, 8]), 0.0);
        assert_eq!(season_share(1, &[12]), 0.5);
        assert_eq!(season_share(12, &[1]), 0.5);
    }

    #[test]
    fn test_pressure_trend_share() {
        let mut record = SensorRecord::new("Hecht");
        record.pressure_trend = crate::types::PressureTrend::Falling;
        let slight = SpeciesPreference {
            pressure_trends: vec!["leicht fallend".into()],
            ..Default::default()
        };
        assert_eq!(pressure_trend_share(&record, &slight), SLIGHT_TREND_SHARE);
        let both = SpeciesPreference {
            pressure_trends: vec!["leicht fallend".into(), "fallend".into()],
            ..Default::default()
        };
        assert_eq!(pressure_trend_share(&record, &both), 1.0);
        record.pressure_trend = crate::types::PressureTrend::Unknown;
        assert_eq!(pressure_trend_share(&record, &both), 0.0);

        let unknown = SpeciesPreference {
            pressure_trends: vec!["unbekannt".into()],
            ..Default::default()
        };
        assert_eq!(pressure_trend_share(&record, &unknown), 1.0);
    }

    #[test]
    fn test_half_moon_category() {
        let pref = SpeciesPreference {
            moon_phases: vec!["Halbmond".into()],
            ..Default::default()
        };
        assert!(moon_matches(Some(MoonPhase::Waxing), &pref));
        assert!(moon_matches(Some(MoonPhase::Half), &pref));
        assert!(!moon_matches(Some(MoonPhase::Full), &pref));
        let all = SpeciesPreference {
            moon_phases: vec!["alle".into()],
            ..Default::default()
        };
        assert!(moon_matches(None, &all));
    }

    #[test]
    fn test_missing_surface_temperature_zeroes_temp_depth() {
        let pref = SpeciesPreference {
            water_temps_c: vec![16.0],
            depths_summer_m: vec![2.0],
            ..Default::default()
        };
        let score = score_temp_and_depth(
            &SensorRecord::new("Hecht"),
            &pref,
            Season::Summer,
            None,
            &ScoringWeights::default(),
        );
        assert_eq!(score, TempDepthScore::default());
    }

    #[test]
    fn test_temp_and_depth_match() {
        let mut record = SensorRecord::new("Hecht");
        record.surface_temp_c = Some(18.0);
        record.wind_speed_ms = Some(2.0);
        let pref = SpeciesPreference {
            water_temps_c: vec![16.0, 18.0],
            depths_summer_m: vec![2.0],
            ..Default::default()
        };
        let score = score_temp_and_depth(&record, &pref, Season::Summer, None, &ScoringWeights::default());
        assert_eq!(score.depth_m, Some(2.0));
        assert!((score.temp_at_depth_c.unwrap() - 17.6).abs() < 1e-9);
        assert_eq!(score.depth_points, 10.0);
        assert!(score.matched);
        assert_eq!(score.match_points, 15.0);
    }
}
