//! One evaluation cycle: collect readings, derive trends, score every species

use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate};
use shared::{
    compute_catch_probability_and_window, MoonPhase, PreferenceSet, PressureTrend, ScoredResult,
    SensorRecord, SunTimes, TurbidityObservation,
};

use crate::config::Config;
use crate::error::AppResult;
use crate::external::{ClosedSeasonClient, Forecast, Observation, SurfaceTempClient, WeatherClient};
use crate::services::preferences::{load_engine_config, load_preferences};
use crate::services::pressure::{apply_pressure_trends, PressureStore};

const FALLBACK_SUNRISE_HOUR: u32 = 5;
const FALLBACK_SUNSET_HOUR: u32 = 21;

/// Readings shared by every species of one cycle
#[derive(Debug, Clone, Default)]
pub struct SiteConditions {
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub surface_temp_c: Option<f64>,
    /// Replaces the observation's own cloud cover when set
    pub cloud_fraction: Option<f64>,
    pub moon_phase: Option<MoonPhase>,
    pub turbidity: Option<TurbidityObservation>,
}

/// One sensor record per species, in preference order
pub fn build_records(
    preferences: &PreferenceSet,
    observation: &Observation,
    site: &SiteConditions,
) -> Vec<SensorRecord> {
    preferences
        .names()
        .map(|species| SensorRecord {
            species: species.to_string(),
            air_temp_c: observation.temperature_c,
            pressure_hpa: observation.pressure_hpa,
            wind_speed_ms: observation.wind_speed_ms,
            wind_bearing_deg: observation.wind_bearing_deg,
            moon_phase: site.moon_phase,
            surface_temp_c: site.surface_temp_c,
            cloud_fraction: site
                .cloud_fraction
                .or(observation.cloud_fraction)
                .unwrap_or(0.0),
            precip_mm_h: observation.precip_mm_h.unwrap_or(0.0),
            pressure_trend: PressureTrend::Unknown,
            turbidity: site.turbidity.clone(),
            actual_depth_m: None,
            timestamp: site.timestamp.or(observation.time),
        })
        .collect()
}

/// "2" -> level 2, anything else is kept as a label
pub fn parse_turbidity_observation(raw: &str) -> TurbidityObservation {
    match raw.trim().parse::<i64>() {
        Ok(level) => TurbidityObservation::Level(level),
        Err(_) => TurbidityObservation::Label(raw.trim().to_string()),
    }
}

/// Keep complete sun anchors, otherwise use 05:00 and 21:00 local time
pub fn sun_times_or_fallback(sun: SunTimes, date: NaiveDate, offset: FixedOffset) -> SunTimes {
    if sun.sunrise.is_some() && sun.sunset.is_some() {
        return sun;
    }
    tracing::warn!(%date, "Sun times unavailable, falling back to 05:00/21:00");
    let at = |hour: u32| {
        date.and_hms_opt(hour, 0, 0)
            .and_then(|naive| naive.and_local_timezone(offset).single())
    };
    SunTimes {
        sunrise: at(FALLBACK_SUNRISE_HOUR),
        sunset: at(FALLBACK_SUNSET_HOUR),
    }
}

/// Collaborators and stores of the service
pub struct FishcastService {
    pub(crate) config: Config,
    pub(crate) weather: Option<WeatherClient>,
    surface_temp: Option<SurfaceTempClient>,
    regulations: Option<ClosedSeasonClient>,
    pressure_store: PressureStore,
}

impl FishcastService {
    pub fn new(config: Config) -> AppResult<Self> {
        let weather = match (&config.weather.api_key, config.coordinates()) {
            (Some(key), Some(_)) => Some(
                WeatherClient::with_base_url(key.clone(), config.weather.base_url.clone())
                    .with_timeout(Duration::from_secs(config.weather.timeout_secs))?,
            ),
            _ => {
                tracing::warn!("Weather API key or site coordinates missing, weather readings stay empty");
                None
            }
        };

        let surface_temp = match (&config.surface_temp.url, config.surface_temp.override_c) {
            (Some(url), None) => Some(SurfaceTempClient::new(
                url.clone(),
                Duration::from_secs(config.surface_temp.timeout_secs),
            )?),
            _ => None,
        };

        let regulations = match &config.regulations.url {
            Some(url) => Some(ClosedSeasonClient::new(
                url.clone(),
                Duration::from_secs(config.regulations.timeout_secs),
            )?),
            None => None,
        };

        let pressure_store = PressureStore::new(config.paths.pressure_store.clone());

        Ok(Self {
            config,
            weather,
            surface_temp,
            regulations,
            pressure_store,
        })
    }

    /// Current forecast; failures are logged and yield `None`
    async fn fetch_forecast(&self) -> Option<Forecast> {
        let client = self.weather.as_ref()?;
        let (latitude, longitude) = self.config.coordinates()?;
        match client.get_forecast(latitude, longitude).await {
            Ok(forecast) => Some(forecast),
            Err(e) => {
                tracing::warn!(code = e.code(), "Weather fetch failed: {}", e);
                None
            }
        }
    }

    pub(crate) async fn fetch_surface_temp(&self) -> Option<f64> {
        if let Some(fixed) = self.config.surface_temp.override_c {
            return Some(fixed);
        }
        let client = self.surface_temp.as_ref()?;
        match client.get_surface_temperature().await {
            Ok(temp) => {
                tracing::debug!(surface_temp_c = temp, "Surface temperature");
                Some(temp)
            }
            Err(e) => {
                tracing::warn!(code = e.code(), "Surface temperature unavailable: {}", e);
                None
            }
        }
    }

    /// Preference file with closed seasons from the regulation table when
    /// it is reachable
    pub(crate) async fn load_species(&self) -> AppResult<PreferenceSet> {
        let mut preferences = load_preferences(&self.config.paths.preferences)?;
        if let Some(client) = &self.regulations {
            match client.get_table().await {
                Ok(table) => {
                    tracing::debug!(rows = table.len(), "Closed season table loaded");
                    table.apply(&mut preferences);
                }
                Err(e) => tracing::warn!(
                    code = e.code(),
                    "Closed season table unavailable, using preference file values: {}",
                    e
                ),
            }
        }
        Ok(preferences)
    }

    pub(crate) fn turbidity(&self) -> Option<TurbidityObservation> {
        self.config
            .turbidity
            .observed
            .as_deref()
            .map(parse_turbidity_observation)
    }

    /// Score every species for the instant `now`
    pub async fn run_cycle(&self, now: DateTime<FixedOffset>) -> AppResult<Vec<ScoredResult>> {
        let preferences = self.load_species().await?;
        let engine = load_engine_config(&self.config.paths.weights);
        let forecast = self.fetch_forecast().await;
        let surface_temp_c = self.fetch_surface_temp().await;

        let as_of = match &forecast {
            Some(f) => now.with_timezone(&f.offset),
            None => now,
        };
        let today = as_of.date_naive();

        let observation = forecast
            .as_ref()
            .map(|f| f.current.clone())
            .unwrap_or_default();
        let site = SiteConditions {
            timestamp: Some(as_of),
            surface_temp_c,
            cloud_fraction: forecast
                .as_ref()
                .and_then(|f| f.smoothed_cloud_fraction(as_of)),
            moon_phase: forecast.as_ref().and_then(|f| f.moon_phase_on(today)),
            turbidity: self.turbidity(),
        };
        let sun = sun_times_or_fallback(
            forecast
                .as_ref()
                .map(|f| f.sun_times_on(today))
                .unwrap_or_default(),
            today,
            *as_of.offset(),
        );

        let mut records = build_records(&preferences, &observation, &site);
        let previous = self.pressure_store.load();
        let readings = apply_pressure_trends(&mut records, &previous);

        let results =
            compute_catch_probability_and_window(&records, &preferences, &sun, &engine, as_of);
        self.pressure_store.save(&readings);

        for result in &results {
            tracing::info!(
                site = %self.config.site.name,
                species = %result.species(),
                probability = result.probability_pct,
                "Catch probability"
            );
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use shared::{DayPart, Turbidity};
    use std::path::PathBuf;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fishcast-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn preferences() -> PreferenceSet {
        let (set, _) = PreferenceSet::from_json_str(
            r#"{
                "Hecht": {"Bevorzugte_Tageszeit": ["Morgen", "Abend"]},
                "Zander": {"Bevorzugte_Tageszeit": ["Nacht"]}
            }"#,
        )
        .unwrap();
        set
    }

    #[test]
    fn test_build_records_per_species() {
        let observation = Observation {
            temperature_c: Some(21.0),
            pressure_hpa: Some(1012.0),
            wind_bearing_deg: Some(200.0),
            cloud_fraction: Some(0.9),
            ..Default::default()
        };
        let site = SiteConditions {
            surface_temp_c: Some(18.5),
            cloud_fraction: Some(0.4),
            moon_phase: Some(MoonPhase::Full),
            ..Default::default()
        };
        let records = build_records(&preferences(), &observation, &site);

        assert_eq!(records.len(), 2);
        let hecht = records.iter().find(|r| r.species == "Hecht").unwrap();
        assert_eq!(hecht.air_temp_c, Some(21.0));
        assert_eq!(hecht.surface_temp_c, Some(18.5));
        assert_eq!(hecht.cloud_fraction, 0.4);
        assert_eq!(hecht.precip_mm_h, 0.0);
        assert_eq!(hecht.moon_phase, Some(MoonPhase::Full));
        assert_eq!(hecht.pressure_trend, PressureTrend::Unknown);
    }

    #[test]
    fn test_empty_observation_keeps_unknowns() {
        let records = build_records(&preferences(), &Observation::default(), &SiteConditions::default());
        for record in records {
            assert_eq!(record.air_temp_c, None);
            assert_eq!(record.wind_bearing_deg, None);
            assert_eq!(record.cloud_fraction, 0.0);
        }
    }

    #[test]
    fn test_parse_turbidity_observation() {
        assert_eq!(parse_turbidity_observation("2"), TurbidityObservation::Level(2));
        assert_eq!(parse_turbidity_observation(" 2 ").classify(), Turbidity::Turbid);
        assert_eq!(
            parse_turbidity_observation("leicht trüb").classify(),
            Turbidity::SlightlyTurbid
        );
    }

    #[test]
    fn test_sun_fallback() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        let sun = sun_times_or_fallback(SunTimes::default(), date, offset());
        assert_eq!(sun.sunrise.unwrap().hour(), 5);
        assert_eq!(sun.sunset.unwrap().hour(), 21);
        assert_eq!(sun.sunset.unwrap().date_naive(), date);

        // A half-known pair is replaced entirely
        let rise = offset().with_ymd_and_hms(2024, 7, 15, 5, 12, 0).unwrap();
        let partial = SunTimes {
            sunrise: Some(rise),
            sunset: None,
        };
        assert_eq!(sun_times_or_fallback(partial, date, offset()), sun);

        let complete = SunTimes::new(rise, offset().with_ymd_and_hms(2024, 7, 15, 21, 30, 0).unwrap());
        assert_eq!(sun_times_or_fallback(complete, date, offset()), complete);
    }

    #[tokio::test]
    async fn test_offline_cycle_scores_every_species() {
        let dir = temp_dir("cycle");
        let mut config = Config::for_tests(&dir);
        config.surface_temp.override_c = Some(18.0);
        config.turbidity.observed = Some("1".into());
        std::fs::write(
            &config.paths.preferences,
            r#"[
                {"Art": "Hecht", "Bevorzugte_Tageszeit": ["Abend"], "Trübung": ["leicht trüb"]},
                {"Art": "Zander", "Bevorzugte_Tageszeit": ["Nacht"]}
            ]"#,
        )
        .unwrap();

        let service = FishcastService::new(config.clone()).unwrap();
        let now = offset().with_ymd_and_hms(2024, 7, 15, 20, 45, 0).unwrap();
        let results = service.run_cycle(now).await.unwrap();

        let species: Vec<_> = results.iter().map(|r| r.species()).collect();
        assert_eq!(species, vec!["Hecht", "Zander"]);
        for result in &results {
            assert_eq!(result.record.surface_temp_c, Some(18.0));
            assert_eq!(result.record.pressure_trend, PressureTrend::Unknown);
            assert_eq!(result.turbidity, Turbidity::SlightlyTurbid);
            assert!(result.probability_pct <= 100);
            assert_eq!(result.probability_pct % 5, 0);
        }
        assert!(results[0].best_window.contains_key(&DayPart::Evening));
        assert!(results[1].best_window.contains_key(&DayPart::Night));
        assert!(config.paths.pressure_store.exists());

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_unreachable_regulation_table_keeps_file_values() {
        let dir = temp_dir("cycle-regulations");
        let mut config = Config::for_tests(&dir);
        config.regulations.url = Some("http://127.0.0.1:9/fangzeiten".into());
        config.regulations.timeout_secs = 1;
        std::fs::write(
            &config.paths.preferences,
            r#"[{"Art": "Hecht", "Schonzeit": "1. Februar bis 30. April", "Schonmaß_cm": 50}]"#,
        )
        .unwrap();

        let service = FishcastService::new(config).unwrap();
        let preferences = service.load_species().await.unwrap();
        let pike = preferences.get("Hecht").unwrap();
        assert_eq!(pike.closed_season.as_deref(), Some("1. Februar bis 30. April"));
        assert_eq!(pike.minimum_size_cm, Some(50.0));
        assert_eq!(pike.closed_season_region, None);

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_cycle_without_preferences_fails() {
        let dir = temp_dir("cycle-missing");
        let service = FishcastService::new(Config::for_tests(&dir)).unwrap();
        let now = offset().with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        assert!(service.run_cycle(now).await.is_err());
        std::fs::remove_dir_all(dir).ok();
    }
}
