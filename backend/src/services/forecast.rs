//! Catch forecast for the next calendar day
//!
//! Every hourly sample of tomorrow is scored on its own, with tomorrow's
//! sun anchors and the sample time as evaluation instant. The pressure
//! store is left alone; trends compare consecutive hourly samples.

use chrono::{DateTime, FixedOffset, NaiveDate};
use shared::{
    compute_catch_probability_and_window, EngineConfig, PreferenceSet, PressureTrend,
    ScoredResult, TurbidityObservation,
};

use crate::error::{AppError, AppResult};
use crate::external::Forecast;
use crate::services::cycle::{build_records, sun_times_or_fallback, FishcastService, SiteConditions};
use crate::services::preferences::load_engine_config;

/// Score tomorrow's hourly samples for every species.
///
/// Without a surface reading the sample's air temperature stands in for
/// it.
pub fn score_tomorrow(
    forecast: &Forecast,
    preferences: &PreferenceSet,
    engine: &EngineConfig,
    surface_temp_c: Option<f64>,
    turbidity: Option<TurbidityObservation>,
    today: NaiveDate,
) -> Vec<ScoredResult> {
    let Some(tomorrow) = today.succ_opt() else {
        return Vec::new();
    };
    let sun = sun_times_or_fallback(forecast.sun_times_on(tomorrow), tomorrow, forecast.offset);
    let moon_phase = forecast.moon_phase_on(tomorrow);

    // Last reading before tomorrow seeds the first trend
    let mut previous_pressure = forecast
        .hourly
        .iter()
        .filter(|sample| sample.time.is_some_and(|t| t.date_naive() < tomorrow))
        .last()
        .and_then(|sample| sample.pressure_hpa);

    let samples = forecast.hourly_on(tomorrow);
    tracing::info!(
        %tomorrow,
        hours = samples.len(),
        species = preferences.len(),
        "Scoring forecast"
    );

    let mut results = Vec::with_capacity(samples.len() * preferences.len());
    for sample in samples {
        let Some(as_of) = sample.time else {
            continue;
        };
        let site = SiteConditions {
            timestamp: Some(as_of),
            surface_temp_c: surface_temp_c.or(sample.temperature_c),
            cloud_fraction: None,
            moon_phase,
            turbidity: turbidity.clone(),
        };
        let trend = PressureTrend::derive(sample.pressure_hpa, previous_pressure);
        let mut records = build_records(preferences, sample, &site);
        for record in &mut records {
            record.pressure_trend = trend;
        }
        results.extend(compute_catch_probability_and_window(
            &records,
            preferences,
            &sun,
            engine,
            as_of,
        ));
        if sample.pressure_hpa.is_some() {
            previous_pressure = sample.pressure_hpa;
        }
    }
    results
}

impl FishcastService {
    /// Fetch the forecast and score tomorrow. Unlike a live cycle this
    /// needs the weather API.
    pub async fn run_forecast(&self, now: DateTime<FixedOffset>) -> AppResult<Vec<ScoredResult>> {
        let preferences = self.load_species().await?;
        let engine = load_engine_config(&self.config.paths.weights);

        let client = self.weather.as_ref().ok_or_else(|| {
            AppError::Configuration(
                "weather API key and site coordinates are required for forecasts".to_string(),
            )
        })?;
        let (latitude, longitude) = self.config.coordinates().ok_or_else(|| {
            AppError::Configuration("site coordinates are required for forecasts".to_string())
        })?;
        let forecast = client.get_forecast(latitude, longitude).await?;
        let surface_temp_c = self.fetch_surface_temp().await;

        let today = now.with_timezone(&forecast.offset).date_naive();
        Ok(score_tomorrow(
            &forecast,
            &preferences,
            &engine,
            surface_temp_c,
            self.turbidity(),
            today,
        ))
    }
}
