//! Weather API client for fetching weather data
//!
//! Integrates with the PirateWeather forecast API. One request per cycle
//! returns current conditions, hourly samples and daily sun/moon data.

use std::f64::consts::TAU;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::{MoonPhase, SunTimes};

use crate::error::{AppError, AppResult};

/// Mean length of a lunation in days
const SYNODIC_MONTH_DAYS: f64 = 29.53;

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Conditions at one instant; every reading is optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub time: Option<DateTime<FixedOffset>>,
    pub temperature_c: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub wind_bearing_deg: Option<f64>,
    pub cloud_fraction: Option<f64>,
    pub precip_mm_h: Option<f64>,
}

/// Sun and moon data for one local calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    /// Lunation fraction, 0 new moon, 0.5 full moon
    pub moon_phase: Option<f64>,
}

/// Everything one forecast request returns, in the site's local offset
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub offset: FixedOffset,
    pub current: Observation,
    pub hourly: Vec<Observation>,
    pub daily: Vec<DailySummary>,
}

/// PirateWeather API response
#[derive(Debug, Deserialize)]
struct PWResponse {
    /// Hours east of UTC
    #[serde(default)]
    offset: f64,
    currently: Option<PWDataPoint>,
    hourly: Option<PWDataBlock>,
    daily: Option<PWDataBlock>,
}

#[derive(Debug, Deserialize)]
struct PWDataBlock {
    #[serde(default)]
    data: Vec<PWDataPoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PWDataPoint {
    time: Option<i64>,
    temperature: Option<f64>,
    pressure: Option<f64>,
    wind_speed: Option<f64>,
    wind_bearing: Option<f64>,
    cloud_cover: Option<f64>,
    precip_intensity: Option<f64>,
    sunrise_time: Option<i64>,
    sunset_time: Option<i64>,
    moon_phase: Option<f64>,
}

impl WeatherClient {
    /// Create a new WeatherClient against `base_url`
    /// (normally https://api.pirateweather.net)
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Replace the HTTP client with one that gives up after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> AppResult<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Fetch current conditions, hourly samples and daily data by GPS
    /// coordinates
    pub async fn get_forecast(&self, latitude: f64, longitude: f64) -> AppResult<Forecast> {
        let url = format!(
            "{}/forecast/{}/{},{}?units=si&exclude=minutely,alerts,flags&extend=hourly",
            self.base_url, self.api_key, latitude, longitude
        );
        tracing::debug!(latitude, longitude, "Requesting PirateWeather forecast");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::WeatherApi(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(AppError::WeatherServiceUnavailable);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::WeatherApi(format!("{} - {}", status, body)));
        }

        let data: PWResponse = response
            .json()
            .await
            .map_err(|e| AppError::WeatherApi(format!("failed to parse response: {}", e.without_url())))?;

        Ok(Self::convert_forecast_response(data))
    }

    /// Convert the PirateWeather response to our format
    fn convert_forecast_response(data: PWResponse) -> Forecast {
        let offset =
            FixedOffset::east_opt((data.offset * 3600.0).round() as i32).unwrap_or(Utc.fix());

        let current = data
            .currently
            .map(|point| convert_observation(&point, offset))
            .unwrap_or_default();

        let hourly = data
            .hourly
            .map(|block| {
                block
                    .data
                    .iter()
                    .map(|point| convert_observation(point, offset))
                    .collect()
            })
            .unwrap_or_default();

        let daily = data
            .daily
            .map(|block| {
                block
                    .data
                    .iter()
                    .filter_map(|point| {
                        let date = local_time(point.time, offset)?.date_naive();
                        Some(DailySummary {
                            date,
                            sunrise: local_time(point.sunrise_time, offset),
                            sunset: local_time(point.sunset_time, offset),
                            moon_phase: point.moon_phase,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Forecast {
            offset,
            current,
            hourly,
            daily,
        }
    }
}

fn local_time(timestamp: Option<i64>, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(timestamp?, 0).map(|t| t.with_timezone(&offset))
}

fn convert_observation(point: &PWDataPoint, offset: FixedOffset) -> Observation {
    Observation {
        time: local_time(point.time, offset),
        temperature_c: point.temperature,
        pressure_hpa: point.pressure,
        wind_speed_ms: point.wind_speed,
        wind_bearing_deg: point.wind_bearing,
        cloud_fraction: point.cloud_cover,
        precip_mm_h: point.precip_intensity,
    }
}

/// Illuminated share of the lunar disc in percent for a lunation fraction
pub fn illuminated_pct(lunation: f64) -> f64 {
    (1.0 - (TAU * lunation).cos()) / 2.0 * 100.0
}

impl Forecast {
    /// Cloud fraction at `at` as the mean of the two hourly samples around
    /// it. Falls back to the current value without a bracketing pair.
    pub fn smoothed_cloud_fraction(&self, at: DateTime<FixedOffset>) -> Option<f64> {
        let next = self
            .hourly
            .iter()
            .position(|sample| sample.time.is_some_and(|t| t >= at));

        let bracketing = match next {
            Some(idx) if idx > 0 => self.hourly[idx - 1]
                .cloud_fraction
                .zip(self.hourly[idx].cloud_fraction)
                .map(|(before, after)| (before + after) / 2.0),
            _ => None,
        };
        bracketing.or(self.current.cloud_fraction)
    }

    fn day(&self, date: NaiveDate) -> Option<(usize, &DailySummary)> {
        self.daily.iter().enumerate().find(|(_, day)| day.date == date)
    }

    /// Sun anchors for a local date; both missing when the day is not
    /// covered
    pub fn sun_times_on(&self, date: NaiveDate) -> SunTimes {
        match self.day(date) {
            Some((_, day)) => SunTimes {
                sunrise: day.sunrise,
                sunset: day.sunset,
            },
            None => SunTimes::default(),
        }
    }

    /// Moon phase label for a local date, compared against the following
    /// day to tell waxing from waning
    pub fn moon_phase_on(&self, date: NaiveDate) -> Option<MoonPhase> {
        let (idx, day) = self.day(date)?;
        let lunation = day.moon_phase?;
        let next = self
            .daily
            .get(idx + 1)
            .and_then(|d| d.moon_phase)
            .unwrap_or_else(|| (lunation + 1.0 / SYNODIC_MONTH_DAYS).fract());
        Some(MoonPhase::classify(
            illuminated_pct(lunation),
            illuminated_pct(next),
        ))
    }

    /// Hourly samples whose local date is `date`
    pub fn hourly_on(&self, date: NaiveDate) -> Vec<&Observation> {
        self.hourly
            .iter()
            .filter(|sample| sample.time.is_some_and(|t| t.date_naive() == date))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Timelike;
    use serde_json::json;

    // 2024-07-01 12:00 UTC
    const NOON_UTC: i64 = 1_719_835_200;

    fn fixture() -> Forecast {
        let value = json!({
            "latitude": 52.52,
            "longitude": 13.40,
            "offset": 2.0,
            "currently": {
                "time": NOON_UTC,
                "temperature": 24.5,
                "pressure": 1013.2,
                "windSpeed": 3.4,
                "windBearing": 225,
                "cloudCover": 0.5,
                "precipIntensity": 0.0
            },
            "hourly": {
                "data": [
                    { "time": NOON_UTC - 3600, "cloudCover": 0.2, "temperature": 23.0 },
                    { "time": NOON_UTC, "cloudCover": 0.6, "temperature": 24.5 },
                    { "time": NOON_UTC + 3600, "cloudCover": 0.8, "temperature": 25.0 },
                    { "time": NOON_UTC + 86_400, "cloudCover": 0.1, "temperature": 22.0 }
                ]
            },
            "daily": {
                "data": [
                    {
                        "time": NOON_UTC - 14 * 3600,
                        "sunriseTime": NOON_UTC - 9 * 3600,
                        "sunsetTime": NOON_UTC + 7 * 3600 + 1800,
                        "moonPhase": 0.25
                    },
                    {
                        "time": NOON_UTC + 10 * 3600,
                        "sunriseTime": NOON_UTC + 15 * 3600,
                        "sunsetTime": NOON_UTC + 31 * 3600 + 1800,
                        "moonPhase": 0.3
                    }
                ]
            }
        });
        let data: PWResponse = serde_json::from_value(value).unwrap();
        WeatherClient::convert_forecast_response(data)
    }

    fn at_utc(timestamp: i64) -> DateTime<FixedOffset> {
        DateTime::from_timestamp(timestamp, 0)
            .unwrap()
            .with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap())
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    #[test]
    fn test_current_conditions_are_converted() {
        let forecast = fixture();
        assert_eq!(forecast.offset.local_minus_utc(), 7200);
        assert_eq!(forecast.current.temperature_c, Some(24.5));
        assert_eq!(forecast.current.wind_bearing_deg, Some(225.0));
        assert_eq!(forecast.current.time.unwrap().hour(), 14);
    }

    #[test]
    fn test_missing_blocks_yield_empty_forecast() {
        let data: PWResponse = serde_json::from_value(json!({})).unwrap();
        let forecast = WeatherClient::convert_forecast_response(data);
        assert_eq!(forecast.current, Observation::default());
        assert!(forecast.hourly.is_empty());
        assert_eq!(forecast.sun_times_on(date(1)), SunTimes::default());
        assert_eq!(forecast.moon_phase_on(date(1)), None);
    }

    #[test]
    fn test_cloud_fraction_is_smoothed_over_bracketing_samples() {
        let forecast = fixture();
        assert_relative_eq!(
            forecast.smoothed_cloud_fraction(at_utc(NOON_UTC + 1800)).unwrap(),
            0.7,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            forecast.smoothed_cloud_fraction(at_utc(NOON_UTC)).unwrap(),
            0.4,
            epsilon = 1e-9
        );
        // Before the first sample only the current value is left
        assert_relative_eq!(
            forecast.smoothed_cloud_fraction(at_utc(NOON_UTC - 7200)).unwrap(),
            0.5
        );
    }

    #[test]
    fn test_sun_times_in_local_offset() {
        let forecast = fixture();
        let sun = forecast.sun_times_on(date(1));
        assert_eq!(sun.sunrise.unwrap().hour(), 5);
        let sunset = sun.sunset.unwrap();
        assert_eq!((sunset.hour(), sunset.minute()), (21, 30));
        assert!(forecast.sun_times_on(date(2)).sunrise.is_some());
        assert_eq!(forecast.sun_times_on(date(5)), SunTimes::default());
    }

    #[test]
    fn test_moon_phase_classification() {
        let forecast = fixture();
        assert_eq!(forecast.moon_phase_on(date(1)), Some(MoonPhase::Half));
        // Last day is compared against an extrapolated next day
        assert_eq!(forecast.moon_phase_on(date(2)), Some(MoonPhase::Waxing));
    }

    #[test]
    fn test_illuminated_pct() {
        assert_relative_eq!(illuminated_pct(0.0), 0.0, epsilon = 1e-9);
        assert_relative_eq!(illuminated_pct(0.5), 100.0, epsilon = 1e-9);
        assert_relative_eq!(illuminated_pct(0.25), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hourly_on_filters_by_local_date() {
        let forecast = fixture();
        assert_eq!(forecast.hourly_on(date(1)).len(), 3);
        assert_eq!(forecast.hourly_on(date(2)).len(), 1);
    }
}
