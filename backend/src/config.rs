//! Configuration management for the Fishcast service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with FISHCAST_ prefix
//! 4. Plain variables of older deployments (LATITUDE, PIRATEWEATHER_API_KEY,
//!    MQTT_BROKER, ...) for keys that are still unset

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Fishing site
    pub site: SiteConfig,

    /// Local documents read and written by each cycle
    pub paths: PathsConfig,

    /// PirateWeather API configuration
    pub weather: WeatherConfig,

    /// Water surface temperature source
    pub surface_temp: SurfaceTempConfig,

    /// Static turbidity observation
    #[serde(default)]
    pub turbidity: TurbidityConfig,

    /// Closed season and minimum size table
    pub regulations: RegulationsConfig,

    /// Message broker receiving the reports
    pub mqtt: MqttConfig,

    /// Seconds between two cycles of `fishcast run`
    pub loop_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Display name used in log lines
    pub name: String,

    /// Decimal degrees
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Decimal degrees
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Species preference document
    pub preferences: PathBuf,

    /// Weight and buffer tables
    pub weights: PathBuf,

    /// Previous pressure readings per species
    pub pressure_store: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// PirateWeather API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SurfaceTempConfig {
    /// Page whose second table row carries the water temperature
    #[serde(default)]
    pub url: Option<String>,

    /// Fixed reading that replaces the page lookup
    #[serde(default)]
    pub override_c: Option<f64>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TurbidityConfig {
    /// Label ("klar", "leicht trüb", "trüb") or level 0 to 2
    #[serde(default)]
    pub observed: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegulationsConfig {
    /// Page with the regulation table; the preference file is used without it
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Home Assistant discovery prefix; topics live under
    /// `<prefix>/sensor/fisch/<slug>`
    pub discovery_prefix: String,

    pub client_id: String,

    pub keep_alive_secs: u64,
}

impl MqttConfig {
    pub fn base_topic(&self) -> String {
        format!("{}/sensor/fisch", self.discovery_prefix.trim_end_matches('/'))
    }
}

const DEFAULT_LOOP_INTERVAL_SECS: u64 = 600;
const DEFAULT_MQTT_BROKER: &str = "127.0.0.1";
const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FISHCAST_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("site.name", "Hausgewässer")?
            .set_default("paths.preferences", "fisch.json")?
            .set_default("paths.weights", "weights.json")?
            .set_default("paths.pressure_store", "pressure_prev.json")?
            .set_default("weather.base_url", "https://api.pirateweather.net")?
            .set_default("weather.timeout_secs", 10)?
            .set_default("surface_temp.timeout_secs", 10)?
            .set_default("regulations.timeout_secs", 10)?
            .set_default("mqtt.broker", DEFAULT_MQTT_BROKER)?
            .set_default("mqtt.port", i64::from(DEFAULT_MQTT_PORT))?
            .set_default("mqtt.discovery_prefix", DEFAULT_DISCOVERY_PREFIX)?
            .set_default("mqtt.client_id", "fishcast")?
            .set_default("mqtt.keep_alive_secs", 60)?
            .set_default("loop_interval_secs", DEFAULT_LOOP_INTERVAL_SECS as i64)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FISHCAST_ prefix)
            .add_source(
                Environment::with_prefix("FISHCAST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.apply_legacy_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Fill keys that are still unset from the plain variables older
    /// deployments used. Prefixed settings always win.
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        if self.site.latitude.is_none() {
            self.site.latitude = number("LATITUDE");
        }
        if self.site.longitude.is_none() {
            self.site.longitude = number("LONGITUDE");
        }
        if self.weather.api_key.is_none() {
            self.weather.api_key = lookup("PIRATEWEATHER_API_KEY").or_else(|| lookup("PIRATE_API_KEY"));
        }
        if self.surface_temp.url.is_none() {
            self.surface_temp.url = lookup("SEA_TEMP_URL");
        }
        if self.regulations.url.is_none() {
            self.regulations.url = lookup("FANGZEITEN_URL");
        }
        if let Some(secs) = lookup("LOOP_INTERVAL").and_then(|v| v.trim().parse::<u64>().ok()) {
            if self.loop_interval_secs == DEFAULT_LOOP_INTERVAL_SECS {
                self.loop_interval_secs = secs;
            }
        }

        if self.mqtt.broker == DEFAULT_MQTT_BROKER {
            if let Some(broker) = lookup("MQTT_BROKER") {
                self.mqtt.broker = broker;
            }
        }
        if self.mqtt.port == DEFAULT_MQTT_PORT {
            if let Some(port) = lookup("MQTT_PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
                self.mqtt.port = port;
            }
        }
        if self.mqtt.username.is_none() {
            self.mqtt.username = lookup("MQTT_USER");
        }
        if self.mqtt.password.is_none() {
            self.mqtt.password = lookup("MQTT_PASS");
        }
        if self.mqtt.discovery_prefix == DEFAULT_DISCOVERY_PREFIX {
            if let Some(prefix) = lookup("MQTT_DISCOVERY_PREFIX") {
                self.mqtt.discovery_prefix = prefix;
            }
        }
    }

    /// Reject settings no cycle could work with
    pub fn validate(&self) -> AppResult<()> {
        if self.loop_interval_secs == 0 {
            return Err(AppError::Configuration(
                "loop_interval_secs must be positive".into(),
            ));
        }
        if self.mqtt.broker.trim().is_empty() {
            return Err(AppError::Configuration("mqtt.broker must not be empty".into()));
        }
        // The MQTT client refuses ids that are empty or start with a space
        if self.mqtt.client_id.is_empty() || self.mqtt.client_id.starts_with(' ') {
            return Err(AppError::Configuration("mqtt.client_id must not be blank".into()));
        }
        if let (Some(lat), Some(lon)) = (self.site.latitude, self.site.longitude) {
            shared::validate_coordinates(lat, lon)
                .map_err(|e| AppError::Configuration(e.to_string()))?;
        }
        Ok(())
    }

    /// Site coordinates when both are configured
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.site.latitude.zip(self.site.longitude)
    }

    /// Offline configuration with every document under `dir`
    #[cfg(test)]
    pub(crate) fn for_tests(dir: &std::path::Path) -> Self {
        Config {
            environment: "test".into(),
            site: SiteConfig {
                name: "Testsee".into(),
                latitude: None,
                longitude: None,
            },
            paths: PathsConfig {
                preferences: dir.join("fisch.json"),
                weights: dir.join("weights.json"),
                pressure_store: dir.join("pressure_prev.json"),
            },
            weather: WeatherConfig {
                api_key: None,
                base_url: "https://api.pirateweather.net".into(),
                timeout_secs: 10,
            },
            surface_temp: SurfaceTempConfig {
                url: None,
                override_c: None,
                timeout_secs: 10,
            },
            turbidity: TurbidityConfig::default(),
            regulations: RegulationsConfig {
                url: None,
                timeout_secs: 10,
            },
            mqtt: MqttConfig {
                broker: DEFAULT_MQTT_BROKER.into(),
                port: DEFAULT_MQTT_PORT,
                username: None,
                password: None,
                discovery_prefix: DEFAULT_DISCOVERY_PREFIX.into(),
                client_id: "fishcast-test".into(),
                keep_alive_secs: 60,
            },
            loop_interval_secs: DEFAULT_LOOP_INTERVAL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn base() -> Config {
        Config::for_tests(Path::new("."))
    }

    #[test]
    fn test_legacy_env_fills_missing_keys() {
        let vars: HashMap<&str, &str> = [
            ("LATITUDE", "52.52"),
            ("LONGITUDE", " 13.40 "),
            ("PIRATE_API_KEY", "secret"),
            ("SEA_TEMP_URL", "https://example.org/wasser"),
            ("LOOP_INTERVAL", "300"),
            ("FANGZEITEN_URL", "https://example.org/fangzeiten"),
            ("MQTT_BROKER", "broker.local"),
            ("MQTT_PORT", "8883"),
            ("MQTT_USER", "fisch"),
            ("MQTT_PASS", "geheim"),
            ("MQTT_DISCOVERY_PREFIX", "ha"),
        ]
        .into_iter()
        .collect();

        let mut config = base();
        config.apply_legacy_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.coordinates(), Some((52.52, 13.40)));
        assert_eq!(config.weather.api_key.as_deref(), Some("secret"));
        assert_eq!(config.surface_temp.url.as_deref(), Some("https://example.org/wasser"));
        assert_eq!(config.loop_interval_secs, 300);
        assert_eq!(config.regulations.url.as_deref(), Some("https://example.org/fangzeiten"));
        assert_eq!(config.mqtt.broker, "broker.local");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.mqtt.username.as_deref(), Some("fisch"));
        assert_eq!(config.mqtt.password.as_deref(), Some("geheim"));
        assert_eq!(config.mqtt.base_topic(), "ha/sensor/fisch");
    }

    #[test]
    fn test_prefixed_settings_win_over_legacy_env() {
        let mut config = base();
        config.site.latitude = Some(48.1);
        config.weather.api_key = Some("configured".into());
        config.apply_legacy_env(|key| match key {
            "LATITUDE" => Some("10.0".into()),
            "PIRATEWEATHER_API_KEY" => Some("legacy".into()),
            _ => None,
        });
        assert_eq!(config.site.latitude, Some(48.1));
        assert_eq!(config.weather.api_key.as_deref(), Some("configured"));
        assert_eq!(config.coordinates(), None);
    }

    #[test]
    fn test_unparseable_legacy_numbers_are_ignored() {
        let mut config = base();
        config.apply_legacy_env(|key| match key {
            "LATITUDE" => Some("north".into()),
            "LOOP_INTERVAL" => Some("often".into()),
            _ => None,
        });
        assert_eq!(config.site.latitude, None);
        assert_eq!(config.loop_interval_secs, 600);
    }

    #[test]
    fn test_validate() {
        let mut config = base();
        assert!(config.validate().is_ok());

        config.site.latitude = Some(95.0);
        config.site.longitude = Some(10.0);
        assert!(matches!(config.validate(), Err(AppError::Configuration(_))));

        let mut config = base();
        config.loop_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.mqtt.broker = " ".into();
        assert!(config.validate().is_err());

        let mut config = base();
        config.mqtt.client_id = " fishcast".into();
        assert!(config.validate().is_err());
    }
}
