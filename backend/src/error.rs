//! Error handling for the Fishcast service
//!
//! Collaborator failures are mapped onto these variants and then logged by
//! the cycle; only startup errors reach `main`.

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    // External service errors
    #[error("Weather service unavailable")]
    WeatherServiceUnavailable,

    #[error("Weather API error: {0}")]
    WeatherApi(String),

    #[error("Surface temperature error: {0}")]
    SurfaceTemp(String),

    #[error("Closed season table error: {0}")]
    Regulations(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    // Local data errors
    #[error("Preference file error: {0}")]
    Preferences(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Stable code used in structured log fields
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) | AppError::Config(_) => "CONFIGURATION_ERROR",
            AppError::WeatherServiceUnavailable => "WEATHER_SERVICE_UNAVAILABLE",
            AppError::WeatherApi(_) => "WEATHER_API_ERROR",
            AppError::SurfaceTemp(_) => "SURFACE_TEMP_ERROR",
            AppError::Regulations(_) => "REGULATIONS_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Mqtt(_) => "MQTT_ERROR",
            AppError::Preferences(_) => "PREFERENCES_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias for the service
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::WeatherServiceUnavailable.code(), "WEATHER_SERVICE_UNAVAILABLE");
        assert_eq!(
            AppError::Configuration("missing latitude".into()).code(),
            "CONFIGURATION_ERROR"
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "fisch.json");
        assert_eq!(AppError::from(io).code(), "IO_ERROR");
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::WeatherApi("401 Unauthorized".into());
        assert_eq!(err.to_string(), "Weather API error: 401 Unauthorized");

        let err = AppError::Regulations("no regulation rows found".into());
        assert_eq!(err.code(), "REGULATIONS_ERROR");
        assert_eq!(err.to_string(), "Closed season table error: no regulation rows found");
    }
}
