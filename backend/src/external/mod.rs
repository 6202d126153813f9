//! External API integrations

pub mod closed_seasons;
pub mod html;
pub mod surface_temp;
pub mod weather;

pub use closed_seasons::ClosedSeasonClient;
pub use surface_temp::SurfaceTempClient;
pub use weather::{Forecast, Observation, WeatherClient};
