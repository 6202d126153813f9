//! Services of the Fishcast backend

pub mod cycle;
pub mod forecast;
pub mod preferences;
pub mod pressure;
pub mod publish;
pub mod report;

pub use cycle::FishcastService;
pub use publish::{MqttPublisher, ReportSink};
pub use report::write_reports;
