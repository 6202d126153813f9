//! Previous-pressure store
//!
//! A JSON object mapping species name to the pressure reading of the last
//! cycle. Read once at cycle start, written once at cycle end. Failures
//! are logged and leave the affected trends "unknown".

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use shared::{PressureTrend, SensorRecord};

use crate::error::AppResult;

pub type PressureReadings = BTreeMap<String, f64>;

#[derive(Debug, Clone)]
pub struct PressureStore {
    path: PathBuf,
}

impl PressureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previous readings; empty when the store is missing or unreadable
    pub fn load(&self) -> PressureReadings {
        match self.read() {
            Ok(readings) => readings,
            Err(e) => {
                tracing::warn!(
                    code = e.code(),
                    "Cannot read pressure store {}: {}",
                    self.path().display(),
                    e
                );
                PressureReadings::new()
            }
        }
    }

    fn read(&self) -> AppResult<PressureReadings> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PressureReadings::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the store; a failure is logged and otherwise ignored
    pub fn save(&self, readings: &PressureReadings) {
        if let Err(e) = self.write(readings) {
            tracing::error!(
                code = e.code(),
                "Cannot write pressure store {}: {}",
                self.path().display(),
                e
            );
        }
    }

    fn write(&self, readings: &PressureReadings) -> AppResult<()> {
        let json = serde_json::to_string_pretty(readings)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Set each record's pressure trend from the previous readings and return
/// the readings to persist. Species without a current reading keep their
/// previous value.
pub fn apply_pressure_trends(
    records: &mut [SensorRecord],
    previous: &PressureReadings,
) -> PressureReadings {
    let mut updated = previous.clone();
    for record in records.iter_mut() {
        let before = previous.get(&record.species).copied();
        record.pressure_trend = PressureTrend::derive(record.pressure_hpa, before);
        tracing::debug!(
            species = %record.species,
            current = ?record.pressure_hpa,
            previous = ?before,
            trend = %record.pressure_trend,
            "Pressure trend"
        );
        if let Some(pressure) = record.pressure_hpa {
            updated.insert(record.species.clone(), pressure);
        }
    }
    updated
}
