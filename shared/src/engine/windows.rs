//! Adaptive day-part windows around sunrise and sunset
//!
//! Buffers stretch or shrink with the light level: dawn, dusk and night
//! windows widen on dark days, the midday window widens on bright days.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime};
use std::collections::BTreeMap;

use crate::models::{ClockWindow, WindowBuffers};
use crate::types::DayPart;

/// Precipitation from which the sky counts as rainy, in mm/h
pub const RAIN_THRESHOLD_MM_H: f64 = 0.2;

/// Effective daylight brightness in [0, 1]; lower is darker
pub fn light_modifier(cloud_fraction: f64, wind_speed_ms: f64, precip_mm_h: f64) -> f64 {
    let cloud_eff = cloud_fraction + 0.02 * wind_speed_ms.min(10.0);
    let rain_eff = if precip_mm_h >= RAIN_THRESHOLD_MM_H { 0.15 } else { 0.0 };
    (1.0 - (cloud_eff + rain_eff).clamp(0.0, 1.0)).max(0.0)
}

/// Sunrise and sunset anchors for the evaluated day; either may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SunTimes {
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
}

impl SunTimes {
    pub fn new(sunrise: DateTime<FixedOffset>, sunset: DateTime<FixedOffset>) -> Self {
        Self {
            sunrise: Some(sunrise),
            sunset: Some(sunset),
        }
    }

    /// `Some(true)` when the clock time lies before sunrise or after sunset;
    /// `None` without both anchors
    pub fn is_dark_at(&self, now: NaiveTime) -> Option<bool> {
        match (self.sunrise, self.sunset) {
            (Some(rise), Some(set)) => Some(now < rise.time() || now > set.time()),
            _ => None,
        }
    }
}

/// Light conditions that stretch the window buffers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightConditions {
    pub cloud_fraction: f64,
    pub wind_speed_ms: f64,
    pub precip_mm_h: f64,
}

impl LightConditions {
    pub fn level(&self) -> f64 {
        light_modifier(self.cloud_fraction, self.wind_speed_ms, self.precip_mm_h)
    }
}

/// A day-part window as instants; `start < end` always holds, the night
/// window ends on the following day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn clock(&self) -> ClockWindow {
        ClockWindow {
            start: self.start.time(),
            end: self.end.time(),
        }
    }

    /// Clock-time containment; windows recur daily
    pub fn contains(&self, now: NaiveTime) -> bool {
        time_in_window(now, self.start.time(), self.end.time())
    }

    /// Within `margin` before the start or after the end
    pub fn near_edge(&self, now: NaiveTime, margin: Duration) -> bool {
        let before = self
            .start
            .checked_sub_signed(margin)
            .is_some_and(|lead| time_in_window(now, lead.time(), self.start.time()));
        let after = self
            .end
            .checked_add_signed(margin)
            .is_some_and(|tail| time_in_window(now, self.end.time(), tail.time()));
        before || after
    }
}

/// Clock-time containment; `start > end` spans midnight
pub fn time_in_window(now: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start < end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

fn minutes(value: f64) -> Option<Duration> {
    Duration::try_milliseconds((value * 60_000.0).round() as i64)
}

fn around(
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
) -> Option<TimeWindow> {
    Some(TimeWindow {
        start: start?,
        end: end?,
    })
}

/// Build the requested day-part windows.
///
/// Parts whose anchors are missing are left out, as are windows that
/// collapse (end not after start) or fall outside the representable range.
pub fn build_time_windows(
    sun: &SunTimes,
    parts: &[DayPart],
    light: LightConditions,
    buffers: &WindowBuffers,
) -> BTreeMap<DayPart, TimeWindow> {
    let level = light.level();
    let dawn = minutes(buffers.dawn_dusk_min * (2.0 - level));
    let midday = minutes(buffers.midday_min * level);
    let night = minutes(buffers.night_min * (2.0 - level))
        .and_then(|n| n.checked_add(&Duration::days(1)).map(|next| (n, next)));

    let mut windows = BTreeMap::new();
    for part in parts {
        let window = match (part, sun.sunrise, sun.sunset) {
            (DayPart::Morning, Some(rise), _) => dawn.and_then(|d| {
                around(rise.checked_sub_signed(d), rise.checked_add_signed(d))
            }),
            (DayPart::Evening, _, Some(set)) => dawn.and_then(|d| {
                around(set.checked_sub_signed(d), set.checked_add_signed(d))
            }),
            (DayPart::Day, Some(rise), Some(set)) => midday.and_then(|m| {
                around(rise.checked_add_signed(m), set.checked_sub_signed(m))
            }),
            (DayPart::Night, Some(rise), Some(set)) => night.and_then(|(n, next)| {
                around(set.checked_add_signed(n), rise.checked_add_signed(next))
            }),
            _ => continue,
        };
        match window {
            Some(window) if window.end > window.start => {
                windows.insert(*part, window);
            }
            Some(_) => tracing::debug!("Dropping collapsed {} window", part),
            None => tracing::warn!("Dropping {} window, buffer out of range", part),
        }
    }
    windows
}
