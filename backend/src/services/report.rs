//! Rendering of scored results for downstream consumers
//!
//! Each result becomes one JSON line carrying a slug, a state payload, the
//! full attribute record and a to-do payload with the tips.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use shared::{Improvement, ScoredResult};

use crate::error::AppResult;

#[derive(Debug, Serialize)]
pub struct StatePayload {
    pub status: u8,
}

#[derive(Debug, Serialize)]
pub struct TodoPayload<'a> {
    pub todo_count: usize,
    pub tipps_text: &'a str,
    pub verbesserungen: &'a BTreeMap<String, Improvement>,
}

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub slug: String,
    pub state: StatePayload,
    pub attributes: &'a ScoredResult,
    pub todo: TodoPayload<'a>,
}

/// ASCII slug of a species name: umlauts transliterated, everything else
/// outside `[a-z0-9]` collapsed into single underscores
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        let piece = match c {
            'ä' => "ae",
            'ö' => "oe",
            'ü' => "ue",
            'ß' => "ss",
            c if c.is_ascii_alphanumeric() => {
                slug.push(c);
                continue;
            }
            _ => "_",
        };
        if piece == "_" && (slug.is_empty() || slug.ends_with('_')) {
            continue;
        }
        slug.push_str(piece);
    }
    slug.trim_end_matches('_').to_string()
}

pub fn build_report(result: &ScoredResult) -> Report<'_> {
    Report {
        slug: slugify(result.species()),
        state: StatePayload {
            status: result.probability_pct,
        },
        attributes: result,
        todo: TodoPayload {
            todo_count: result.improvements.len(),
            tipps_text: &result.tips,
            verbesserungen: &result.improvements,
        },
    }
}

/// Write one JSON line per result
pub fn write_reports<W: Write>(results: &[ScoredResult], mut out: W) -> AppResult<()> {
    for result in results {
        let report = build_report(result);
        serde_json::to_writer(&mut out, &report)?;
        out.write_all(b"\n")?;
        tracing::debug!(
            slug = %report.slug,
            todo_count = report.todo.todo_count,
            "Report written"
        );
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use shared::{compute_catch_probability_and_window, EngineConfig, PreferenceSet, SensorRecord, SunTimes};

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hecht"), "hecht");
        assert_eq!(slugify("Große Maräne"), "grosse_maraene");
        assert_eq!(slugify("Aal (Glasaal) "), "aal_glasaal");
        assert_eq!(slugify("Döbel--Ükelei"), "doebel_uekelei");
    }

    fn scored() -> Vec<ScoredResult> {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let (prefs, _) = PreferenceSet::from_json_str(
            r#"[{"Art": "Rotfeder", "Bevorzugte_Windrichtung": ["N"]}]"#,
        )
        .unwrap();
        let record = SensorRecord {
            wind_bearing_deg: Some(180.0),
            ..SensorRecord::new("Rotfeder")
        };
        let sun = SunTimes::new(
            offset.with_ymd_and_hms(2024, 7, 15, 5, 0, 0).unwrap(),
            offset.with_ymd_and_hms(2024, 7, 15, 21, 0, 0).unwrap(),
        );
        let as_of = offset.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        compute_catch_probability_and_window(&[record], &prefs, &sun, &EngineConfig::default(), as_of)
    }

    #[test]
    fn test_report_payloads() {
        let results = scored();
        let report = build_report(&results[0]);
        assert_eq!(report.slug, "rotfeder");
        assert_eq!(report.state.status, results[0].probability_pct);
        assert_eq!(report.todo.todo_count, results[0].improvements.len());
        assert!(report.todo.verbesserungen.contains_key("Windrichtung"));
    }

    #[test]
    fn test_write_reports_as_json_lines() {
        let results = scored();
        let mut out = Vec::new();
        write_reports(&results, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["slug"], "rotfeder");
        assert_eq!(value["attributes"]["Art"], "Rotfeder");
        assert_eq!(value["attributes"]["Windrichtung"], "S");
        assert!(value["state"]["status"].is_u64());
        assert!(value["todo"]["tipps_text"]
            .as_str()
            .unwrap()
            .starts_with("Windrichtung S ungünstig"));
    }
}
