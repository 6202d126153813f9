//! Regulatory closed seasons
//!
//! Spans are written like "1. März bis 30. April". They recur every year and
//! may wrap the year end ("15. Dezember bis 31. Januar").

use chrono::{Datelike, NaiveDate};

const SEPARATORS: [&str; 5] = [" bis ", " to ", "–", "—", "-"];

fn month_number(name: &str) -> Option<u32> {
    let name = name.trim().trim_end_matches('.').to_lowercase();
    let month = match name.as_str() {
        "januar" | "jänner" | "january" | "jan" => 1,
        "februar" | "february" | "feb" => 2,
        "märz" | "maerz" | "march" | "mär" | "mar" => 3,
        "april" | "apr" => 4,
        "mai" | "may" => 5,
        "juni" | "june" | "jun" => 6,
        "juli" | "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "oktober" | "october" | "okt" | "oct" => 10,
        "november" | "nov" => 11,
        "dezember" | "december" | "dez" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parse "1. Mai" into (month, day)
fn parse_day_month(text: &str) -> Option<(u32, u32)> {
    let mut tokens = text.split_whitespace();
    let day: u32 = tokens.next()?.trim_end_matches('.').parse().ok()?;
    let month = month_number(tokens.next()?)?;
    if tokens.next().is_some() {
        return None;
    }
    // Leap year so that 29 February is accepted
    NaiveDate::from_ymd_opt(2024, month, day)?;
    Some((month, day))
}

/// A recurring closed season as two (month, day) bounds, both inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedSeason {
    pub start: (u32, u32),
    pub end: (u32, u32),
}

impl ClosedSeason {
    pub fn parse(span: &str) -> Option<Self> {
        let span = span.trim();
        let (from, to) = SEPARATORS
            .iter()
            .find_map(|sep| span.split_once(sep))?;
        Some(Self {
            start: parse_day_month(from)?,
            end: parse_day_month(to)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let day = (date.month(), date.day());
        if self.start <= self.end {
            self.start <= day && day <= self.end
        } else {
            day >= self.start || day <= self.end
        }
    }
}

/// Whether `date` lies inside the closed season; `None` when the span
/// cannot be parsed
pub fn closed_season_active(span: &str, date: NaiveDate) -> Option<bool> {
    ClosedSeason::parse(span).map(|season| season.contains(date))
}
