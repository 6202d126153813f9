//! Regulatory table of closed seasons and minimum sizes
//!
//! One row per species: the species name in the second cell, the closed
//! season span in the third, the minimum size in the fourth and the
//! jurisdiction in the last one.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use scraper::Html;
use shared::{ClosedSeason, PreferenceSet};

use super::html::table_rows;
use crate::error::{AppError, AppResult};

static DIGITS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+").ok());

/// Placeholder the table uses for "no value"
const EMPTY_CELL: &str = "–";

/// Regulation of one species as published
#[derive(Debug, Clone, PartialEq)]
pub struct Regulation {
    /// Lowercase species cell, e.g. "hecht (esox lucius)"
    pub key: String,
    /// Span that parsed as a closed season
    pub closed_season: Option<String>,
    /// Lower bound of the published size ("20–30 cm", "ab 20 cm" -> 20)
    pub minimum_size_cm: Option<f64>,
    /// "D" or "EU"
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegulationTable {
    rows: Vec<Regulation>,
}

impl RegulationTable {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let rows = table_rows(&document)
            .into_iter()
            .filter(|cells| cells.len() >= 4)
            .map(|cells| Regulation {
                key: cells[1].to_lowercase(),
                closed_season: filled(&cells[2])
                    .filter(|span| ClosedSeason::parse(span).is_some())
                    .map(str::to_string),
                minimum_size_cm: filled(&cells[3]).and_then(first_number),
                region: region_of(&cells[cells.len() - 1]).to_string(),
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row whose species cell contains the name, case-insensitively
    pub fn find(&self, species: &str) -> Option<&Regulation> {
        let needle = species.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.rows.iter().find(|row| row.key.contains(&needle))
    }

    /// Replace the closed-season fields of every listed species. Species
    /// missing from the table keep the values of the preference file.
    pub fn apply(&self, preferences: &mut PreferenceSet) {
        let names: Vec<String> = preferences.names().map(str::to_string).collect();
        for name in names {
            let Some(regulation) = self.find(&name) else {
                tracing::warn!(species = %name, "No closed season listed, keeping configured values");
                continue;
            };
            if let Some(pref) = preferences.get_mut(&name) {
                pref.closed_season = regulation.closed_season.clone();
                pref.minimum_size_cm = regulation.minimum_size_cm;
                pref.closed_season_region = Some(regulation.region.clone());
                tracing::debug!(
                    species = %name,
                    closed_season = ?pref.closed_season,
                    minimum_size_cm = ?pref.minimum_size_cm,
                    region = %regulation.region,
                    "Closed season"
                );
            }
        }
    }
}

fn filled(cell: &str) -> Option<&str> {
    let cell = cell.trim();
    (!cell.is_empty() && cell != EMPTY_CELL).then_some(cell)
}

fn first_number(text: &str) -> Option<f64> {
    DIGITS.as_ref()?.find(text)?.as_str().parse().ok()
}

fn region_of(cell: &str) -> &'static str {
    if cell.contains('D') {
        "D"
    } else {
        "EU"
    }
}

/// Client for the page publishing the regulation table
#[derive(Clone)]
pub struct ClosedSeasonClient {
    client: Client,
    url: String,
}

impl ClosedSeasonClient {
    pub fn new(url: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    pub async fn get_table(&self) -> AppResult<RegulationTable> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::Regulations(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Regulations(format!(
                "page returned {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        let table = RegulationTable::parse(&html);
        if table.is_empty() {
            return Err(AppError::Regulations("no regulation rows found".into()));
        }
        Ok(table)
    }
}
