//! Water surface temperature lookup
//!
//! The reading is published as an HTML table: the second cell of the
//! second row carries the temperature, written with a decimal comma.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use super::html::{cell_text, table_rows};
use crate::error::{AppError, AppResult};

// Matches: 18,5 / 18.5 / -0,4 / 21
static NUMBER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:[.,]\d+)?").ok());

/// Client for the page publishing the water temperature
#[derive(Clone)]
pub struct SurfaceTempClient {
    client: Client,
    url: String,
}

impl SurfaceTempClient {
    pub fn new(url: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// Fetch the page and extract the current surface temperature in °C
    pub async fn get_surface_temperature(&self) -> AppResult<f64> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::SurfaceTemp(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::SurfaceTemp(format!(
                "page returned {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        extract_surface_temperature(&html).ok_or_else(|| {
            tracing::debug!(rows = ?table_text(&html), "Surface temperature page layout");
            AppError::SurfaceTemp("no temperature in second table row".into())
        })
    }
}

/// Second `<td>` of the second table row, parsed with a decimal comma
pub fn extract_surface_temperature(html: &str) -> Option<f64> {
    let rows = Selector::parse("table tr").ok()?;
    let cells = Selector::parse("td").ok()?;

    let document = Html::parse_document(html);
    let row = document.select(&rows).nth(1)?;
    let cell = row.select(&cells).nth(1)?;
    parse_decimal_comma(&cell_text(cell))
}

/// Plain text of every cell in every row, for diagnostics
pub fn table_text(html: &str) -> Vec<Vec<String>> {
    table_rows(&Html::parse_document(html))
}

/// "18,5 °C" -> 18.5
pub fn parse_decimal_comma(text: &str) -> Option<f64> {
    let number = NUMBER_PATTERN.as_ref()?.find(text)?.as_str();
    number.replace(',', ".").parse().ok()
}
