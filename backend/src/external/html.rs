//! HTML table helpers shared by the scraping clients

use scraper::{ElementRef, Html, Selector};

/// Text of an element with whitespace (including `&nbsp;`) collapsed
pub fn cell_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain text of every `td`/`th` cell of every table row
pub fn table_rows(document: &Html) -> Vec<Vec<String>> {
    let (Ok(rows), Ok(cells)) = (Selector::parse("table tr"), Selector::parse("td, th")) else {
        return Vec::new();
    };
    document
        .select(&rows)
        .map(|row| row.select(&cells).map(cell_text).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_with_optional_end_tags() {
        let document = Html::parse_document(
            "<table><tr><th>Ort<th>Temp<tr><td>Stock<td> 18,5&nbsp;°C </table>",
        );
        assert_eq!(
            table_rows(&document),
            vec![vec!["Ort", "Temp"], vec!["Stock", "18,5 °C"]]
        );
    }

    #[test]
    fn test_nested_markup_is_flattened() {
        let document = Html::parse_document(
            "<table><tr><td><b>Hecht</b> <i>(Esox lucius)</i></td></tr></table><p>kein Tisch</p>",
        );
        assert_eq!(table_rows(&document), vec![vec!["Hecht (Esox lucius)"]]);
    }
}
