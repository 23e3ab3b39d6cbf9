use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::element_text;
use crate::error::ParseError;

/// Styling class of the publication table; its presence also marks the page as rendered.
pub const TABLE_CLASS: &str = "table-striped";

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&format!("table.table.{TABLE_CLASS}")).unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static BOLD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("b").unwrap());

/// Publication titles in page order: the bold text of each row's first cell.
/// Section headers and rows with an empty title are skipped.
pub fn parse_publications(html: &str) -> Result<Vec<String>, ParseError> {
    let doc = Html::parse_document(html);
    let table = doc
        .select(&TABLE)
        .next()
        .ok_or_else(|| ParseError::MissingStyledTable(TABLE_CLASS.to_string()))?;

    let titles = table
        .select(&ROW)
        .filter_map(|row| row.select(&CELL).next())
        .filter_map(|cell| cell.select(&BOLD).next())
        .map(element_text)
        .filter(|title| !title.is_empty())
        .collect();

    Ok(titles)
}
