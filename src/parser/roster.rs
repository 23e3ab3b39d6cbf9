use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use super::element_text;
use crate::error::ParseError;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// One staff row of the roster table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Raw display name, degree prefix included.
    pub name: String,
    pub href: Option<String>,
}

/// Parse the roster page: first table, header row skipped, one entry per row
/// whose first cell holds a link. Rows without one are skipped.
pub fn parse_roster(html: &str) -> Result<Vec<RosterEntry>, ParseError> {
    let doc = Html::parse_document(html);
    let table = doc.select(&TABLE).next().ok_or(ParseError::MissingTable)?;

    let mut entries = Vec::new();
    for (i, row) in table.select(&ROW).enumerate().skip(1) {
        let link = row
            .select(&CELL)
            .next()
            .and_then(|cell| cell.select(&LINK).next());
        let Some(link) = link else {
            debug!(row = i, "roster row has no link in its first cell, skipping");
            continue;
        };

        entries.push(RosterEntry {
            name: element_text(link),
            href: link.value().attr("href").map(str::to_string),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_is_skipped() {
        let html = r#"<table>
            <tr><td><a href="/x">Header link</a></td></tr>
            <tr><td><a href="/p/1">dr hab. Jan Kowalski</a></td><td>Institute</td></tr>
        </table>"#;
        let entries = parse_roster(html).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "dr hab. Jan Kowalski");
        assert_eq!(entries[0].href.as_deref(), Some("/p/1"));
    }

    #[test]
    fn rows_without_link_are_skipped() {
        let html = r#"<table>
            <tr><th>Name</th></tr>
            <tr><td>Vacant position</td></tr>
            <tr><td><a href="/p/2">Anna Nowak</a></td></tr>
            <tr><td></td><td><a href="/p/3">Link in second cell</a></td></tr>
        </table>"#;
        let entries = parse_roster(html).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Anna Nowak"]);
    }

    #[test]
    fn only_first_table_is_read() {
        let html = r#"
            <table><tr><th>Name</th></tr><tr><td><a>First Table</a></td></tr></table>
            <table><tr><th>Name</th></tr><tr><td><a>Second Table</a></td></tr></table>"#;
        let entries = parse_roster(html).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "First Table");
        assert_eq!(entries[0].href, None);
    }

    #[test]
    fn link_text_whitespace_is_collapsed() {
        let html = "<table><tr><th>x</th></tr><tr><td><a href='/p'>\n  prof. dr\n  Anna   Nowak </a></td></tr></table>";
        let entries = parse_roster(html).unwrap();
        assert_eq!(entries[0].name, "prof. dr Anna Nowak");
    }

    #[test]
    fn missing_table() {
        assert_eq!(parse_roster("<p>maintenance</p>"), Err(ParseError::MissingTable));
    }

    #[test]
    fn roster_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/roster.html").unwrap();
        let entries = parse_roster(&html).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "dr hab. inż. Jan Kowalski",
                "dr Anna Nowak",
                "prof. dr hab. Piotr Wiśniewski",
                "dr Katarzyna",
            ]
        );
    }
}
