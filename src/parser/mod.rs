pub mod publications;
pub mod roster;

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Text content of an element with runs of whitespace collapsed and ends trimmed.
fn element_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    WHITESPACE_RE.replace_all(raw.trim(), " ").into_owned()
}
