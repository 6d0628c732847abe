//! Cleaning and interpretation of sling console output.

use regex::Regex;
use std::sync::OnceLock;

fn ansi_escape() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    // ESC-prefixed CSI sequences, plus the bare `[..m` remnants some terminals leave behind
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]|\[[0-9;]+[a-zA-Z]").expect("valid regex"))
}

/// Level marker as a whole token, preceded only by timestamp-like tokens
fn level_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^(?:[0-9:.\-/+][0-9:.\-/+TZ]* )*(TRC|DBG|INF|WRN|ERR)\b").expect("valid regex")
    })
}

fn row_count() -> &'static Regex {
    static ROWS: OnceLock<Regex> = OnceLock::new();
    ROWS.get_or_init(|| Regex::new(r"(?i)\b(\d[\d,]*)\s+rows?\b").expect("valid regex"))
}

/// Severity parsed from a sling log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLevel {
    Debug,
    Info,
    Warn,
    Error,
    Unknown,
}

/// Strip terminal escapes and any timestamp prefix before the level marker
pub fn clean_line(raw: &str) -> String {
    let without_escapes = ansi_escape().replace_all(raw, " ");
    let normalized = without_escapes.split_whitespace().collect::<Vec<_>>().join(" ");
    match level_prefix()
        .captures(&normalized)
        .and_then(|captures| captures.get(1))
    {
        Some(marker) => normalized[marker.start()..].to_string(),
        None => normalized,
    }
}

/// Level of a cleaned line, read from its first token
pub fn line_level(cleaned: &str) -> LineLevel {
    match cleaned.split_whitespace().next() {
        Some("TRC") | Some("DBG") => LineLevel::Debug,
        Some("INF") => LineLevel::Info,
        Some("WRN") => LineLevel::Warn,
        Some("ERR") => LineLevel::Error,
        _ => LineLevel::Unknown,
    }
}

/// Number of rows mentioned in a line such as `INF wrote 3 rows to main.tbl`
pub fn rows_in_line(cleaned: &str) -> Option<u64> {
    row_count()
        .captures_iter(cleaned)
        .last()
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Last row count reported across all lines
pub fn rows_written<'a, I>(lines: I) -> Option<u64>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().filter_map(rows_in_line).last()
}
