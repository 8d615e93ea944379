//! Payment-conditions page parsing: `a) ... e)` labeled entries with an
//! optional `- NN %` discount marker.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::ParsedCondition;

static CONDITION_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-e])\)\s+(.+)").expect("static pattern compiles"));

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s*(\d+)\s*%").expect("static pattern compiles"));

static NAME_PERCENT_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[-–]\s*\d+\s*%.*$").expect("static pattern compiles"));

/// Parse the conditions page text. Each labeled entry may wrap across
/// several lines; the discount is expressed as a positive percentage to
/// subtract, 0 when the entry carries no marker (e.g. "Contado").
pub(crate) fn parse_conditions(page: &str) -> Vec<ParsedCondition> {
    let mut conditions: Vec<ParsedCondition> = Vec::new();
    let mut in_entry = false;
    let mut buffer: Vec<String> = Vec::new();
    let mut sort_order = 0i64;

    for line in page.lines() {
        let line = line.trim();
        if let Some(captures) = CONDITION_LABEL_RE.captures(line) {
            if in_entry && !buffer.is_empty() {
                conditions.push(build_condition(&buffer, sort_order));
                sort_order += 1;
                buffer.clear();
            }
            in_entry = true;
            buffer.push(captures[2].to_string());
        } else if in_entry && !line.is_empty() {
            buffer.push(line.to_string());
        }
    }
    if in_entry && !buffer.is_empty() {
        conditions.push(build_condition(&buffer, sort_order));
    }

    conditions
}

fn build_condition(entry_lines: &[String], sort_order: i64) -> ParsedCondition {
    let text = entry_lines.join(" ").trim().to_string();

    let discount_percent = PERCENT_RE
        .captures(&text)
        .and_then(|captures| Decimal::from_str(&captures[1]).ok())
        .unwrap_or(Decimal::ZERO);

    let name_part = text.split(':').next().unwrap_or(&text).trim();
    let name = NAME_PERCENT_TAIL_RE.replace(name_part, "").trim().to_string();

    ParsedCondition { name, discount_percent, description: text, sort_order }
}
