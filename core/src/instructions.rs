use std::sync::LazyLock;

use regex::Regex;

static STEP_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s*").expect("step pattern is valid"));

/// Split recipe instructions into steps.
///
/// Steps are separated by '.'. Each piece is trimmed, a leading step number
/// ("1 ", "2") is removed, and empty pieces are dropped. Order is kept.
#[must_use]
pub fn split_instructions(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| STEP_NUMBER.replace(s, "").into_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split a comma separated ingredient list into trimmed, non-empty names.
#[must_use]
pub fn split_ingredients(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
