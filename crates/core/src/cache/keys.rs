use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9:_&=-]+").expect("Invalid cache key regex"));

/// Fills the `%s` placeholder of a key format with `value`.
///
/// A format without a placeholder gets the value appended.
pub fn format_key(keyf: &str, value: &str) -> String {
    if keyf.contains("%s") {
        keyf.replacen("%s", value, 1)
    } else {
        format!("{keyf}{value}")
    }
}

/// Returns the glob pattern matching every key of a key format.
pub fn all_keys_pattern(keyf: &str) -> String {
    format_key(keyf, "*")
}

/// Returns the cache key for a list query.
///
/// The query string is trimmed and every run of characters outside
/// `[a-zA-Z0-9:_&=-]` becomes a single `_`, so queries that differ only in
/// those characters share a key.
pub fn list_query_key(keyf: &str, keyword: &str, sorts: &str, take: u64, skip: u64) -> String {
    let raw = format!("keyword={keyword}&sorts={sorts}&take={take}&skip={skip}");
    let sanitised = UNSAFE_KEY_CHARS.replace_all(raw.trim(), "_");
    format_key(keyf, &sanitised)
}

/// Returns the count key paired with a list key.
pub fn count_key(list_key: &str) -> String {
    format!("{list_key}:count")
}
