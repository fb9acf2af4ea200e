//! Glob matching for cache keys, used by backends without a native `KEYS`.

/// Checks if a cache key matches a glob pattern where `*` matches any run of
/// characters, including none.
///
/// # Examples
///
/// ```
/// use guestbook_core::cache::pattern_matches;
///
/// assert!(pattern_matches("guest:abc", "guest:abc"));
/// assert!(pattern_matches("guest:*", "guest:keyword=&sorts=&take=10&skip=0"));
/// assert!(pattern_matches("guest:*:count", "guest:keyword=a&take=10:count"));
/// assert!(!pattern_matches("guest:*", "host:1"));
/// ```
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let mut segments = pattern.split('*');
    let first = segments.next().unwrap_or_default();
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };

    let tail: Vec<&str> = segments.collect();
    let Some((last, middle)) = tail.split_last() else {
        return rest.is_empty();
    };

    for segment in middle {
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}
