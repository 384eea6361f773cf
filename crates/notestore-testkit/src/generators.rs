//! Proptest generators for property-based testing.

use proptest::prelude::*;

/// Generate a valid title: visible text, optionally padded with spaces.
pub fn title() -> impl Strategy<Value = String> {
    ("[ ]{0,2}", "[A-Za-z0-9][A-Za-z0-9 ,.!?'-]{0,39}", "[ ]{0,2}")
        .prop_map(|(lead, body, trail)| format!("{lead}{body}{trail}"))
}

/// Generate a title that is empty or whitespace only.
pub fn blank_title() -> impl Strategy<Value = String> {
    "[ \t\r\n]{0,8}".prop_map(String::from)
}

/// Generate between 1 and `max` distinct valid titles.
pub fn distinct_titles(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(title(), 1..=max).prop_map(|set| set.into_iter().collect())
}
