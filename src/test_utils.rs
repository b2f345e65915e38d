//! Shared proptest strategies for unit tests.

use proptest::prelude::*;

use crate::Strategy as EscapeStrategy;

/// Arbitrary printable text, including HTML-significant characters.
pub fn arb_text(max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => prop::char::range('a', 'z'),
            2 => prop::sample::select(vec!['&', '<', '>', '"', '\'', ':', '/', ' ']),
            1 => prop::char::range('\u{00C0}', '\u{00FF}'),
        ],
        0..=max_len,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Arbitrary text without any HTML-significant character.
pub fn arb_inert_text(max_len: usize) -> impl Strategy<Value = String> {
    arb_text(max_len).prop_map(|text| text.replace(['&', '<', '>', '"', '\''], ""))
}

/// Arbitrary template text containing no placeholder token.
pub fn arb_template_literal(max_len: usize) -> impl Strategy<Value = String> {
    prop::string::string_regex(&format!("([a-z <>/]|[@%:!][ 0-9.]){{0,{}}}", max_len / 2))
        .expect("valid regex")
}

/// Either escaping strategy.
pub fn arb_strategy() -> impl Strategy<Value = EscapeStrategy> {
    prop_oneof![Just(EscapeStrategy::Html), Just(EscapeStrategy::All)]
}
