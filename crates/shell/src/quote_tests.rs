use super::*;

#[test]
fn plain_string_is_just_wrapped() {
    assert_eq!(quote("hello"), "'hello'");
}

#[test]
fn embedded_single_quote_uses_the_escape_trick() {
    assert_eq!(quote("it's"), "'it'\\''s'");
}

#[test]
fn empty_string_quotes_to_empty_pair() {
    assert_eq!(quote(""), "''");
}

#[test]
fn dollar_and_backtick_are_left_literal_inside_quotes() {
    assert_eq!(quote("$HOME `whoami`"), "'$HOME `whoami`'");
}

proptest::proptest! {
    #[test]
    fn quoted_output_is_always_single_quote_delimited(s in ".*") {
        let quoted = quote(&s);
        prop_assert!(quoted.starts_with('\''));
        prop_assert!(quoted.ends_with('\''));
    }
}
