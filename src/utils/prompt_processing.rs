use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// Matches `{{name}}` where the name has no braces and no line breaks.
    pub(crate) static ref PLACEHOLDER_MATCH_RE: Regex = Regex::new(r"\{\{[^{}\r\n]+?\}\}").unwrap();
}

#[inline]
pub(crate) fn strip_format(key: &str) -> &str {
    //! Strips "{{" and "}}" from a matched placeholder.
    //! Only call this on a match of [PLACEHOLDER_MATCH_RE].
    &key[2..key.len() - 2]
}

/// Replaces every placeholder that has a `Some` value in the mapping, in a single pass.
///
/// Placeholders without a value are left untouched, and placeholder syntax inside the
/// replacement values is never expanded.
pub(crate) fn replace_all_placeholders(original: &str, mapping: &HashMap<String, Option<String>>) -> String {
    PLACEHOLDER_MATCH_RE
        .replace_all(original, |captures: &Captures| {
            let match_text = &captures[0];
            match mapping.get(strip_format(match_text)) {
                Some(Some(replacement)) => replacement.clone(),
                _ => match_text.to_string(),
            }
        })
        .into_owned()
}

pub fn get_placeholders(string: &str) -> HashSet<String> {
    PLACEHOLDER_MATCH_RE
        .captures_iter(string)
        .map(|captures| strip_format(&captures[0]).to_string())
        .collect()
}

#[cfg(test)]
mod string_tests {
    use std::collections::{HashMap, HashSet};

    use super::{get_placeholders, replace_all_placeholders};

    #[test]
    fn test_get_keys() {
        let keys = get_placeholders("{{a}}");
        assert_eq!(HashSet::from(["a".to_string()]), keys);

        let keys = get_placeholders("{{a\n}}");
        assert_eq!(0, keys.len());

        let keys = get_placeholders("{{a}}    {{b}} {{a}}");
        assert_eq!(HashSet::from(["a".to_string(), "b".to_string()]), keys);

        let keys = get_placeholders("Question:{question} has single braces");
        assert!(keys.is_empty());
    }

    #[test]
    fn test_replace() {
        let string = "{{a}} and {{b}} and {{a}}";
        let mapping = HashMap::from([
            ("a".to_string(), Some("alice".to_string())),
            ("b".to_string(), Some("bob".to_string())),
        ]);
        assert_eq!("alice and bob and alice", replace_all_placeholders(string, &mapping));
    }

    #[test]
    fn test_replace_is_single_pass() {
        let mapping = HashMap::from([
            ("a".to_string(), Some("{{b}}".to_string())),
            ("b".to_string(), Some("bob".to_string())),
        ]);
        assert_eq!("x {{b}} bob", replace_all_placeholders("x {{a}} {{b}}", &mapping));
    }

    #[test]
    fn test_replace_leaves_unfilled() {
        let mapping = HashMap::from([("a".to_string(), None)]);
        assert_eq!("{{a}} {{c}}", replace_all_placeholders("{{a}} {{c}}", &mapping));
    }
}
