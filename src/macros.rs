//! Text-level escapes for DOM access.
//!
//! `%dqs{'#id'}` and `%innerHTML{"#id"}{"text"}` are rewritten on raw text,
//! before parsing or after translation. Neither rewrite looks at the tree.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUERY_SELECTOR: Regex = Regex::new(r"%dqs\{'([^']*)'\}").unwrap();
    static ref INNER_HTML: Regex = Regex::new(r#"%innerHTML\{"([^"]+)"\}\{"([^"]+)"\}"#).unwrap();
}

/// Rewrite both escapes. Text without escapes is returned unchanged.
pub fn expand(code: &str) -> String {
    let code = QUERY_SELECTOR.replace_all(code, "document.querySelector('$1')");
    let code = INNER_HTML.replace_all(&code, "document.querySelector('$1').innerHTML = '$2'");
    code.into_owned()
}

/// Whether the text contains any escape
pub fn has_macros(code: &str) -> bool {
    QUERY_SELECTOR.is_match(code) || INNER_HTML.is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_selector() {
        assert_eq!(expand("el = %dqs{'#app'}"), "el = document.querySelector('#app')");
    }

    #[test]
    fn test_inner_html() {
        assert_eq!(
            expand(r##"%innerHTML{"#out"}{"done"}"##),
            "document.querySelector('#out').innerHTML = 'done'"
        );
    }

    #[test]
    fn test_both_escapes_on_one_line() {
        let code = r##"%innerHTML{"#a"}{"x"}; b = %dqs{'.b'}"##;
        assert_eq!(
            expand(code),
            "document.querySelector('#a').innerHTML = 'x'; b = document.querySelector('.b')"
        );
    }

    #[test]
    fn test_empty_inner_html_content_is_left_alone() {
        let code = r##"%innerHTML{"#a"}{""}"##;
        assert!(!has_macros(code));
        assert_eq!(expand(code), code);
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(expand("x = {'a': 1}"), "x = {'a': 1}");
        assert!(!has_macros("x = 1"));
    }
}
