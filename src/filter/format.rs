use std::sync::LazyLock;

use itertools::Itertools;
use regex::{Captures, Regex};

use crate::quote::QuoteMatch;

static SENTENCE_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\.\s*)(\w)").unwrap());
static NAME_PART_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(^|\W)(\w)").unwrap());

const QUOTE_MARKS: &[char] = &['"', '“', '”', '‘', '’'];

/// Strip surrounding quote marks and capitalize the start of each sentence.
pub fn format_like_a_sentence(text: &str) -> String {
    let inner = text.trim_matches(|c: char| c.is_whitespace() || QUOTE_MARKS.contains(&c));
    SENTENCE_START_RE
        .replace_all(inner, |caps: &Captures| {
            format!("{}{}", &caps[1], caps[2].to_uppercase())
        })
        .into_owned()
}

/// Capitalize the first letter of each name part: `o'brien-smith` → `O'Brien-Smith`.
pub fn format_name(name: &str) -> String {
    NAME_PART_RE
        .replace_all(name.trim(), |caps: &Captures| {
            format!("{}{}", &caps[1], caps[2].to_uppercase())
        })
        .into_owned()
}

/// `“quote” – Author`, one line per match.
pub fn render_matches(matches: &[QuoteMatch]) -> String {
    matches
        .iter()
        .map(|m| {
            format!(
                "“{}” – {}",
                format_like_a_sentence(&m.quote_text),
                format_name(&m.author_text)
            )
        })
        .join("\n")
}

/// Distinct formatted author names, in match order.
pub fn subjects_of(matches: &[QuoteMatch]) -> Vec<String> {
    matches
        .iter()
        .map(|m| format_name(&m.author_text))
        .filter(|s| !s.is_empty())
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(quote: &str, author: &str) -> QuoteMatch {
        QuoteMatch {
            quote_text: quote.into(),
            author_text: author.into(),
        }
    }

    #[test]
    fn sentence_strips_all_quote_styles() {
        assert_eq!(format_like_a_sentence(r#" "life is short" "#), "Life is short");
        assert_eq!(format_like_a_sentence("“life”"), "Life");
        assert_eq!(format_like_a_sentence("‘life’"), "Life");
    }

    #[test]
    fn sentence_keeps_leading_apostrophe() {
        assert_eq!(format_like_a_sentence("'t is altijd wat"), "'t is altijd wat");
        assert_eq!(format_like_a_sentence("\"'s avonds\""), "'s avonds");
    }

    #[test]
    fn sentence_capitalizes_after_periods() {
        assert_eq!(
            format_like_a_sentence("first. second.third stays"),
            "First. Second.Third stays"
        );
    }

    #[test]
    fn sentence_leaves_rest_untouched() {
        assert_eq!(format_like_a_sentence("hello NASA friends"), "Hello NASA friends");
    }

    #[test]
    fn sentence_is_idempotent() {
        for s in ["\"hi. there\"", "“a.b. c”", "plain", "", "x.  y"] {
            let once = format_like_a_sentence(s);
            assert_eq!(format_like_a_sentence(&once), once);
        }
    }

    #[test]
    fn names() {
        assert_eq!(format_name(" jane doe "), "Jane Doe");
        assert_eq!(format_name("o'brien"), "O'Brien");
        assert_eq!(format_name("jean-luc picard"), "Jean-Luc Picard");
        assert_eq!(format_name("McDONALD"), "McDONALD");
    }

    #[test]
    fn render_one_line_per_match() {
        let rendered = render_matches(&[m("\"life is short\"", " jane"), m("“so. true”", "bob")]);
        assert_eq!(rendered, "“Life is short” – Jane\n“So. True” – Bob");
    }

    #[test]
    fn subjects_unique_in_order() {
        let subjects = subjects_of(&[m("a", "bob"), m("b", "jane"), m("c", "Bob ")]);
        assert_eq!(subjects, vec!["Bob", "Jane"]);
    }
}
