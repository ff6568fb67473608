use std::collections::HashSet;

use crate::quote::MatchedQuote;

/// Trim, drop everything outside `[a-z0-9-.!?, ]` (any case), lower-case.
pub fn normalized_key(quote: &str) -> String {
    quote
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '!' | '?' | ',' | ' '))
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Split into (unique, duplicates). First record seen per key is kept; order is preserved.
pub fn deduplicate(quotes: Vec<MatchedQuote>) -> (Vec<MatchedQuote>, Vec<MatchedQuote>) {
    let mut seen: HashSet<String> = HashSet::with_capacity(quotes.len());
    let mut unique = Vec::with_capacity(quotes.len());
    let mut duplicates = Vec::new();

    for quote in quotes {
        if seen.insert(normalized_key(&quote.record.quote)) {
            unique.push(quote);
        } else {
            duplicates.push(quote);
        }
    }

    (unique, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::QuoteRecord;

    fn matched(id: &str, quote: &str) -> MatchedQuote {
        MatchedQuote {
            record: QuoteRecord {
                id: id.into(),
                quote: quote.into(),
                author: "Bob".into(),
                date: String::new(),
                verified: false,
            },
            matches: Vec::new(),
            subjects: Vec::new(),
            formatted: String::new(),
        }
    }

    fn ids(quotes: &[MatchedQuote]) -> Vec<&str> {
        quotes.iter().map(MatchedQuote::id).collect()
    }

    #[test]
    fn key_strips_and_lowers() {
        assert_eq!(normalized_key("  “Hello World” - Bob  "), "hello world - bob");
        assert_eq!(normalized_key("Wait... what?!"), "wait... what?!");
        assert_eq!(normalized_key("Café: 'ok'"), "caf ok");
    }

    #[test]
    fn first_seen_wins() {
        let (unique, dups) = deduplicate(vec![
            matched("2", "\"Hello World\" - Bob"),
            matched("1", "“hello world” - bob"),
            matched("3", "Other - Bob"),
        ]);
        assert_eq!(ids(&unique), vec!["2", "3"]);
        assert_eq!(ids(&dups), vec!["1"]);
    }

    #[test]
    fn punctuation_that_survives_keeps_records_apart() {
        let (unique, dups) = deduplicate(vec![
            matched("1", "Hello World - Bob"),
            matched("2", "hello world! - Bob"),
        ]);
        assert_eq!(unique.len(), 2);
        assert!(dups.is_empty());
    }

    #[test]
    fn idempotent_on_unique_output() {
        let (unique, _) = deduplicate(vec![
            matched("1", "a - Bob"),
            matched("2", "A - bob"),
            matched("3", "b - Bob"),
        ]);
        let before = ids(&unique).into_iter().map(String::from).collect::<Vec<_>>();
        let (again, dups) = deduplicate(unique);
        assert!(dups.is_empty());
        assert_eq!(ids(&again), before);
    }
}
