use itertools::Itertools;

use crate::quote::QuoteRecord;

/// Closed set of lower-cased author first-tokens, sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KnownAuthors {
    tokens: Vec<String>,
}

impl KnownAuthors {
    /// Union of every record's author token with the caller-supplied extra names.
    pub fn build(quotes: &[QuoteRecord], extra: &[String]) -> Self {
        let tokens = quotes
            .iter()
            .map(|q| q.author.as_str())
            .chain(extra.iter().map(String::as_str))
            .filter_map(author_token)
            .sorted()
            .dedup()
            .collect();

        KnownAuthors { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Regex alternation body, e.g. `bob\b|j\.`. Word boundaries only after word characters.
    pub fn alternation(&self) -> String {
        self.tokens
            .iter()
            .map(|t| {
                let escaped = regex::escape(t);
                match t.chars().last() {
                    Some(c) if c.is_alphanumeric() || c == '_' => format!(r"{}\b", escaped),
                    _ => escaped,
                }
            })
            .join("|")
    }
}

/// First whitespace-delimited token of a name, lower-cased.
pub fn author_token(name: &str) -> Option<String> {
    name.split_whitespace().next().map(str::to_lowercase)
}
