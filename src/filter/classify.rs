use regex::Regex;

use super::authors::KnownAuthors;
use crate::quote::QuoteMatch;

/// Longest attribution accepted after the delimiter.
pub const MAX_ATTRIBUTION_LEN: usize = 25;

const OPEN_QUOTE: &str = r#"["“‘]"#;
const CLOSE_QUOTE: &str = r#"["”’]"#;
const DELIMITER: &str = r"\s*[-–—:~]+\s*";

struct Pattern {
    name: &'static str,
    re: Regex,
    known_author: bool,
}

/// Ordered quote/attribution patterns compiled against one known-author set.
pub struct Classifier {
    patterns: Vec<Pattern>,
}

impl Classifier {
    pub fn new(authors: &KnownAuthors) -> Self {
        let mut patterns = Vec::with_capacity(4);

        if !authors.is_empty() {
            let known = format!(r"(?P<author>(?:{})[^\n]*?)", authors.alternation());

            patterns.push(Pattern {
                name: "quoted-delimited-known",
                re: compile(&format!(
                    r"^\s*(?P<quote>{OPEN_QUOTE}[^\n]+?{CLOSE_QUOTE}){DELIMITER}{known}\s*$"
                )),
                known_author: true,
            });
            patterns.push(Pattern {
                name: "quoted-spaced-known",
                re: compile(&format!(
                    r"^\s*(?P<quote>{OPEN_QUOTE}[^\n]+?{CLOSE_QUOTE})\s+{known}\s*$"
                )),
                known_author: true,
            });
            patterns.push(Pattern {
                name: "plain-delimited-known",
                re: compile(&format!(r"^\s*(?P<quote>[^\n]+?){DELIMITER}{known}\s*$")),
                known_author: true,
            });
        }

        patterns.push(Pattern {
            name: "quoted-delimited-any",
            re: compile(&format!(
                r"^\s*(?P<quote>{OPEN_QUOTE}[^\n]+?{CLOSE_QUOTE})\s*[-–—:~]+(?P<author>[^\n]{{0,{MAX_ATTRIBUTION_LEN}}})$"
            )),
            known_author: false,
        });

        Classifier { patterns }
    }

    /// Extract every attributed line from a raw quote.
    ///
    /// Each line takes the first pattern that matches it. A record whose
    /// matches include a blank attribution yields nothing at all.
    pub fn classify(&self, raw: &str) -> Vec<QuoteMatch> {
        let text = raw.replace("\r\n", "\n");

        let matches: Vec<QuoteMatch> = text
            .lines()
            .filter_map(|line| self.classify_line(line))
            .collect();

        if matches.iter().any(|m| m.author_text.trim().is_empty()) {
            tracing::debug!("blank attribution, rejecting record");
            return Vec::new();
        }
        matches
    }

    fn classify_line(&self, line: &str) -> Option<QuoteMatch> {
        self.patterns.iter().find_map(|pattern| {
            let caps = pattern.re.captures(line)?;
            let quote_text = caps.name("quote")?.as_str().to_string();
            let author_text = caps.name("author")?.as_str().to_string();
            if pattern.known_author && author_text.trim().chars().count() > MAX_ATTRIBUTION_LEN {
                return None;
            }
            tracing::trace!(pattern = pattern.name, "classified line");
            Some(QuoteMatch {
                quote_text,
                author_text,
            })
        })
    }
}

fn compile(body: &str) -> Regex {
    // Author tokens are escaped, so the assembled pattern is always valid.
    Regex::new(&format!("(?im){}", body)).expect("quote pattern must compile")
}
