use std::collections::BTreeMap;

use crate::quote::MatchedQuote;

/// Subject → ascending 1-based pages on which it appears.
pub type SubjectIndex = BTreeMap<String, Vec<usize>>;

/// Build the cross-reference for an already ordered list. `None` when nothing carries a subject.
pub fn build_index(quotes: &[MatchedQuote]) -> Option<SubjectIndex> {
    let mut index = SubjectIndex::new();

    for (i, quote) in quotes.iter().enumerate() {
        let page = i + 1;
        for subject in &quote.subjects {
            let pages = index.entry(subject.clone()).or_default();
            if pages.last() != Some(&page) {
                pages.push(page);
            }
        }
    }

    if index.is_empty() {
        None
    } else {
        Some(index)
    }
}
