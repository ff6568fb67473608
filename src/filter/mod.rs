pub mod authors;
pub mod classify;
pub mod dedup;
pub mod format;
pub mod order;
pub mod subjects;

use std::collections::HashSet;

use tracing::debug;

use crate::cache::{CacheError, CacheStore, DROPPED_KEY, DUPLICATE_KEY, QUOTES_KEY, SORTED_KEY};
use crate::quote::{MatchedQuote, QuoteRecord};
use authors::KnownAuthors;
use classify::Classifier;
use subjects::SubjectIndex;

#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Names added to the known-author set on top of the batch's own authors.
    pub extra_authors: Vec<String>,
    /// Record ids routed straight to the dropped partition.
    pub skip_ids: Vec<String>,
}

/// Every input record lands in exactly one of these.
#[derive(Debug, Clone, Default)]
pub struct Partitions {
    pub unique: Vec<MatchedQuote>,
    pub duplicates: Vec<MatchedQuote>,
    pub dropped: Vec<QuoteRecord>,
}

impl Partitions {
    pub fn subject_index(&self) -> Option<SubjectIndex> {
        subjects::build_index(&self.unique)
    }
}

pub enum FilterOutcome {
    NoSourceData,
    Filtered(Partitions),
}

/// classify → format → dedup (reverse input order) → sort by date → partition.
pub fn process_batch(quotes: &[QuoteRecord], options: &FilterOptions) -> Partitions {
    let skip: HashSet<&str> = options.skip_ids.iter().map(String::as_str).collect();

    let authors = KnownAuthors::build(quotes, &options.extra_authors);
    debug!(authors = authors.tokens().len(), "built known-author set");
    let classifier = Classifier::new(&authors);

    // Reverse scan: for equal keys the later input record is the one kept.
    let matched: Vec<MatchedQuote> = quotes
        .iter()
        .rev()
        .filter(|q| !skip.contains(q.id.as_str()))
        .filter_map(|q| match_record(&classifier, q))
        .collect();
    debug!(matched = matched.len(), "classified");

    let (mut unique, duplicates) = dedup::deduplicate(matched);
    debug!(unique = unique.len(), duplicates = duplicates.len(), "deduplicated");

    order::sort_by_date(&mut unique);

    let dropped = {
        let kept: HashSet<&str> = unique
            .iter()
            .chain(duplicates.iter())
            .map(MatchedQuote::id)
            .collect();
        quotes
            .iter()
            .filter(|q| !kept.contains(q.id.as_str()))
            .cloned()
            .collect::<Vec<_>>()
    };

    Partitions {
        unique,
        duplicates,
        dropped,
    }
}

fn match_record(classifier: &Classifier, record: &QuoteRecord) -> Option<MatchedQuote> {
    if record.quote.trim().is_empty() {
        return None;
    }
    let matches = classifier.classify(&record.quote);
    if matches.is_empty() {
        return None;
    }
    Some(MatchedQuote {
        record: record.clone(),
        subjects: format::subjects_of(&matches),
        formatted: format::render_matches(&matches),
        matches,
    })
}

/// Read `quotes` from the store, filter, and write the three partitions back.
pub fn run(store: &mut impl CacheStore, options: &FilterOptions) -> Result<FilterOutcome, CacheError> {
    let Some(quotes) = store.get::<Vec<QuoteRecord>>(QUOTES_KEY)? else {
        return Ok(FilterOutcome::NoSourceData);
    };

    let partitions = process_batch(&quotes, options);

    store.set(SORTED_KEY, &partitions.unique)?;
    store.set(DUPLICATE_KEY, &partitions.duplicates)?;
    store.set(DROPPED_KEY, &partitions.dropped)?;

    Ok(FilterOutcome::Filtered(partitions))
}

// ── Tests ──
