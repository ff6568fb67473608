use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::filter::order::date_or_epoch;
use crate::filter::subjects::SubjectIndex;
use crate::quote::{DisplayQuote, MatchedQuote};

pub const QUOTES_FILE: &str = "quotes.json";
pub const SUBJECTS_FILE: &str = "subjects.json";
pub const INDEX_FILE: &str = "subject-index.json";

pub fn to_display(quote: &MatchedQuote) -> DisplayQuote {
    DisplayQuote {
        id: quote.record.id.clone(),
        quote: quote.formatted.lines().map(str::to_string).collect(),
        author: quote.record.author.clone(),
        verified: quote.record.verified,
        date: date_or_epoch(&quote.record.date).to_rfc3339(),
        subjects: quote.subjects.clone(),
    }
}

/// Subject → every display quote carrying it, in book order.
pub fn group_by_subject(quotes: &[DisplayQuote]) -> BTreeMap<String, Vec<DisplayQuote>> {
    let mut grouped: BTreeMap<String, Vec<DisplayQuote>> = BTreeMap::new();
    for quote in quotes {
        for subject in &quote.subjects {
            grouped.entry(subject.clone()).or_default().push(quote.clone());
        }
    }
    grouped
}

/// Write `quotes.json`, `subjects.json` and, when present, `subject-index.json`.
pub fn write_all(
    output_dir: &Path,
    unique: &[MatchedQuote],
    index: Option<&SubjectIndex>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let display: Vec<DisplayQuote> = unique.iter().map(to_display).collect();
    let mut written = vec![
        write_json(&output_dir.join(QUOTES_FILE), &display)?,
        write_json(&output_dir.join(SUBJECTS_FILE), &group_by_subject(&display))?,
    ];
    if let Some(index) = index {
        written.push(write_json(&output_dir.join(INDEX_FILE), index)?);
    }

    info!(files = written.len(), dir = ?output_dir, "exported quotes");
    Ok(written)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path.to_path_buf())
}
