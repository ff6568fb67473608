use serde::{Deserialize, Deserializer, Serialize};

// ── Input ──

/// One raw quotation as delivered by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub quote: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub verified: bool,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

// ── Pipeline output ──

/// One attributed quotation pulled out of a record's raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteMatch {
    pub quote_text: String,
    pub author_text: String,
}

/// A record that survived classification. Built once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedQuote {
    #[serde(flatten)]
    pub record: QuoteRecord,
    pub matches: Vec<QuoteMatch>,
    pub subjects: Vec<String>,
    /// Display text, one `“quote” – Author` line per match.
    pub formatted: String,
}

impl MatchedQuote {
    pub fn id(&self) -> &str {
        &self.record.id
    }
}

// ── Export ──

/// Display-ready subset written to `quotes.json` and `subjects.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayQuote {
    pub id: String,
    pub quote: Vec<String>,
    pub author: String,
    pub verified: bool,
    pub date: String,
    pub subjects: Vec<String>,
}
