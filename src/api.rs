use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Url;
use tracing::info;

use crate::quote::QuoteRecord;

const QUOTES_PATH: &str = "api/quotes/book";

/// `<base>/api/quotes/book`, tolerating a base with or without trailing slash.
pub fn quotes_url(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url).with_context(|| format!("Invalid API base URL {}", base_url))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(QUOTES_PATH)?)
}

fn user_agent() -> String {
    format!("Gumbo Millennium Book Builder ({})", env!("CARGO_PKG_VERSION"))
}

/// Download the full quote list for the book.
pub async fn fetch_quotes(base_url: &str, token: &str) -> Result<Vec<QuoteRecord>> {
    let url = quotes_url(base_url)?;
    let client = reqwest::Client::new();

    info!("Fetching quotes: {}", url);
    let body = client
        .get(url.clone())
        .header(ACCEPT, "application/json")
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .header(USER_AGENT, user_agent())
        .send()
        .await
        .with_context(|| format!("HTTP call to {} failed", url.path()))?
        .error_for_status()
        .context("Quote API returned an error status")?
        .text()
        .await
        .context("Failed to read quote API response")?;

    parse_quotes(&body)
}

/// Accepts a bare array or a `{"data": [...]}` envelope.
pub fn parse_quotes(body: &str) -> Result<Vec<QuoteRecord>> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("Quote API response is not JSON")?;
    let list = match value {
        serde_json::Value::Object(mut obj) if obj.contains_key("data") => obj.remove("data").unwrap_or_default(),
        other => other,
    };
    let quotes: Vec<QuoteRecord> =
        serde_json::from_value(list).context("Quote API response has an unexpected shape")?;
    info!("Parsed {} quotes", quotes.len());
    Ok(quotes)
}
