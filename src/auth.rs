use std::sync::LazyLock;

use anyhow::Result;
use inquire::validator::Validation;
use inquire::{Confirm, Text};
use regex::Regex;

use crate::cache::{CacheStore, TOKEN_KEY};

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+\|[a-z0-9]{40}$").unwrap());

/// Sanctum-style `<id>|<40 alphanumerics>` API token.
pub fn validate_token(token: &str) -> std::result::Result<(), &'static str> {
    if token.is_empty() {
        return Err("You must enter a token.");
    }
    if !TOKEN_RE.is_match(token) {
        return Err("API key seems to be invalid");
    }
    Ok(())
}

pub enum AuthOutcome {
    Stored,
    Cleared,
    Kept,
}

/// `auth [TOKEN] [--clear]`
pub fn run(store: &mut impl CacheStore, token: Option<String>, clear: bool) -> Result<AuthOutcome> {
    if clear {
        store.remove(TOKEN_KEY)?;
        return Ok(AuthOutcome::Cleared);
    }

    if let Some(token) = token {
        let token = token.trim().to_string();
        validate_token(&token).map_err(anyhow::Error::msg)?;
        store.set(TOKEN_KEY, &token)?;
        return Ok(AuthOutcome::Stored);
    }

    if store.get::<String>(TOKEN_KEY)?.is_some() {
        let overwrite = Confirm::new("API token already set, overwrite?")
            .with_default(false)
            .prompt()?;
        if !overwrite {
            return Ok(AuthOutcome::Kept);
        }
    }

    let token = Text::new("Please enter an API token:")
        .with_validator(|input: &str| {
            Ok(match validate_token(input.trim()) {
                Ok(()) => Validation::Valid,
                Err(msg) => Validation::Invalid(msg.into()),
            })
        })
        .prompt()?;

    store.set(TOKEN_KEY, token.trim())?;
    Ok(AuthOutcome::Stored)
}
