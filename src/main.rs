mod api;
mod auth;
mod bundle;
mod cache;
mod export;
mod filter;
mod quote;
mod settings;

use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::ProgressBar;
use inquire::Confirm;

use cache::{CacheStore, SqliteCache, DROPPED_KEY, DUPLICATE_KEY, QUOTES_KEY, SORTED_KEY, TOKEN_KEY};
use filter::{FilterOptions, FilterOutcome, Partitions};
use quote::QuoteRecord;

#[derive(Parser)]
#[command(name = "gumbo-book", about = "Utility to create a PDF book from the Gumbo API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with the Gumbo API
    Auth {
        /// The API token to configure
        token: Option<String>,
        /// Clear the API token
        #[arg(long)]
        clear: bool,
    },
    /// Download the list of quotes from the Gumbo API
    Download {
        /// Re-download without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Filter, de-duplicate and sort the downloaded quotes
    Filter {
        /// Extra author names to accept as attributions
        #[arg(short, long, value_delimiter = ',')]
        authors: Vec<String>,
        /// Quote ids to drop before filtering
        #[arg(short, long, value_delimiter = ',')]
        skip: Vec<String>,
        /// List every accepted, duplicate and dropped quote
        #[arg(short, long)]
        verbose: bool,
        /// Write quotes.json and subjects.json to the output directory
        #[arg(short, long)]
        export: bool,
    },
    /// Bundle the quotes into a PDF book
    Bundle {
        /// Limit the number of quotes to bundle
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Bundle a single quote, overrides --limit
        #[arg(long)]
        single: bool,
    },
    /// Show debug information
    Debug {
        /// Clear the cache
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = settings::load()?;
    let mut store = SqliteCache::open(&settings.cache_path)?;

    let result = match cli.command {
        Commands::Auth { token, clear } => {
            match auth::run(&mut store, token, clear)? {
                auth::AuthOutcome::Stored => println!("{}", "API token stored.".green()),
                auth::AuthOutcome::Cleared => println!("{}", "API token cleared.".green()),
                auth::AuthOutcome::Kept => println!("{}", "Not overwriting token.".dimmed()),
            }
            Ok(())
        }
        Commands::Download { force } => {
            let Some(token) = store.get::<String>(TOKEN_KEY)? else {
                println!("{}", "No API token set. Please run `gumbo-book auth` first.".red());
                return Ok(());
            };
            if !force && store.get_value(QUOTES_KEY)?.is_some() {
                let redownload = Confirm::new("Quotes already exist. Re-download?")
                    .with_default(true)
                    .prompt()?;
                if !redownload {
                    return Ok(());
                }
            }
            let quotes = api::fetch_quotes(&settings.api_base_url, &token).await?;
            store.set(QUOTES_KEY, &quotes)?;
            println!("{}", format!("Downloaded {} quotes.", quotes.len()).green());
            Ok(())
        }
        Commands::Filter {
            authors,
            skip,
            verbose,
            export: write_files,
        } => {
            let options = FilterOptions {
                extra_authors: authors,
                skip_ids: skip,
            };
            let progress = ProgressBar::new_spinner();
            progress.enable_steady_tick(Duration::from_millis(100));
            progress.set_message("Filtering quotes...");
            let outcome = filter::run(&mut store, &options)?;
            progress.finish_and_clear();

            match outcome {
                FilterOutcome::NoSourceData => {
                    println!(
                        "{}",
                        "No quotes downloaded. Please run `gumbo-book download` first.".red()
                    );
                }
                FilterOutcome::Filtered(partitions) => {
                    let total = partitions.unique.len()
                        + partitions.duplicates.len()
                        + partitions.dropped.len();
                    println!(
                        "Filtered {} quotes to {} quotes ({} duplicates, {} dropped).",
                        total,
                        partitions.unique.len(),
                        partitions.duplicates.len(),
                        partitions.dropped.len()
                    );
                    if verbose {
                        print_partitions(&partitions);
                    }
                    if write_files {
                        let index = partitions.subject_index();
                        let written =
                            export::write_all(&settings.output_dir, &partitions.unique, index.as_ref())?;
                        for path in written {
                            println!("Wrote {}", path.display());
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Bundle { limit, single } => {
            let renderer = bundle::BrowserRenderer {
                binary: settings.browser.clone(),
            };
            let options = bundle::BundleOptions { limit, single };
            match bundle::run(&store, &renderer, &settings.output_dir, &options).await? {
                bundle::BundleOutcome::NoSourceData => {
                    println!(
                        "{}",
                        "No filtered quotes available. Please run `gumbo-book filter` first.".red()
                    );
                }
                bundle::BundleOutcome::Rendered(stats) => {
                    println!(
                        "Rendered {} quote pages to {}",
                        stats.pages,
                        settings.output_dir.display()
                    );
                    if let Some(index) = stats.index {
                        println!("Subject index: {}", index.display());
                    }
                }
            }
            Ok(())
        }
        Commands::Debug { clear } => {
            if clear {
                store.clear()?;
                println!("{}", "Cache cleared.".green());
                return Ok(());
            }
            print_debug(&store)?;
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_partitions(partitions: &Partitions) {
    for q in &partitions.unique {
        println!("{}: {}", "Accepted".green(), q.formatted);
    }
    for q in &partitions.duplicates {
        println!("{}: {}", "Duplicate".blue(), q.record.quote);
    }
    for q in &partitions.dropped {
        println!("{}: {}", "Dropped".red(), q.quote);
    }
}

fn print_debug(store: &impl CacheStore) -> anyhow::Result<()> {
    println!("{}", "Debug information".bold().blue());

    let token = store.get::<String>(TOKEN_KEY)?;
    print_property("API token", token);

    for (label, key) in [
        ("Quote count", QUOTES_KEY),
        ("Sorted quotes", SORTED_KEY),
        ("Duplicate quotes", DUPLICATE_KEY),
        ("Dropped quotes", DROPPED_KEY),
    ] {
        let count = store
            .get_value(key)?
            .and_then(|v| v.as_array().map(Vec::len))
            .map(|n| n.to_string());
        print_property(label, count);
    }

    if let Some(quotes) = store.get::<Vec<QuoteRecord>>(QUOTES_KEY)? {
        let authors = filter::authors::KnownAuthors::build(&quotes, &[]);
        print_property("Known authors", Some(authors.tokens().len().to_string()));
    }
    Ok(())
}

fn print_property(label: &str, value: Option<String>) {
    match value {
        Some(v) => println!("- {}: {}", label, v.yellow()),
        None => println!("- {}: {}", label, "not set".dimmed()),
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cache::MemoryCache;

    #[test]
    fn debug_reports_corrupt_quotes() {
        let mut store = MemoryCache::default();
        store
            .set_value(QUOTES_KEY, serde_json::json!([{"quote": "no id"}]))
            .unwrap();
        assert!(print_debug(&store).is_err());
    }

    #[test]
    fn debug_on_empty_cache() {
        assert!(print_debug(&MemoryCache::default()).is_ok());
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
