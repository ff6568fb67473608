use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use tracing::{info, warn};

use crate::cache::{CacheStore, SORTED_KEY};
use crate::filter::order::parse_date;
use crate::filter::subjects::{build_index, SubjectIndex};
use crate::quote::MatchedQuote;

const DUTCH_MONTHS: [&str; 12] = [
    "januari", "februari", "maart", "april", "mei", "juni", "juli", "augustus", "september",
    "oktober", "november", "december",
];

const PAGE_STYLE: &str = "@page { size: A5; margin: 0; }
body { margin: 0; font-family: Georgia, serif; }
main { box-sizing: border-box; height: 210mm; padding: 24mm 18mm; display: flex; flex-direction: column; justify-content: center; }
[data-content=\"quote\"] { font-size: 18pt; line-height: 1.4; }
[data-content=\"author\"] { margin-top: 8mm; font-style: italic; }
[data-content=\"source\"] { margin-top: 2mm; font-size: 9pt; color: #666; }
dl { columns: 2; font-size: 10pt; } dt { font-weight: bold; } dd { margin: 0 0 2mm 0; }";

/// Turns one HTML file into one PDF file.
#[allow(async_fn_in_trait)]
pub trait PdfRenderer {
    async fn render(&self, html: &Path, pdf: &Path) -> Result<()>;
}

/// Headless Chromium/Chrome driven through its `--print-to-pdf` switch.
pub struct BrowserRenderer {
    pub binary: String,
}

impl PdfRenderer for BrowserRenderer {
    async fn render(&self, html: &Path, pdf: &Path) -> Result<()> {
        let html = html
            .canonicalize()
            .with_context(|| format!("Missing page {:?}", html))?;
        let output = tokio::process::Command::new(&self.binary)
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", pdf.display()))
            .arg(format!("file://{}", html.display()))
            .output()
            .await
            .with_context(|| format!("Failed to launch browser `{}`", self.binary))?;

        if !output.status.success() {
            bail!(
                "Browser exited with {} while rendering {:?}: {}",
                output.status,
                pdf,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    pub limit: Option<usize>,
    pub single: bool,
}

impl BundleOptions {
    /// `--single` wins over `--limit`; a limit of 0 means everything.
    pub fn quote_limit(&self) -> Option<usize> {
        if self.single {
            Some(1)
        } else {
            self.limit.filter(|n| *n > 0)
        }
    }
}

pub struct BundleStats {
    pub pages: usize,
    pub index: Option<PathBuf>,
}

pub enum BundleOutcome {
    NoSourceData,
    Rendered(BundleStats),
}

/// Render the sorted unique quotes to `quote-<id>.pdf` files plus an `index.pdf` appendix.
pub async fn run<R: PdfRenderer>(
    store: &impl CacheStore,
    renderer: &R,
    output_dir: &Path,
    options: &BundleOptions,
) -> Result<BundleOutcome> {
    let Some(quotes) = store.get::<Vec<MatchedQuote>>(SORTED_KEY)? else {
        return Ok(BundleOutcome::NoSourceData);
    };

    let wanted = match options.quote_limit() {
        Some(n) => &quotes[..n.min(quotes.len())],
        None => &quotes[..],
    };

    let pages_dir = output_dir.join("pages");
    fs::create_dir_all(&pages_dir)
        .with_context(|| format!("Failed to create {:?}", pages_dir))?;

    info!("Rendering {} quotes...", wanted.len());
    let pb = ProgressBar::new(wanted.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    for quote in wanted {
        let html_path = pages_dir.join(format!("quote-{}.html", quote.id()));
        fs::write(&html_path, quote_page(quote))
            .with_context(|| format!("Failed to write {:?}", html_path))?;
        renderer
            .render(&html_path, &output_dir.join(format!("quote-{}.pdf", quote.id())))
            .await?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    let index = match build_index(wanted) {
        Some(index) => {
            let html_path = pages_dir.join("index.html");
            let pdf_path = output_dir.join("index.pdf");
            fs::write(&html_path, index_page(&index))
                .with_context(|| format!("Failed to write {:?}", html_path))?;
            renderer.render(&html_path, &pdf_path).await?;
            Some(pdf_path)
        }
        None => {
            info!("No subjects found, skipping index page");
            None
        }
    };

    Ok(BundleOutcome::Rendered(BundleStats {
        pages: wanted.len(),
        index,
    }))
}

/// `1 januari 2020`, or the raw value when it does not parse.
pub fn dutch_long_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(dt) => format!(
            "{} {} {}",
            dt.day(),
            DUTCH_MONTHS[dt.month0() as usize],
            dt.year()
        ),
        None => {
            warn!(date = raw, "unreadable date on page");
            raw.to_string()
        }
    }
}

pub fn quote_page(quote: &MatchedQuote) -> String {
    let lines = quote.formatted.lines().map(escape_html).join("<br>\n");
    let author = if quote.subjects.is_empty() {
        escape_html(&quote.record.author)
    } else {
        escape_html(&quote.subjects.join(", "))
    };
    document(
        &format!("Quote {}", escape_html(quote.id())),
        &format!(
            "<main>\n<blockquote data-content=\"quote\">{}</blockquote>\n<p data-content=\"author\">{}</p>\n<p data-content=\"source\">{}</p>\n</main>",
            lines,
            author,
            escape_html(&dutch_long_date(&quote.record.date)),
        ),
    )
}

pub fn index_page(index: &SubjectIndex) -> String {
    let entries = index
        .iter()
        .map(|(subject, pages)| {
            format!(
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(subject),
                pages.iter().join(", ")
            )
        })
        .join("\n");
    document("Index", &format!("<main>\n<h1>Index</h1>\n<dl>\n{}\n</dl>\n</main>", entries))
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"nl\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        title, PAGE_STYLE, body
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::filter::{process_batch, FilterOptions};
    use crate::quote::QuoteRecord;

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    impl PdfRenderer for RecordingRenderer {
        async fn render(&self, html: &Path, pdf: &Path) -> Result<()> {
            assert!(html.exists(), "page must be written before rendering");
            fs::write(pdf, b"%PDF-fake")?;
            self.calls
                .lock()
                .unwrap()
                .push((html.to_path_buf(), pdf.to_path_buf()));
            Ok(())
        }
    }

    fn store_with_quotes() -> MemoryCache {
        let input = vec![
            QuoteRecord {
                id: "1".into(),
                quote: "\"bier <3\" - Jane".into(),
                author: "Jane Doe".into(),
                date: "2020-01-01".into(),
                verified: true,
            },
            QuoteRecord {
                id: "2".into(),
                quote: "\"koffie\" - Bob".into(),
                author: "Bob".into(),
                date: "2020-03-15T12:00:00Z".into(),
                verified: false,
            },
        ];
        let p = process_batch(&input, &FilterOptions::default());
        let mut store = MemoryCache::default();
        store.set(SORTED_KEY, &p.unique).unwrap();
        store
    }

    #[test]
    fn limit_rules() {
        assert_eq!(BundleOptions { limit: Some(3), single: true }.quote_limit(), Some(1));
        assert_eq!(BundleOptions { limit: Some(0), single: false }.quote_limit(), None);
        assert_eq!(BundleOptions { limit: Some(5), single: false }.quote_limit(), Some(5));
        assert_eq!(BundleOptions::default().quote_limit(), None);
    }

    #[test]
    fn dutch_dates() {
        assert_eq!(dutch_long_date("2020-01-01"), "1 januari 2020");
        assert_eq!(dutch_long_date("2023-10-19T08:00:00Z"), "19 oktober 2023");
        assert_eq!(dutch_long_date("soon"), "soon");
    }

    #[test]
    fn page_escapes_and_fills_slots() {
        let store = store_with_quotes();
        let quotes: Vec<MatchedQuote> = store.get(SORTED_KEY).unwrap().unwrap();
        let html = quote_page(&quotes[0]);
        assert!(html.contains("“Bier &lt;3” – Jane"));
        assert!(html.contains("<p data-content=\"author\">Jane</p>"));
        assert!(html.contains("1 januari 2020"));
        assert!(html.contains("size: A5"));
    }

    #[test]
    fn index_lists_pages() {
        let mut index = SubjectIndex::new();
        index.insert("Bob".into(), vec![2, 5]);
        let html = index_page(&index);
        assert!(html.contains("<dt>Bob</dt><dd>2, 5</dd>"));
    }

    #[tokio::test]
    async fn renders_every_quote_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let outcome = run(&store_with_quotes(), &renderer, dir.path(), &BundleOptions::default())
            .await
            .unwrap();

        let BundleOutcome::Rendered(stats) = outcome else {
            panic!("expected rendered outcome");
        };
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.index.as_deref(), Some(dir.path().join("index.pdf").as_path()));
        assert!(dir.path().join("quote-1.pdf").exists());
        assert!(dir.path().join("quote-2.pdf").exists());
        assert_eq!(renderer.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn single_renders_first_only() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RecordingRenderer::default();
        let options = BundleOptions { limit: None, single: true };
        let outcome = run(&store_with_quotes(), &renderer, dir.path(), &options)
            .await
            .unwrap();

        let BundleOutcome::Rendered(stats) = outcome else {
            panic!("expected rendered outcome");
        };
        assert_eq!(stats.pages, 1);
        assert!(dir.path().join("quote-1.pdf").exists());
        assert!(!dir.path().join("quote-2.pdf").exists());
    }

    #[tokio::test]
    async fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(
            &MemoryCache::default(),
            &RecordingRenderer::default(),
            dir.path(),
            &BundleOptions::default(),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, BundleOutcome::NoSourceData));
    }
}
