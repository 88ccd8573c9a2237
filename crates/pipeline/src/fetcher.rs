//! Website fetching for the ingestion stage.
//!
//! The stage depends on [`PageFetcher`]; [`HttpPageFetcher`] is the default
//! implementation. HTML is reduced to plain text with a handful of regexes:
//! good enough to feed a brand analysis, not a general-purpose parser.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::error::PipelineError;

/// Paths tried on the primary URL's origin, after the primary URL itself.
pub const CANDIDATE_PATHS: [&str; 6] = ["/", "/pricing", "/about", "/about-us", "/faq", "/features"];

/// Pages with less extracted text than this are dropped.
pub const MIN_PAGE_CHARS: usize = 80;

/// Extracted text is truncated to this many characters.
pub const MAX_PAGE_CHARS: usize = 20_000;

/// At most this many pages are kept per ingestion.
pub const MAX_PAGES: usize = 4;

const FETCH_TIMEOUT: Duration = Duration::from_secs(18);

const USER_AGENT: &str = "adforge-ingestion/1.0";

/// One page of site text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
}

impl FetchedPage {
    /// Lowercase hex SHA-256 of the page text.
    pub fn content_sha(&self) -> String {
        sha256_hex(&self.content)
    }
}

pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Source of brand pages for a primary URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch up to [`MAX_PAGES`] usable pages. An empty result is not an
    /// error here; the stage decides what that means.
    async fn fetch_pages(&self, primary_url: &str) -> Result<Vec<FetchedPage>, PipelineError>;
}

/// Fetches candidate pages over HTTP, ignoring individual failures.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_html(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_pages(&self, primary_url: &str) -> Result<Vec<FetchedPage>, PipelineError> {
        let mut pages = Vec::new();

        for url in candidate_urls(primary_url)? {
            let html = match self.fetch_html(&url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Skipping page");
                    continue;
                }
            };
            if let Some(page) = page_from_html(&url, &html) {
                pages.push(page);
            }
            if pages.len() >= MAX_PAGES {
                break;
            }
        }

        tracing::info!(primary_url, pages = pages.len(), "Fetched brand pages");
        Ok(pages)
    }
}

/// Primary URL followed by well-known pages on its origin, de-duplicated in
/// order.
pub fn candidate_urls(primary_url: &str) -> Result<Vec<String>, PipelineError> {
    let primary = Url::parse(primary_url)
        .map_err(|e| PipelineError::failed(format!("invalid_url: {e}")))?;

    let mut urls: Vec<String> = Vec::with_capacity(CANDIDATE_PATHS.len() + 1);
    let mut push = |url: Url| {
        let s = url.to_string();
        if !urls.contains(&s) {
            urls.push(s);
        }
    };

    push(primary.clone());
    for path in CANDIDATE_PATHS {
        if let Ok(url) = primary.join(path) {
            push(url);
        }
    }
    Ok(urls)
}

/// Build a page from raw HTML, or `None` if it has too little text.
pub fn page_from_html(url: &str, html: &str) -> Option<FetchedPage> {
    let (title, content) = html_to_text(html);
    if content.chars().count() < MIN_PAGE_CHARS {
        return None;
    }
    let content: String = content.chars().take(MAX_PAGE_CHARS).collect();
    Some(FetchedPage {
        url: url.to_string(),
        title,
        content,
    })
}

static STRIP_BLOCKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|svg)\b[^>]*>.*?</(script|style|svg)>").expect("valid regex")
});

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<meta\s+[^>]*(?:name|property)\s*=\s*["'](description|og:description|og:title|twitter:description|twitter:title)["'][^>]*content\s*=\s*["']([^"']*)["']"#,
    )
    .expect("valid regex")
});

static MAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*)</main>").expect("valid regex"));

static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body>").expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid regex"));

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Reduce an HTML document to `(title, text)`.
///
/// The text is the title, social/meta descriptions and the `<main>` (or
/// `<body>`) text, whitespace-normalized.
pub fn html_to_text(html: &str) -> (Option<String>, String) {
    let cleaned = STRIP_BLOCKS_RE.replace_all(html, " ");

    let title = TITLE_RE
        .captures(&cleaned)
        .map(|c| normalize(&decode_entities(&c[1])))
        .filter(|t| !t.is_empty());

    let mut parts: Vec<String> = Vec::new();
    if let Some(t) = &title {
        parts.push(t.clone());
    }
    for caps in META_RE.captures_iter(&cleaned) {
        let value = normalize(&decode_entities(&caps[2]));
        if !value.is_empty() && !parts.contains(&value) {
            parts.push(value);
        }
    }

    let root = MAIN_RE
        .captures(&cleaned)
        .or_else(|| BODY_RE.captures(&cleaned))
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| cleaned.to_string());
    let body = normalize(&decode_entities(&TAG_RE.replace_all(&root, " ")));
    if !body.is_empty() {
        parts.push(body);
    }

    (title, normalize(&parts.join(" ")))
}

fn normalize(text: &str) -> String {
    WS_RE.replace_all(text, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
