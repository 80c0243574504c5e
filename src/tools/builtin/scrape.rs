//! Web scraper: fetches a page and returns the leading body text.
//!
//! Any fetch, status, or body failure is reported as `ToolError::Scrape`
//! carrying a `ScrapeFailure` kind. Bodies are parsed as HTML regardless of
//! content type.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::{Captures, Regex};
use tracing::{info, warn};

use crate::tools::tool::{ScrapeFailure, Tool, ToolError, ToolOutput, require_str};

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<head\b(?:"[^"]*"|'[^']*'|[^"'>])*>.*?</head\s*>"#).unwrap()
});
static BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<body\b(?:"[^"]*"|'[^']*'|[^"'>])*>(.*?)(?:</body\s*>|\z)"#).unwrap()
});
/// A tag starts with `<` followed by a letter, `/`, `!` or `?`; a `<` before
/// anything else is text. Quoted attribute values may contain `>`.
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<[A-Za-z/!?](?:"[^"]*"|'[^']*'|[^"'>])*>"#).unwrap()
});
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap());

pub struct ScrapeTool {
    client: reqwest::Client,
    max_chars: usize,
}

impl ScrapeTool {
    /// Build a scraper. `timeout` of `None` keeps the HTTP client default.
    pub fn new(max_chars: usize, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, max_chars))
    }

    pub fn with_client(client: reqwest::Client, max_chars: usize) -> Self {
        Self { client, max_chars }
    }

    /// Fetch `url` and return at most `max_chars` characters of its body text.
    pub async fn scrape(&self, url: &str) -> Result<String, ToolError> {
        match self.fetch(url).await {
            Ok(text) => Ok(text),
            Err(failure) => {
                warn!(url = url, error = %failure, "Error scraping website");
                Err(ToolError::Scrape(failure))
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeFailure> {
        let parsed =
            reqwest::Url::parse(url.trim()).map_err(|e| ScrapeFailure::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScrapeFailure::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| ScrapeFailure::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeFailure::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScrapeFailure::Body(e.to_string()))?;

        let text: String = extract_body_text(&body).chars().take(self.max_chars).collect();
        info!(
            url = url,
            status = status.as_u16(),
            chars = text.chars().count(),
            "Scraped website"
        );
        Ok(text)
    }
}

#[async_trait]
impl Tool for ScrapeTool {
    fn name(&self) -> &str {
        "scrape"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return the beginning of its visible text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http(s) URL of the page"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let url = require_str(&params, "url")?;
        let start = Instant::now();
        let text = self.scrape(url).await?;
        Ok(ToolOutput::text(text, start.elapsed()))
    }
}

/// Text content of the document body: comments, scripts and styles dropped,
/// entities decoded, whitespace collapsed.
pub fn extract_body_text(html: &str) -> String {
    let cleaned = COMMENT.replace_all(html, " ");
    let cleaned = SCRIPT.replace_all(&cleaned, " ");
    let cleaned = STYLE.replace_all(&cleaned, " ");

    let body = match BODY.captures(&cleaned) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).to_string(),
        None => HEAD.replace_all(&cleaned, " ").into_owned(),
    };

    let text = TAG.replace_all(&body, " ");
    let text = decode_entities(&text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "copy" => '©',
        "reg" => '®',
        "mdash" => '—',
        "ndash" => '–',
        "hellip" => '…',
        "rsquo" => '’',
        "lsquo" => '‘',
        "rdquo" => '”',
        "ldquo" => '“',
        _ => return None,
    })
}
