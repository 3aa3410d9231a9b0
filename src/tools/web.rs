//! Web fetch tool - one GET, scrubbed down to plain text

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::Tool;
use crate::error::Error;
use crate::Result;

/// Name the fetch tool is registered and whitelisted under.
pub const FETCH_TOOL: &str = "web.fetch";

/// Request timeout for one fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Identifying user agent sent with every fetch.
pub const USER_AGENT: &str = "agent-starter/0.1 (+https://example.invalid)";

/// Maximum characters returned from a page.
pub const MAX_FETCH_CHARS: usize = 8000;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script.*?>.*?</script>").expect("static pattern compiles"));
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style.*?>.*?</style>").expect("static pattern compiles"));
static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<[^>]+>").expect("static pattern compiles"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static pattern compiles"));

/// Arguments accepted by the fetch tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchArgs {
    pub url: String,
}

impl FetchArgs {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Only absolute http(s) URLs are fetched.
    pub fn validate(&self) -> Result<()> {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "URL scheme must be http:// or https://, got {:?}",
                self.url
            )))
        }
    }
}

/// Fetch web page content as plain text
#[derive(Clone)]
pub struct WebFetchTool {
    client: Client,
}

impl WebFetchTool {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// GET the page and reduce it to at most [`MAX_FETCH_CHARS`] characters of text.
    pub async fn fetch(&self, args: &FetchArgs) -> Result<String> {
        args.validate()?;

        debug!("Fetching {}", args.url);
        let response = self.client.get(&args.url).send().await?.error_for_status()?;
        let html = response.text().await?;

        let text = truncate_chars(&html_to_text(&html), MAX_FETCH_CHARS);
        debug!("Fetched {}: {} chars of text", args.url, text.chars().count());
        Ok(text)
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str { FETCH_TOOL }
    fn description(&self) -> &str { "Fetch a URL over HTTP and return its visible text" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http:// or https:// URL to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, params: Value) -> Result<String> {
        let args: FetchArgs = serde_json::from_value(params)
            .map_err(|e| Error::Validation(format!("Invalid fetch arguments: {}", e)))?;
        self.fetch(&args).await
    }
}

/// Strip script blocks, style blocks, then every remaining tag, and collapse
/// whitespace. Each pass assumes the previous one already ran.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(html, " ");
    let text = STYLE_BLOCK.replace_all(&text, " ");
    let text = ANY_TAG.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// First `max` characters of `text` (characters, not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
