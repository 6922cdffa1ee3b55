//! Best-effort weather page as plain text

use anyhow::{Result, bail};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, info};

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CHARS: usize = 2500;
const TITLE: &str = "Weather Information";

/// Fetch the page and render it for the terminal; failures become a message
pub async fn report(url: &str) -> String {
    match fetch(url).await {
        Ok(text) => format!("{TITLE}\n\n{text}"),
        Err(e) => {
            error!("Weather fetch from {} failed: {:#}", url, e);
            format!("Weather service unavailable: {e:#}")
        }
    }
}

pub async fn fetch(url: &str) -> Result<String> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        bail!("unable to fetch weather data (HTTP {status})");
    }

    let body = response.text().await?;
    info!("Fetched {} bytes of weather data", body.len());
    Ok(page_text(&body))
}

/// Strip markup, collapse blank runs and cap the length
pub fn page_text(html: &str) -> String {
    static HIDDEN_REGEX: OnceLock<Regex> = OnceLock::new();
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

    let hidden_regex = HIDDEN_REGEX.get_or_init(|| {
        Regex::new(r"(?is)<(script|style|head)\b.*?</(script|style|head)\s*>")
            .expect("Failed to compile hidden-block regex")
    });
    let tag_regex = TAG_REGEX.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("Failed to compile tag regex"));

    let hidden = hidden_regex.replace_all(html, " ");
    let stripped = tag_regex.replace_all(&hidden, "\n");

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let text = decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    text.chars().take(MAX_CHARS).collect()
}
