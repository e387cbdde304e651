use crate::domain::ports::PageFetcher;
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("brokerdesk/", env!("CARGO_PKG_VERSION"));

static INVISIBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|svg|head)\b.*?</(script|style|noscript|svg|head)\s*>|<!--.*?-->")
        .expect("valid invisible-block regex")
});
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(p|div|br|li|ul|ol|h[1-6]|tr|section|article|header|footer)\b[^>]*>")
        .expect("valid block tag regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Fetches pages over HTTP(S) and reduces the HTML to plain text.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PortalError::ValidationError(format!(
                "'{url}' is not an http(s) URL"
            )));
        }
        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        let text = html_to_text(&html);
        debug!(url, html = html.len(), text = text.len(), "Fetched page");
        Ok(text)
    }
}

/// Drops scripts, styles and markup, keeping one line per block element.
pub fn html_to_text(html: &str) -> String {
    let visible = INVISIBLE.replace_all(html, " ");
    let blocks = BLOCK_TAG.replace_all(&visible, "\n");
    let plain = TAG.replace_all(&blocks, " ");
    decode_entities(&plain)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&aacute;", "á")
        .replace("&eacute;", "é")
        .replace("&iacute;", "í")
        .replace("&oacute;", "ó")
        .replace("&uacute;", "ú")
        .replace("&ntilde;", "ñ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        let html = r#"<html><head><title>x</title><style>p { color: red }</style></head>
            <body><!-- menu --><h1>Seguro de Auto</h1>
            <script>track("visit");</script>
            <p>Cobertura amplia &amp; asistencia vial.</p><ul><li>Robo&nbsp;total</li><li>Da&ntilde;os</li></ul>
            </body></html>"#;

        assert_eq!(
            html_to_text(html),
            "Seguro de Auto\nCobertura amplia & asistencia vial.\nRobo total\nDaños"
        );
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let result = HttpFetcher::new().fetch("file:///etc/passwd").await;
        assert!(matches!(result, Err(PortalError::ValidationError(_))));
    }
}
