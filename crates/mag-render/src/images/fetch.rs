//! Remote image fetching

use futures::future::BoxFuture;
use std::time::Duration;

/// Bytes and declared content type of a fetched resource
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Fetches remote image bytes. Errors are plain messages: a failed fetch is
/// recorded against the image and never aborts the batch.
pub trait ImageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Fetched, String>>;
}

/// HTTP fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::RenderError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Fetched, String>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| format!("HTTP GET failed: {}", e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(format!("HTTP {}", status));
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());
            let bytes = response
                .bytes()
                .await
                .map_err(|e| format!("Failed to read response body: {}", e))?;

            Ok(Fetched {
                bytes: bytes.to_vec(),
                content_type,
            })
        })
    }
}

/// Fetcher that refuses every request; used when network access is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl ImageFetcher for OfflineFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Fetched, String>> {
        Box::pin(async move { Err(format!("network access disabled for {url}")) })
    }
}

/// Route a cross-origin source through the same-origin proxy endpoint
pub fn proxied_url(endpoint: &str, source: &str) -> Result<String, String> {
    let mut url = url::Url::parse(endpoint).map_err(|e| format!("invalid proxy endpoint: {e}"))?;
    url.query_pairs_mut().append_pair("url", source);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_url_encodes_the_source() {
        let url = proxied_url(
            "https://editor.example.com/api/image-proxy",
            "https://storage.googleapis.com/bucket/a b.jpg?alt=media",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://editor.example.com/api/image-proxy?url=https%3A%2F%2Fstorage.googleapis.com%2Fbucket%2Fa+b.jpg%3Falt%3Dmedia"
        );
    }
}
