//! Async HTTP client wrapping reqwest.
//!
//! Not a browser, just HTTP requests, used for fetching linked documents
//! and captcha images outside the rendered page. Handles redirects,
//! timeouts, retry on 5xx, and backoff on 429.

use anyhow::{bail, Result};
use std::time::Duration;

/// Response from an HTTP GET request with a textual body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// HTTP client for the capture engine.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    /// HTTP/1.1-only fallback client for sites that reject HTTP/2.
    h1_client: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client with a standard Chrome user-agent.
    pub fn new(timeout_ms: u64) -> Self {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                  AppleWebKit/537.36 (KHTML, like Gecko) \
                  Chrome/131.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(ua)
            .build()
            .unwrap_or_default();

        let h1_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(ua)
            .http1_only()
            .build()
            .unwrap_or_default();

        Self { client, h1_client }
    }

    /// GET a URL and return the textual body.
    pub async fn get(&self, url: &str, timeout_ms: u64) -> Result<HttpResponse> {
        let r = self.get_response(url, timeout_ms).await?;
        let status = r.status().as_u16();
        let final_url = r.url().to_string();
        let body = r.text().await.unwrap_or_default();

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status,
            body,
        })
    }

    /// GET a URL and return the raw body bytes.
    ///
    /// Used for document downloads. Non-2xx/3xx statuses are errors here,
    /// unlike [`get`](Self::get), because a 404 page is not a document.
    pub async fn get_bytes(&self, url: &str, timeout_ms: u64) -> Result<Vec<u8>> {
        let r = self.get_response(url, timeout_ms).await?;
        let status = r.status().as_u16();
        if status >= 400 {
            bail!("GET {url} returned status {status}");
        }
        let bytes = r.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Send a GET, falling back to HTTP/1.1 on protocol errors (some
    /// government sites sit behind front-ends that reject HTTP/2).
    async fn get_response(&self, url: &str, timeout_ms: u64) -> Result<reqwest::Response> {
        match self.get_inner(&self.client, url, timeout_ms).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                let err_str = format!("{e}");
                if err_str.contains("http2")
                    || err_str.contains("protocol")
                    || err_str.contains("connection closed")
                {
                    self.get_inner(&self.h1_client, url, timeout_ms).await
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Single GET with retry on 5xx and backoff on 429.
    async fn get_inner(
        &self,
        client: &reqwest::Client,
        url: &str,
        timeout_ms: u64,
    ) -> Result<reqwest::Response> {
        let mut retries = 0u32;
        let max_retries = 2;

        loop {
            let resp = client
                .get(url)
                .timeout(Duration::from_millis(timeout_ms))
                .send()
                .await;

            match resp {
                Ok(r) => {
                    let status = r.status().as_u16();

                    // Retry on 5xx
                    if status >= 500 && retries < max_retries {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    // Backoff on 429
                    if status == 429 && retries < max_retries {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        let delay = Duration::from_secs(retry_after.min(10));
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Ok(r);
                }
                Err(e) => {
                    if retries < max_retries {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(10000);
        let _ = client;
    }

    #[tokio::test]
    async fn test_get_bytes_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/order.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.5 fake".to_vec()))
            .mount(&server)
            .await;

        let client = HttpClient::new(5000);
        let bytes = client
            .get_bytes(&format!("{}/order.pdf", server.uri()), 5000)
            .await
            .expect("fetch failed");
        assert_eq!(bytes, b"%PDF-1.5 fake");
    }

    #[tokio::test]
    async fn test_get_bytes_rejects_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new(5000);
        let result = client
            .get_bytes(&format!("{}/missing.pdf", server.uri()), 5000)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_retries_on_server_error() {
        let server = MockServer::start().await;
        // First response is a 500; the retry should see the 200.
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = HttpClient::new(5000);
        let resp = client
            .get(&format!("{}/flaky", server.uri()), 5000)
            .await
            .expect("request failed");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "ok");
    }
}
