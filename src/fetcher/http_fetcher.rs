use async_trait::async_trait;
use reqwest::Client;

use crate::app::{FreshetError, Result};
use crate::config::FetchConfig;
use crate::domain::FetchOptions;
use crate::fetcher::Fetcher;

/// reqwest-backed fetcher.
///
/// Holds one verifying client and one that accepts invalid certificates for
/// sources with `tls_verify = false`. Dropping the fetcher releases both
/// connection pools.
pub struct HttpFetcher {
    client: Client,
    insecure_client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Self::builder(config)
            .build()
            .map_err(|e| FreshetError::Other(format!("Failed to build HTTP client: {}", e)))?;
        let insecure_client = Self::builder(config)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| FreshetError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            insecure_client,
        })
    }

    fn builder(config: &FetchConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.clone())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Vec<u8>> {
        let client = if options.tls_verify {
            &self.client
        } else {
            &self.insecure_client
        };

        let mut request = client.request(options.method.into(), url);
        if let Some(payload) = &options.payload {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FreshetError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FreshetError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FreshetError::from_reqwest(url, e))?;

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HttpMethod;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(timeout_secs: u64) -> HttpFetcher {
        HttpFetcher::new(&FetchConfig {
            timeout_secs,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href='/x'>x</a>"))
            .mount(&server)
            .await;

        let body = fetcher(5)
            .fetch(&format!("{}/news", server.uri()), &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(body, b"<a href='/x'>x</a>");
    }

    #[tokio::test]
    async fn test_post_sends_json_payload() {
        let server = MockServer::start().await;
        let payload = serde_json::json!({"page": 1, "category": "notices"});
        Mock::given(method("POST"))
            .and(path("/api/list"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let options = FetchOptions {
            method: HttpMethod::Post,
            tls_verify: true,
            payload: Some(payload),
        };
        let body = fetcher(5)
            .fetch(&format!("{}/api/list", server.uri()), &options)
            .await
            .unwrap();

        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_error_status_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetcher(5)
            .fetch(&server.uri(), &FetchOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert!(matches!(err, FreshetError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let err = fetcher(1)
            .fetch(&server.uri(), &FetchOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, FreshetError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_failure() {
        let err = fetcher(2)
            .fetch("http://127.0.0.1:9/", &FetchOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_transport());
    }
}
