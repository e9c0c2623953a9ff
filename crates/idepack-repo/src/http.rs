//! HTTP client shared by the downloader and the registry updater

use std::time::Duration;

use idepack_core::Settings;

use crate::error::{RepoError, Result, network_error};

/// Thin wrapper over `reqwest::Client` that treats non-2xx as failure
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| RepoError::NetworkFailure {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// GET `url`; any transport error or non-success status is a `NetworkFailure`
    pub async fn get(&self, url: &str) -> Result<reqwest::Response> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::NetworkFailure {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        Ok(response)
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(|e| network_error(url, e))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_non_success_is_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new(&Settings::default()).unwrap();
        let url = format!("{}/missing", server.uri());
        let err = client.get(&url).await.unwrap_err();

        match err {
            RepoError::NetworkFailure { url: failed, message } => {
                assert_eq!(failed, url);
                assert_eq!(message, "HTTP 404");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_get_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
            .mount(&server)
            .await;

        let client = HttpClient::new(&Settings::default()).unwrap();
        let body = client
            .get_bytes(&format!("{}/data", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, b"payload");
    }
}
