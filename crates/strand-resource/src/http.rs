//! HTTP-backed resource fetcher.
//!
//! `http(s)://` URLs are downloaded with `reqwest`; `file://` URLs are read
//! from disk. Bodies starting with `{` are decoded as JSON, everything else as
//! a definition file (see [`crate::definition`]).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use strand_config::ResourcesConfig;

use crate::definition::parse_definition;
use crate::error::ResourceError;
use crate::{ResourceDescription, ResourceFetcher};

/// Fetches resource descriptions over HTTP or from local files.
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher using the configured user agent and request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Http` if the underlying client fails to build.
    pub fn from_config(config: &ResourcesConfig) -> Result<Self, ResourceError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http })
    }

    async fn download(&self, url: &str) -> Result<String, ResourceError> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(tokio::fs::read_to_string(path).await?);
        }
        let resp = check_response(self.http.get(url).send().await?).await?;
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ResourceDescription, ResourceError> {
        let start = Instant::now();
        let body = self.download(url).await?;
        let description = decode_body(&body)?;
        tracing::info!(
            url,
            values = description.values.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "downloaded resource"
        );
        Ok(description)
    }
}

/// Decode a resource body as JSON or as a definition file.
///
/// # Errors
///
/// Returns `ResourceError::Parse` if the body is malformed.
pub fn decode_body(body: &str) -> Result<ResourceDescription, ResourceError> {
    if body.trim_start().starts_with('{') {
        serde_json::from_str(body).map_err(|e| ResourceError::Parse(e.to_string()))
    } else {
        parse_definition(body)
    }
}

/// Map non-success responses to [`ResourceError::Api`].
pub async fn check_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ResourceError> {
    if !resp.status().is_success() {
        return Err(ResourceError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn check_response_api_error_keeps_body() {
        let resp = mock_response(404, "no such namespace");
        let err = check_response(resp).await.unwrap_err();
        match err {
            ResourceError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "no such namespace");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn check_response_success() {
        let resp = mock_response(200, "");
        assert!(check_response(resp).await.is_ok());
    }

    #[test]
    fn decode_body_accepts_json() {
        let body = r#"{"values": {"AKT1": "GRP"}, "cachable": false}"#;
        let description = decode_body(body).unwrap();
        assert!(!description.cachable);
        assert_eq!(description.values["AKT1"], "GRP");
    }

    #[test]
    fn decode_body_rejects_broken_json() {
        let err = decode_body("{\"values\": ").unwrap_err();
        assert!(matches!(err, ResourceError::Parse(_)));
    }

    #[tokio::test]
    async fn fetches_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hgnc.belns");
        std::fs::write(
            &path,
            "[Namespace]\nKeyword=HGNC\n[Processing]\nCacheableFlag=yes\n[Values]\nAKT1|GRP\n",
        )
        .unwrap();

        let fetcher = HttpFetcher::from_config(&ResourcesConfig::default()).unwrap();
        let url = format!("file://{}", path.display());
        let description = fetcher.fetch(&url).await.unwrap();
        assert_eq!(description.header.keyword.as_deref(), Some("HGNC"));
        assert_eq!(description.values["AKT1"], "GRP");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let fetcher = HttpFetcher::from_config(&ResourcesConfig::default()).unwrap();
        let err = fetcher
            .fetch("file:///definitely/not/here.belns")
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::Io(_)));
    }
}
