//! HTTP transport bound to the catalog API.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{config::AppConfig, error::FetchError};

/// Query parameter carrying the API key on every request.
const API_KEY_PARAM: &str = "key";
/// Longest slice of an error body kept in [`FetchError::Status`].
const ERROR_BODY_LIMIT: usize = 200;

/// Query parameters for a single request.
pub type Params = Vec<(&'static str, String)>;

/// Pre-configured HTTP client for the catalog API.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Transport {
    /// Build a transport for `base_url`, authenticating with `api_key`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Build a transport from loaded configuration.
    pub fn from_config(config: &AppConfig, api_key: &str) -> Result<Self, FetchError> {
        Self::new(
            config.api_base_url.clone(),
            api_key,
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Base URL every path is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a GET at `path` with `params` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, params: Params) -> Result<T, FetchError> {
        let url = self.url(path)?;
        debug!(%path, ?params, "GET");

        let response = self
            .http
            .get(url)
            .query(&[(API_KEY_PARAM, self.api_key.as_str())])
            .query(&params)
            .send()
            .await
            .map_err(|err| {
                warn!(%path, "request failed: {err}");
                err
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%path, status = status.as_u16(), "non-success response");
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body.trim().chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|err| {
            warn!(%path, "failed to decode response: {err}");
            FetchError::Decode(err)
        })
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", self.base_url, path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn attaches_api_key_and_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/games")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("key".into(), "secret".into()),
                Matcher::UrlEncoded("page".into(), "3".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "ok": true }).to_string())
            .create_async()
            .await;

        let transport = Transport::new(format!("{}/api/", server.url()), "secret", None).unwrap();
        let body: Value = transport
            .get("/games", vec![("page", "3".to_string())])
            .await
            .unwrap();

        assert_eq!(body["ok"], json!(true));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/games/999")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"detail":"Not found."}"#)
            .create_async()
            .await;

        let transport = Transport::new(server.url(), "secret", None).unwrap();
        let err = transport
            .get::<Value>("/games/999", Vec::new())
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("Not found."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/genres")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let transport = Transport::new(server.url(), "secret", None).unwrap();
        let err = transport
            .get::<Value>("/genres", Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode(_)));
        assert!(err.to_string().starts_with("failed to decode response"));
    }
}
