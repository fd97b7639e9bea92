use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::error::ThreeDsError;

/// A simple wrapper on an HTTP client for making requests. Sets sensible
/// defaults such as timeouts, user-agent & ensuring HTTPS. One instance is
/// shared by every network-calling component of the engine; requests are
/// never retried here — retry policy belongs to the caller.
pub(crate) struct Request {
    client: reqwest::Client,
    timeout: Duration,
}

impl Request {
    pub(crate) fn new() -> Self {
        let client = reqwest::Client::new();
        let timeout = Duration::from_secs(5);
        Self { client, timeout }
    }

    /// Creates a request builder with defaults applied.
    fn req(&self, method: Method, url: &str) -> RequestBuilder {
        #[cfg(not(test))]
        assert!(url.starts_with("https"));

        self.client
            .request(method, url)
            .timeout(self.timeout)
            .header(
                "User-Agent",
                format!("threedskit-core/{}", env!("CARGO_PKG_VERSION")),
            )
    }

    /// Creates a GET request builder with defaults applied.
    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.req(Method::GET, url)
    }

    /// Creates a POST request builder with defaults applied.
    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.req(Method::POST, url)
    }

    /// Creates a PUT request builder with defaults applied.
    pub(crate) fn put(&self, url: &str) -> RequestBuilder {
        self.req(Method::PUT, url)
    }

    /// Sends a request built by `get`/`post`/`put` and decodes the JSON
    /// response body.
    ///
    /// A non-2xx status fails with [`ThreeDsError::Service`], transport
    /// failures with [`ThreeDsError::Network`] and undecodable bodies with
    /// [`ThreeDsError::Serialization`].
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request_builder: RequestBuilder,
    ) -> Result<T, ThreeDsError> {
        let (client, request) = request_builder.build_split();
        let request = request.map_err(|err| ThreeDsError::Network {
            url: err
                .url()
                .map_or_else(|| "<unknown>".to_owned(), ToString::to_string),
            error: format!("request build failed: {err}"),
        })?;
        let url = request.url().to_string();

        let response =
            client
                .execute(request)
                .await
                .map_err(|err| ThreeDsError::Network {
                    url: url.clone(),
                    error: err.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThreeDsError::Service {
                status: status.as_u16(),
            });
        }

        let response_text =
            response
                .text()
                .await
                .map_err(|err| ThreeDsError::Network {
                    url: url.clone(),
                    error: format!("failed to read response body: {err}"),
                })?;

        serde_json::from_str::<T>(&response_text).map_err(|parse_err| {
            // Only the first 20 characters of the body to avoid logging something sensitive
            ThreeDsError::Serialization {
                detail: format!(
                    "failed to parse response from {url} with status {status}: {parse_err}, received: {}",
                    response_text.chars().take(20).collect::<String>()
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize, PartialEq, Eq)]
    struct Payload {
        value: String,
    }

    #[tokio::test]
    async fn test_send_json_decodes_success() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/payload")
            .with_status(200)
            .with_body(r#"{"value":"ok"}"#)
            .create_async()
            .await;

        let request = Request::new();
        let payload: Payload = request
            .send_json(request.get(&format!("{}/payload", server.url())))
            .await
            .unwrap();

        drop(server);

        assert_eq!(
            payload,
            Payload {
                value: "ok".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_send_json_surfaces_status() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/payload")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let request = Request::new();
        let result: Result<Payload, _> = request
            .send_json(request.get(&format!("{}/payload", server.url())))
            .await;

        drop(server);

        assert!(
            matches!(result, Err(ThreeDsError::Service { status: 502 })),
            "expected Service error, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_send_json_rejects_malformed_body() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/payload")
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let request = Request::new();
        let result: Result<Payload, _> = request
            .send_json(request.get(&format!("{}/payload", server.url())))
            .await;

        drop(server);

        match result {
            Err(ThreeDsError::Serialization { detail }) => {
                assert!(detail.contains("with status 200"));
                assert!(detail.contains("not json at all"));
            }
            other => panic!("expected Serialization error, got: {other:?}"),
        }
    }
}
