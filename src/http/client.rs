//! Dashboard API client.
//!
//! Every verb issues exactly one request. Retrying is opt-in per call site
//! through [`DashboardClient::with_retry`], since only some operations (the
//! writes) need to ride out the API's transient 4xx answers.

use std::future::Future;

use anyhow::Result;
use log::debug;
use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};

use super::error::ApiError;
use crate::config::ProviderConfig;
use crate::retry::{Cancellation, RetryConfig, with_retry};

/// HTTP client bound to one Dashboard API base URL.
#[derive(Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl DashboardClient {
    /// Wraps an already configured reqwest Client.
    pub fn new(client: Client, base_url: impl Into<String>, retry: RetryConfig) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            retry,
        }
    }

    /// Builds a client carrying the API key, user agent and timeout from
    /// `config`.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", config.api_key))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        debug!(
            "Dashboard client configured for {} (max retries {}, delay {}ms)",
            config.base_url,
            config.max_retries,
            config.retry_delay.as_millis()
        );

        Ok(Self::new(client, &config.base_url, config.retry_config()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Absolute URL for an API path such as `/networks/N_1`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("GET {}...", url);

        let body = self.send(self.client.get(&url)).await?;
        decode(&body)
    }

    #[tracing::instrument(skip(self, body))]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}...", url);

        let body = self.send(self.client.post(&url).json(body)).await?;
        decode(&body)
    }

    #[tracing::instrument(skip(self, body))]
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("PUT {}...", url);

        let body = self.send(self.client.put(&url).json(body)).await?;
        decode(&body)
    }

    /// DELETE ignores whatever body the server answers with.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        debug!("DELETE {}...", url);

        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    /// Runs `operation` under this client's retry configuration.
    pub async fn with_retry<T, F, Fut>(
        &self,
        cancel: &Cancellation,
        operation_name: &str,
        operation: F,
    ) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        with_retry(cancel, &self.retry, operation_name, operation).await
    }

    /// Sends the request and returns the body of a 2xx answer.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            debug!("HTTP {} answered: {}", status.as_u16(), body);
            return Err(ApiError::status(status, body));
        }

        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::time::Duration;

    fn client_for(server: &mockito::Server, retry: RetryConfig) -> DashboardClient {
        DashboardClient::new(Client::new(), server.url(), retry)
    }

    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Network {
        id: String,
        name: String,
    }

    #[test]
    fn test_url_joins_with_single_slash() {
        let client = DashboardClient::new(
            Client::new(),
            "https://api.meraki.com/api/v1/",
            RetryConfig::none(),
        );

        assert_eq!(client.base_url(), "https://api.meraki.com/api/v1");
        assert_eq!(
            client.url("/networks/N_1"),
            "https://api.meraki.com/api/v1/networks/N_1"
        );
        assert_eq!(
            client.url("networks/N_1"),
            "https://api.meraki.com/api/v1/networks/N_1"
        );
    }

    #[tokio::test]
    async fn test_get_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/networks/N_1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "N_1", "name": "Branch"}"#)
            .create_async()
            .await;

        let client = client_for(&server, RetryConfig::none());
        let network: Network = client.get("/networks/N_1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            network,
            Network {
                id: "N_1".into(),
                name: "Branch".into()
            }
        );
    }

    #[tokio::test]
    async fn test_get_error_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/networks/N_404")
            .with_status(404)
            .with_body(r#"{"errors":["Network not found"]}"#)
            .create_async()
            .await;

        let client = client_for(&server, RetryConfig::none());
        let err = client
            .get::<serde_json::Value>("/networks/N_404")
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.body(), Some(r#"{"errors":["Network not found"]}"#));
    }

    #[tokio::test]
    async fn test_get_undecodable_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/networks/N_1")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server, RetryConfig::none());
        let err = client.get::<Network>("/networks/N_1").await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/organizations/1/networks")
            .match_body(Matcher::Json(json!({"name": "Branch"})))
            .with_status(201)
            .with_body(r#"{"id": "N_2", "name": "Branch"}"#)
            .create_async()
            .await;

        let client = client_for(&server, RetryConfig::none());
        let network: Network = client
            .post("/organizations/1/networks", &json!({"name": "Branch"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(network.id, "N_2");
    }

    #[tokio::test]
    async fn test_put_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/networks/N_1")
            .match_body(Matcher::Json(json!({"name": "Renamed"})))
            .with_status(200)
            .with_body(r#"{"id": "N_1", "name": "Renamed"}"#)
            .create_async()
            .await;

        let client = client_for(&server, RetryConfig::none());
        let network: Network = client
            .put("/networks/N_1", &json!({"name": "Renamed"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(network.name, "Renamed");
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/networks/N_1")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server, RetryConfig::none());
        client.delete("/networks/N_1").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_error() {
        let client = DashboardClient::new(Client::new(), "http://127.0.0.1:1", RetryConfig::none());

        let err = client.get::<Network>("/networks").await.unwrap_err();

        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_with_retry_reissues_request_on_client_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/networks/N_1/appliance/vlans")
            .with_status(400)
            .with_body(r#"{"errors":["duplicate key value"]}"#)
            .expect(3)
            .create_async()
            .await;

        let client = client_for(&server, RetryConfig::new(2, Duration::from_millis(1)));
        let cancel = Cancellation::never();
        let payload = json!({"id": "10"});
        let result: Result<serde_json::Value, _> = client
            .with_retry(&cancel, "Create VLAN", || {
                client.post("/networks/N_1/appliance/vlans", &payload)
            })
            .await;

        mock.assert_async().await;
        assert_eq!(result.unwrap_err().status_code(), Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn test_with_retry_does_not_reissue_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/networks/N_1/syslogServers")
            .with_status(502)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, RetryConfig::new(3, Duration::from_millis(1)));
        let cancel = Cancellation::never();
        let payload = json!({"servers": []});
        let result: Result<serde_json::Value, _> = client
            .with_retry(&cancel, "Update syslog servers", || {
                client.put("/networks/N_1/syslogServers", &payload)
            })
            .await;

        mock.assert_async().await;
        assert_eq!(result.unwrap_err().status_code(), Some(StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn test_from_config_sends_bearer_token_and_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations")
            .match_header("Authorization", "Bearer secret-key")
            .match_header("User-Agent", "meraki-test/1.0")
            .match_header("Accept", "application/json")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let config = ProviderConfig {
            api_key: "secret-key".into(),
            base_url: server.url(),
            user_agent: "meraki-test/1.0".into(),
            max_retries: 0,
            retry_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
        };
        let client = DashboardClient::from_config(&config).unwrap();
        let organizations: Vec<serde_json::Value> = client.get("/organizations").await.unwrap();

        mock.assert_async().await;
        assert!(organizations.is_empty());
        assert_eq!(client.retry_config(), &RetryConfig::new(0, Duration::ZERO));
    }
}
