//! Core HTTP client for the Gerrit REST API

use async_trait::async_trait;
use chrono::Local;
use compact_str::{CompactString, format_compact};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument, warn};

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
};

/// Fetches raw response bodies from the review server
///
/// Implementations must be `Send + Sync` so that both queries of a poll
/// cycle can be in flight at the same time.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// GET `url` and return the body of a successful response
    async fn get(&self, url: &str) -> Result<String>;
}

/// Pure HTTP transport for Gerrit
#[derive(Debug)]
pub struct GerritApi {
    client: Client,
    config: ClientConfig,
}

impl GerritApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Self::build_client(&config)?;

        Ok(Self { client, config })
    }

    fn build_client(config: &ClientConfig) -> Result<Client> {
        Client::builder()
            .timeout(config.request.timeout)
            .build()
            .map_err(ClientError::Http)
    }

    /// Handle HTTP response and return its body
    async fn handle_response(&self, response: Response) -> Result<String> {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let body = response.text().await.map_err(Self::map_reqwest_error)?;

        if self.config.debug.log_responses {
            self.log_response_to_file(&url_path, &body);
        }

        if status.is_success() {
            Ok(body)
        } else {
            Err(Self::error_for_status(status, &body))
        }
    }

    /// Map non-success responses from Gerrit
    fn error_for_status(status: StatusCode, body: &str) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Authentication,
            StatusCode::NOT_FOUND => ClientError::not_found("Changes endpoint"),
            _ => {
                let reason = status.canonical_reason().unwrap_or("Unknown status");
                let detail = body.trim();
                if detail.is_empty() {
                    ClientError::status(status.as_u16(), reason)
                } else {
                    ClientError::status(status.as_u16(), format_compact!("{reason}: {detail}"))
                }
            },
        }
    }

    fn map_reqwest_error(e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Http(e)
        }
    }

    /// Log HTTP response to file for debugging
    fn log_response_to_file(&self, path: &str, body: &str) {
        if let Some(log_dir) = &self.config.debug.log_directory {
            if !log_dir.exists()
                && let Err(e) = std::fs::create_dir_all(log_dir)
            {
                warn!("Failed to create log directory: {}", e);
                return;
            }

            let filename = format!(
                "{}_{}.json",
                Local::now().format("%Y-%m-%d_%H-%M-%S%.3f"),
                path.replace('/', "_")
            );

            let log_path = log_dir.join(filename);

            if let Err(e) = std::fs::write(&log_path, body) {
                warn!("Failed to write response log to {:?}: {}", log_path, e);
            } else {
                debug!("Response logged to {:?}", log_path);
            }
        }
    }
}

#[async_trait]
impl Transport for GerritApi {
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<String> {
        if url::Url::parse(url).is_err() {
            return Err(ClientError::InvalidUrl { url: CompactString::from(url) });
        }

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("User-Agent", "gerrit-check")
            .send()
            .await.map_err(Self::map_reqwest_error)?;
        let body = self.handle_response(response).await?;
        debug!(bytes = body.len(), "Received response");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    use super::*;
    use crate::client::config::RequestConfig;

    fn api() -> GerritApi {
        GerritApi::new(ClientConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn returns_body_of_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/changes/"))
            .and(query_param("q", "status:open owner:jdoe"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(")]}'\n[]"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/changes/?q=status:open+owner:jdoe", server.uri());
        let body = api().get(&url).await.unwrap();
        assert_eq!(body, ")]}'\n[]");
    }

    #[tokio::test]
    async fn maps_server_error_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = api()
            .get(&format!("{}/changes/", server.uri()))
            .await
            .unwrap_err();
        match err {
            ClientError::Status { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("maintenance"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn maps_auth_and_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/denied/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let api = api();
        assert!(matches!(
            api.get(&format!("{}/denied/", server.uri())).await,
            Err(ClientError::Authentication)
        ));
        assert!(matches!(
            api.get(&format!("{}/missing/", server.uri())).await,
            Err(ClientError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let api = GerritApi::new(ClientConfig::default().with_request(RequestConfig {
            timeout: Duration::from_millis(100),
        }))
        .unwrap();

        let err = api
            .get(&format!("{}/changes/", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout), "got {err:?}");
    }

    #[tokio::test]
    async fn rejects_unparseable_url() {
        assert!(matches!(
            api().get("not a url").await,
            Err(ClientError::InvalidUrl { .. })
        ));
    }
}
