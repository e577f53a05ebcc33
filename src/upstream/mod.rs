//! Upstream clients
//!
//! One client per third-party source. Every client issues a single outbound
//! request per call and reports whether the response is usable; decoding a
//! usable body into the source's shape is a separate, fallible step so the
//! orchestrator can treat both failure kinds the same way: substitute the
//! fallback payload for that one source.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::WhereaboutError;

pub mod geocoder;
pub mod image;
pub mod summary;
pub mod weather;

pub use geocoder::GeocoderClient;
pub use image::ImageClient;
pub use summary::{SummaryClient, SummaryPage};
pub use weather::WeatherClient;

const USER_AGENT: &str = concat!("whereabout/", env!("CARGO_PKG_VERSION"));

/// The four upstream sources a record is composed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Geocode,
    Weather,
    Summary,
    Image,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Geocode,
        SourceKind::Weather,
        SourceKind::Summary,
        SourceKind::Image,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Geocode => "geocode",
            SourceKind::Weather => "weather",
            SourceKind::Summary => "summary",
            SourceKind::Image => "image",
        }
    }

    /// File name of this source's fallback payload
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    /// Transport succeeded with a success status; carries the raw body
    Usable(String),
    /// Transport error, non-success status or timeout; carries the reason
    Unusable(String),
}

/// A usable body that does not have the expected shape
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed {kind} payload: {source}")]
    Malformed {
        kind: SourceKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} payload has no {field}")]
    Missing {
        kind: SourceKind,
        field: &'static str,
    },

    #[error("{kind} payload has an invalid {field}: {value}")]
    Invalid {
        kind: SourceKind,
        field: &'static str,
        value: String,
    },
}

/// Parse a JSON body, tagging failures with the source kind
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    kind: SourceKind,
    body: &str,
) -> Result<T, DecodeError> {
    serde_json::from_str(body).map_err(|source| DecodeError::Malformed { kind, source })
}

/// A third-party source the orchestrator composes records from
#[async_trait]
pub trait Upstream: Send + Sync {
    /// What the outbound request is built from
    type Input: ?Sized + Sync;
    /// Structured shape of a decoded body
    type Output: Send;

    const KIND: SourceKind;

    /// Issue one outbound request. Never fails; transport problems come back
    /// as [`Fetch::Unusable`].
    async fn fetch(&self, input: &Self::Input) -> Fetch;

    /// Decode a body returned by this source, taking the first element of any
    /// array it carries.
    fn decode(body: &str) -> Result<Self::Output, DecodeError>;
}

/// HTTP transport shared by all clients
#[derive(Debug, Clone)]
pub struct UpstreamHttp {
    client: Client,
}

impl UpstreamHttp {
    /// Create a transport whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WhereaboutError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// GET `url` and classify the response
    pub async fn get(&self, kind: SourceKind, url: &str, authorization: Option<&str>) -> Fetch {
        // Query strings may carry API keys
        let endpoint = url.split('?').next().unwrap_or(url);
        debug!(source = %kind, endpoint, "Calling upstream");
        let start_time = Instant::now();

        let mut request = self.client.get(url);
        if let Some(key) = authorization {
            request = request.header(AUTHORIZATION, key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Fetch::Unusable(format!("request timed out: {e}")),
            Err(e) => return Fetch::Unusable(format!("request failed: {e}")),
        };

        let status = response.status();
        if !status.is_success() {
            return Fetch::Unusable(format!(
                "status {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            ));
        }

        match response.text().await {
            Ok(body) => {
                debug!(
                    source = %kind,
                    "Upstream answered {} in {:.3}s",
                    status,
                    start_time.elapsed().as_secs_f64()
                );
                Fetch::Usable(body)
            }
            Err(e) => Fetch::Unusable(format!("failed to read body: {e}")),
        }
    }
}

/// Join a configured base URL and a path without doubling the slash
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_source_kind_names() {
        assert_eq!(SourceKind::Geocode.to_string(), "geocode");
        assert_eq!(SourceKind::Image.file_name(), "image.json");
        assert_eq!(SourceKind::ALL.len(), 4);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://a.example/v1/", "search"), "https://a.example/v1/search");
        assert_eq!(join_url("https://a.example/v1", "search"), "https://a.example/v1/search");
    }

    #[test]
    fn test_decode_error_messages() {
        let err = DecodeError::Missing {
            kind: SourceKind::Weather,
            field: "daily.time[0]",
        };
        assert_eq!(err.to_string(), "weather payload has no daily.time[0]");

        let err = parse_json::<serde_json::Value>(SourceKind::Summary, "{not json").unwrap_err();
        assert!(err.to_string().starts_with("malformed summary payload"));
    }

    #[tokio::test]
    async fn test_get_success_is_usable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .and(header("authorization", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let http = UpstreamHttp::new(Duration::from_secs(2)).unwrap();
        let fetch = http
            .get(SourceKind::Image, &format!("{}/ok", server.uri()), Some("secret"))
            .await;

        assert_eq!(fetch, Fetch::Usable("{}".to_string()));
    }

    #[tokio::test]
    async fn test_get_error_status_is_unusable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let http = UpstreamHttp::new(Duration::from_secs(2)).unwrap();
        let fetch = http
            .get(SourceKind::Weather, &format!("{}/forecast", server.uri()), None)
            .await;

        assert_eq!(fetch, Fetch::Unusable("status 503 - Service Unavailable".to_string()));
    }

    #[tokio::test]
    async fn test_get_timeout_is_unusable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let http = UpstreamHttp::new(Duration::from_millis(200)).unwrap();
        let fetch = http.get(SourceKind::Geocode, &server.uri(), None).await;

        assert!(matches!(fetch, Fetch::Unusable(_)));
    }

    #[tokio::test]
    async fn test_get_transport_error_is_unusable() {
        let http = UpstreamHttp::new(Duration::from_secs(1)).unwrap();
        // Nothing listens on the discard port
        let fetch = http.get(SourceKind::Summary, "http://127.0.0.1:9/page", None).await;

        match fetch {
            Fetch::Unusable(reason) => assert!(reason.starts_with("request")),
            Fetch::Usable(_) => panic!("expected an unusable response"),
        }
    }
}
