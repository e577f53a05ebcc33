//! Summary client: location name → encyclopedia extract, plus the page's
//! coordinates when the summary is also the coordinate source

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{DecodeError, Fetch, SourceKind, Upstream, UpstreamHttp, join_url, parse_json};
use crate::config::SummaryConfig;
use crate::models::Coordinates;

/// Client for the Wikipedia REST `page/related` endpoint
#[derive(Debug, Clone)]
pub struct SummaryClient {
    http: UpstreamHttp,
    base_url: String,
}

/// First page of a summary response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPage {
    pub extract: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    pages: Vec<SummaryPage>,
}

/// Page title for a location name: every run of whitespace becomes one `_`
#[must_use]
pub fn page_title(location: &str) -> String {
    let mut title = String::with_capacity(location.len());
    let mut in_whitespace = false;
    for c in location.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                title.push('_');
            }
            in_whitespace = true;
        } else {
            title.push(c);
            in_whitespace = false;
        }
    }
    title
}

impl SummaryClient {
    #[must_use]
    pub fn new(http: UpstreamHttp, config: &SummaryConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
        }
    }

    /// Build the page URL for a location name
    #[must_use]
    pub fn request_url(&self, location: &str) -> String {
        join_url(&self.base_url, &urlencoding::encode(&page_title(location)))
    }
}

#[async_trait]
impl Upstream for SummaryClient {
    type Input = str;
    type Output = SummaryPage;

    const KIND: SourceKind = SourceKind::Summary;

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, location: &str) -> Fetch {
        self.http.get(Self::KIND, &self.request_url(location), None).await
    }

    fn decode(body: &str) -> Result<SummaryPage, DecodeError> {
        let response: SummaryResponse = parse_json(Self::KIND, body)?;

        response.pages.into_iter().next().ok_or(DecodeError::Missing {
            kind: Self::KIND,
            field: "pages[0]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case("Berlin", "Berlin")]
    #[case("New York", "New_York")]
    #[case("Rio  de\tJaneiro", "Rio_de_Janeiro")]
    #[case(" Lyon ", "_Lyon_")]
    #[case("", "")]
    fn test_page_title(#[case] location: &str, #[case] expected: &str) {
        assert_eq!(page_title(location), expected);
    }

    #[test]
    fn test_request_url_uses_page_title() {
        let config = SummaryConfig {
            base_url: "https://en.wikipedia.org/api/rest_v1/page/related".to_string(),
            enabled: true,
        };
        let client = SummaryClient::new(UpstreamHttp::new(Duration::from_secs(1)).unwrap(), &config);

        assert_eq!(
            client.request_url("New York"),
            "https://en.wikipedia.org/api/rest_v1/page/related/New_York"
        );
        assert_eq!(
            client.request_url("São Paulo"),
            "https://en.wikipedia.org/api/rest_v1/page/related/S%C3%A3o_Paulo"
        );
    }

    #[test]
    fn test_decode_first_page_with_coordinates() {
        let body = r#"{
            "pages": [
                {"pageid": 1, "title": "Berlin", "extract": "Berlin is...", "coordinates": {"lat": 52.52, "lon": 13.405}},
                {"pageid": 2, "title": "Potsdam", "extract": "Potsdam is..."}
            ]
        }"#;

        let page = SummaryClient::decode(body).unwrap();
        assert_eq!(page.extract, "Berlin is...");
        assert_eq!(page.coordinates, Some(Coordinates::new(52.52, 13.405)));
    }

    #[test]
    fn test_decode_page_without_coordinates() {
        let page = SummaryClient::decode(r#"{"pages": [{"extract": "Somewhere"}]}"#).unwrap();
        assert_eq!(page.extract, "Somewhere");
        assert!(page.coordinates.is_none());
    }

    #[test]
    fn test_decode_no_pages() {
        assert!(matches!(
            SummaryClient::decode(r#"{"pages": []}"#).unwrap_err(),
            DecodeError::Missing {
                field: "pages[0]",
                ..
            }
        ));
    }

    #[test]
    fn test_decode_page_without_extract() {
        assert!(matches!(
            SummaryClient::decode(r#"{"pages": [{"title": "Nowhere"}]}"#).unwrap_err(),
            DecodeError::Malformed { .. }
        ));
    }
}
