//! Image client: location name → one photo URL (Pexels search API)

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::{DecodeError, Fetch, SourceKind, Upstream, UpstreamHttp, join_url, parse_json};
use crate::config::ImageConfig;

#[derive(Debug, Clone)]
pub struct ImageClient {
    http: UpstreamHttp,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    url: String,
}

impl ImageClient {
    #[must_use]
    pub fn new(http: UpstreamHttp, config: &ImageConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Build the search URL for a location name
    #[must_use]
    pub fn request_url(&self, location: &str) -> String {
        join_url(
            &self.base_url,
            &format!("search?query={}&per_page=1", urlencoding::encode(location)),
        )
    }
}

#[async_trait]
impl Upstream for ImageClient {
    type Input = str;
    type Output = String;

    const KIND: SourceKind = SourceKind::Image;

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, location: &str) -> Fetch {
        self.http
            .get(Self::KIND, &self.request_url(location), self.api_key.as_deref())
            .await
    }

    fn decode(body: &str) -> Result<String, DecodeError> {
        let response: SearchResponse = parse_json(Self::KIND, body)?;

        response
            .photos
            .into_iter()
            .next()
            .map(|photo| photo.url)
            .ok_or(DecodeError::Missing {
                kind: Self::KIND,
                field: "photos[0]",
            })
    }
}
