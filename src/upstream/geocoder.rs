//! Geocoder client: location name → coordinates

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::{DecodeError, Fetch, SourceKind, Upstream, UpstreamHttp, join_url, parse_json};
use crate::config::GeocoderConfig;
use crate::models::Coordinates;

/// Client for a search API answering `{results: [{position: {lat, lon}}]}`
#[derive(Debug, Clone)]
pub struct GeocoderClient {
    http: UpstreamHttp,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    position: Coordinates,
}

impl GeocoderClient {
    #[must_use]
    pub fn new(http: UpstreamHttp, config: &GeocoderConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Build the lookup URL for a location name
    #[must_use]
    pub fn request_url(&self, location: &str) -> String {
        let mut url = join_url(
            &self.base_url,
            &format!("{}.json?limit=1", urlencoding::encode(location)),
        );
        if let Some(key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }
}

#[async_trait]
impl Upstream for GeocoderClient {
    type Input = str;
    type Output = Coordinates;

    const KIND: SourceKind = SourceKind::Geocode;

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, location: &str) -> Fetch {
        self.http.get(Self::KIND, &self.request_url(location), None).await
    }

    fn decode(body: &str) -> Result<Coordinates, DecodeError> {
        let response: GeocodeResponse = parse_json(Self::KIND, body)?;

        // Use the first (best) result
        response
            .results
            .into_iter()
            .next()
            .map(|result| result.position)
            .ok_or(DecodeError::Missing {
                kind: Self::KIND,
                field: "results[0]",
            })
    }
}
