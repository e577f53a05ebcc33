//! Aggregation Orchestrator
//!
//! Sequences the upstream calls for one query, degrades each source to its
//! fallback payload independently, and composes the final record.
//!
//! Stage order: coordinates → forecast is a true dependency and runs as one
//! chain. The summary and image stages depend on nothing but the location
//! name, so they run concurrently with that chain and everything is joined
//! before composition. All intermediate values live in the query's own
//! future; nothing per-query is stored on the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::config::{CoordinateSource, WhereaboutConfig};
use crate::fallback::FallbackStore;
use crate::models::{Coordinates, ForecastDay, LocationRecord};
use crate::upstream::{
    DecodeError, Fetch, GeocoderClient, ImageClient, SourceKind, SummaryClient, SummaryPage,
    Upstream, UpstreamHttp, WeatherClient,
};

/// Why a stage fell back to its canned payload
#[derive(Error, Debug)]
pub enum Degraded {
    #[error("unusable response: {0}")]
    Unusable(String),

    #[error("query deadline exceeded")]
    Deadline,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Request-scoped values threaded through the stages
#[derive(Debug, Clone, Copy)]
struct QueryContext<'a> {
    location: &'a str,
    deadline: Instant,
}

/// Clients wired into this deployment; an absent client means the stage
/// and its output field do not exist
#[derive(Debug, Clone, Default)]
pub struct Wiring {
    pub geocoder: Option<GeocoderClient>,
    pub weather: Option<WeatherClient>,
    pub summary: Option<SummaryClient>,
    pub image: Option<ImageClient>,
    pub coordinate_source: CoordinateSource,
}

/// Composes a [`LocationRecord`] from the wired upstream sources
#[derive(Debug, Clone)]
pub struct Orchestrator {
    wiring: Wiring,
    fallback: Arc<FallbackStore>,
    query_deadline: Duration,
}

impl Orchestrator {
    pub fn new(wiring: Wiring, fallback: Arc<FallbackStore>, query_deadline: Duration) -> Self {
        Self {
            wiring,
            fallback,
            query_deadline,
        }
    }

    /// Wire the clients the configuration enables around one shared transport
    pub fn from_config(config: &WhereaboutConfig, fallback: Arc<FallbackStore>) -> Result<Self> {
        let http = UpstreamHttp::new(Duration::from_secs(config.upstream.timeout_seconds.into()))?;

        if config.uses_geocoder() && config.geocoder.api_key.is_none() {
            warn!("No geocoder API key configured, geocoding will likely degrade to fallback");
        }
        if config.image.enabled && config.image.api_key.is_none() {
            warn!("No image API key configured, images will likely degrade to fallback");
        }

        let wiring = Wiring {
            geocoder: config
                .uses_geocoder()
                .then(|| GeocoderClient::new(http.clone(), &config.geocoder)),
            weather: config
                .weather
                .enabled
                .then(|| WeatherClient::new(http.clone(), &config.weather)),
            summary: config
                .summary
                .enabled
                .then(|| SummaryClient::new(http.clone(), &config.summary)),
            image: config
                .image
                .enabled
                .then(|| ImageClient::new(http.clone(), &config.image)),
            coordinate_source: config.upstream.coordinate_source,
        };

        info!(
            geocoder = wiring.geocoder.is_some(),
            weather = wiring.weather.is_some(),
            summary = wiring.summary.is_some(),
            image = wiring.image.is_some(),
            coordinate_source = ?wiring.coordinate_source,
            "Orchestrator wired"
        );

        Ok(Self::new(
            wiring,
            fallback,
            Duration::from_secs(config.upstream.query_deadline_seconds.into()),
        ))
    }

    /// Answer "tell me about this place" for one location name.
    ///
    /// Never fails: every source that cannot be used is replaced by its
    /// fallback payload.
    #[instrument(skip(self))]
    pub async fn find_all_about(&self, location: &str) -> LocationRecord {
        info!("Searching all about location");

        let query = QueryContext {
            location,
            deadline: Instant::now() + self.query_deadline,
        };

        let (forecast, intro, img) = match self.wiring.coordinate_source {
            CoordinateSource::Geocoder => {
                tokio::join!(
                    self.geocoded_forecast(query),
                    self.intro(query),
                    self.img(query)
                )
            }
            CoordinateSource::Summary => {
                let ((forecast, intro), img) =
                    tokio::join!(self.summary_forecast(query), self.img(query));
                (forecast, intro, img)
            }
        };

        LocationRecord {
            name: location.to_owned(),
            intro,
            forecast: forecast.map(|day| vec![day]),
            img,
        }
    }

    /// Stages 1 and 2 with a dedicated geocoder call
    async fn geocoded_forecast(&self, query: QueryContext<'_>) -> Option<ForecastDay> {
        let weather = self.wiring.weather.as_ref()?;

        let coordinates = match &self.wiring.geocoder {
            Some(geocoder) => self
                .stage(geocoder, query.location, query)
                .await
                .unwrap_or_else(|cause| {
                    self.degrade(SourceKind::Geocode, &cause, self.fallback.coordinates())
                }),
            None => self.fallback.coordinates(),
        };
        debug!(coordinates = %coordinates.format_coordinates(), "Coordinates from geocoder");

        Some(self.forecast(weather, coordinates, query).await)
    }

    /// Stages 1, 2 and 3 when the summary page supplies the coordinates
    async fn summary_forecast(
        &self,
        query: QueryContext<'_>,
    ) -> (Option<ForecastDay>, Option<String>) {
        let Some(summary) = &self.wiring.summary else {
            return (None, None);
        };

        let page = self
            .stage(summary, query.location, query)
            .await
            .unwrap_or_else(|cause| {
                self.degrade(
                    SourceKind::Summary,
                    &cause,
                    SummaryPage {
                        extract: self.fallback.intro().to_owned(),
                        coordinates: None,
                    },
                )
            });

        let forecast = match &self.wiring.weather {
            Some(weather) => {
                let coordinates = page.coordinates.unwrap_or_else(|| {
                    self.degrade(
                        SourceKind::Geocode,
                        &Degraded::Decode(DecodeError::Missing {
                            kind: SourceKind::Summary,
                            field: "pages[0].coordinates",
                        }),
                        self.fallback.coordinates(),
                    )
                });
                debug!(coordinates = %coordinates.format_coordinates(), "Coordinates from summary");
                Some(self.forecast(weather, coordinates, query).await)
            }
            None => None,
        };

        (forecast, Some(page.extract))
    }

    /// Stage 2
    async fn forecast(
        &self,
        weather: &WeatherClient,
        coordinates: Coordinates,
        query: QueryContext<'_>,
    ) -> ForecastDay {
        let day = self
            .stage(weather, &coordinates, query)
            .await
            .unwrap_or_else(|cause| {
                self.degrade(SourceKind::Weather, &cause, self.fallback.forecast())
            });
        debug!(date = %day.date, range = %day.format_range(), "Forecast");
        day
    }

    /// Stage 3 with a dedicated geocoder
    async fn intro(&self, query: QueryContext<'_>) -> Option<String> {
        let summary = self.wiring.summary.as_ref()?;

        Some(match self.stage(summary, query.location, query).await {
            Ok(page) => page.extract,
            Err(cause) => self.degrade(SourceKind::Summary, &cause, self.fallback.intro().to_owned()),
        })
    }

    /// Stage 4
    async fn img(&self, query: QueryContext<'_>) -> Option<String> {
        let image = self.wiring.image.as_ref()?;

        Some(
            self.stage(image, query.location, query)
                .await
                .unwrap_or_else(|cause| {
                    self.degrade(SourceKind::Image, &cause, self.fallback.img().to_owned())
                }),
        )
    }

    /// Fetch and decode one source within the query deadline
    async fn stage<U: Upstream>(
        &self,
        client: &U,
        input: &U::Input,
        query: QueryContext<'_>,
    ) -> std::result::Result<U::Output, Degraded> {
        let body = match tokio::time::timeout_at(query.deadline, client.fetch(input)).await {
            Ok(Fetch::Usable(body)) => body,
            Ok(Fetch::Unusable(reason)) => return Err(Degraded::Unusable(reason)),
            Err(_) => return Err(Degraded::Deadline),
        };

        Ok(U::decode(&body)?)
    }

    fn degrade<T>(&self, kind: SourceKind, cause: &Degraded, fallback: T) -> T {
        warn!(source = %kind, %cause, "Using fallback payload instead");
        fallback
    }
}
