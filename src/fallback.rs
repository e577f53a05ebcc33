//! Fallback Store
//!
//! One canned response body per upstream source, loaded once at startup and
//! shared read-only by every query. Each payload is decoded up front with the
//! same decoder the live client uses, so a corrupt or missing asset stops the
//! service at startup and the request path never does fallible work here.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::FallbackConfig;
use crate::models::{Coordinates, ForecastDay};
use crate::upstream::{
    GeocoderClient, ImageClient, SourceKind, SummaryClient, SummaryPage, Upstream, WeatherClient,
};
use crate::{Result, WhereaboutError};

/// A raw payload alongside its decoded value
#[derive(Debug, Clone)]
struct Canned<T> {
    payload: String,
    value: T,
}

/// Read-only canned payloads, one per [`SourceKind`]
#[derive(Debug, Clone)]
pub struct FallbackStore {
    geocode: Canned<Coordinates>,
    weather: Canned<ForecastDay>,
    summary: Canned<SummaryPage>,
    image: Canned<String>,
}

/// Payloads compiled into the binary
fn embedded_payload(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Geocode => include_str!("../assets/fallback/geocode.json"),
        SourceKind::Weather => include_str!("../assets/fallback/weather.json"),
        SourceKind::Summary => include_str!("../assets/fallback/summary.json"),
        SourceKind::Image => include_str!("../assets/fallback/image.json"),
    }
}

fn canned<U: Upstream>(
    read: &mut impl FnMut(SourceKind) -> Result<String>,
) -> Result<Canned<U::Output>> {
    let payload = read(U::KIND)?;
    let value = U::decode(&payload).map_err(|e| {
        WhereaboutError::fallback(format!("Canned {} payload does not decode: {e}", U::KIND))
    })?;
    debug!(source = %U::KIND, bytes = payload.len(), "Loaded fallback payload");
    Ok(Canned { payload, value })
}

impl FallbackStore {
    /// Load according to configuration: a directory when one is set,
    /// otherwise the embedded payloads
    pub fn load(config: &FallbackConfig) -> Result<Self> {
        match &config.directory {
            Some(directory) => Self::from_dir(directory),
            None => Self::embedded(),
        }
    }

    /// Payloads built into the binary
    pub fn embedded() -> Result<Self> {
        info!("Using embedded fallback payloads");
        Self::from_payloads(|kind| Ok(embedded_payload(kind).to_string()))
    }

    /// Payloads read from `<dir>/<kind>.json`. Every file must exist.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        info!("Loading fallback payloads from: {:?}", dir);

        Self::from_payloads(|kind| {
            let path = dir.join(kind.file_name());
            fs::read_to_string(&path).map_err(|e| {
                WhereaboutError::fallback(format!(
                    "Missing {kind} fallback asset {}: {e}",
                    path.display()
                ))
            })
        })
    }

    /// Build from a payload reader and validate every payload
    pub fn from_payloads(mut read: impl FnMut(SourceKind) -> Result<String>) -> Result<Self> {
        Ok(Self {
            geocode: canned::<GeocoderClient>(&mut read)?,
            weather: canned::<WeatherClient>(&mut read)?,
            summary: canned::<SummaryClient>(&mut read)?,
            image: canned::<ImageClient>(&mut read)?,
        })
    }

    /// Raw canned body for a source
    #[must_use]
    pub fn get(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Geocode => &self.geocode.payload,
            SourceKind::Weather => &self.weather.payload,
            SourceKind::Summary => &self.summary.payload,
            SourceKind::Image => &self.image.payload,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        self.geocode.value
    }

    /// The canned forecast day. Its date is whatever the payload carries; it
    /// is not moved to the current day.
    #[must_use]
    pub fn forecast(&self) -> ForecastDay {
        self.weather.value.clone()
    }

    #[must_use]
    pub fn intro(&self) -> &str {
        &self.summary.value.extract
    }

    #[must_use]
    pub fn img(&self) -> &str {
        &self.image.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_all(dir: &Path) {
        for kind in SourceKind::ALL {
            fs::write(dir.join(kind.file_name()), embedded_payload(kind)).unwrap();
        }
    }

    #[test]
    fn test_embedded_payloads_decode() {
        let store = FallbackStore::embedded().unwrap();

        assert_eq!(store.coordinates(), Coordinates::new(52.52, 13.419_998));
        assert_eq!(store.forecast().min_temperature, 13.1);
        assert_eq!(store.forecast().max_temperature, 26.3);
        assert_eq!(store.forecast().unit, "°C");
        assert_eq!(store.forecast().date, "2024-01-01");
        assert!(store.intro().starts_with("Wikipedia, a free-content online encyclopedia"));
        assert_eq!(store.img(), "https://www.pexels.com/photo/trees-during-day-3573351/");
    }

    #[test]
    fn test_get_returns_raw_payload() {
        let store = FallbackStore::embedded().unwrap();
        for kind in SourceKind::ALL {
            assert_eq!(store.get(kind), embedded_payload(kind));
        }
    }

    #[test]
    fn test_load_defaults_to_embedded() {
        let store = FallbackStore::load(&FallbackConfig::default()).unwrap();
        assert_eq!(store.get(SourceKind::Image), embedded_payload(SourceKind::Image));
    }

    #[test]
    fn test_from_dir() {
        let dir = TempDir::new().unwrap();
        write_all(dir.path());
        fs::write(
            dir.path().join("image.json"),
            r#"{"photos": [{"url": "https://img/fallback.png"}]}"#,
        )
        .unwrap();

        let config = FallbackConfig {
            directory: Some(dir.path().to_string_lossy().to_string()),
        };
        let store = FallbackStore::load(&config).unwrap();
        assert_eq!(store.img(), "https://img/fallback.png");
    }

    #[test]
    fn test_missing_asset_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_all(dir.path());
        fs::remove_file(dir.path().join("summary.json")).unwrap();

        let err = FallbackStore::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, WhereaboutError::Fallback { .. }));
        assert!(err.to_string().contains("summary"));
    }

    #[test]
    fn test_undecodable_asset_is_fatal() {
        let err = FallbackStore::from_payloads(|kind| match kind {
            SourceKind::Weather => Ok(r#"{"daily": {}}"#.to_string()),
            other => Ok(embedded_payload(other).to_string()),
        })
        .unwrap_err();

        assert!(err.to_string().contains("Canned weather payload does not decode"));
    }
}
