//! `Whereabout` - tell me about this place
//!
//! This library composes one document about a location from four upstream
//! sources (geocoder, weather, encyclopedia summary and photo search),
//! substituting a canned fallback for any source that cannot be used.

pub mod api;
pub mod config;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod upstream;
pub mod web;

// Re-export core types for public API
pub use config::{CoordinateSource, WhereaboutConfig};
pub use error::WhereaboutError;
pub use fallback::FallbackStore;
pub use models::{Coordinates, ForecastDay, LocationRecord};
pub use orchestrator::Orchestrator;
pub use upstream::SourceKind;

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WhereaboutError>;

