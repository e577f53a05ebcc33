//! Data models for the Whereabout service
//!
//! - Location: coordinates resolved for a query
//! - Forecast: the single forecast day surfaced per query
//! - Record: the composed document returned to the caller

pub mod forecast;
pub mod location;
pub mod record;

// Re-export all public types for convenient access
pub use forecast::ForecastDay;
pub use location::Coordinates;
pub use record::LocationRecord;
