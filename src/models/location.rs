//! Coordinates resolved for one query

use serde::{Deserialize, Serialize};

/// Geographic coordinates in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Format as a coordinate pair for log output
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coordinates() {
        let coordinates = Coordinates::new(52.52, 13.419_998);
        assert_eq!(coordinates.format_coordinates(), "52.5200, 13.4200");
    }

    #[test]
    fn test_deserialize_position() {
        let coordinates: Coordinates = serde_json::from_str(r#"{"lat": 48.85, "lon": 2.35}"#).unwrap();
        assert_eq!(coordinates, Coordinates::new(48.85, 2.35));
    }
}
