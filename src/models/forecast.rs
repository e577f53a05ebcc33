//! Forecast model surfaced to the caller

use serde::{Deserialize, Serialize};

/// One day of forecast: temperature range plus the unit the upstream reported
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    /// Calendar date (ISO-8601, `YYYY-MM-DD`)
    pub date: String,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Temperature unit, e.g. `°C`
    pub unit: String,
}

impl ForecastDay {
    /// Format temperature range with unit
    #[must_use]
    pub fn format_range(&self) -> String {
        format!(
            "{:.1}{unit} - {:.1}{unit}",
            self.min_temperature,
            self.max_temperature,
            unit = self.unit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let day = ForecastDay {
            date: "2024-05-01".to_string(),
            min_temperature: 13.1,
            max_temperature: 26.3,
            unit: "°C".to_string(),
        };

        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2024-05-01",
                "minTemperature": 13.1,
                "maxTemperature": 26.3,
                "unit": "°C"
            })
        );
        assert_eq!(day.format_range(), "13.1°C - 26.3°C");
    }
}
