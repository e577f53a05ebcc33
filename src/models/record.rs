//! The composed answer to "tell me about this place"

use serde::{Deserialize, Serialize};

use super::ForecastDay;

/// Final document returned for one query.
///
/// `name` is always the caller's query string verbatim. The other fields are
/// present only when the matching stage is wired into the deployment.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LocationRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<ForecastDay>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}
