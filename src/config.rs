//! Configuration management for the `Whereabout` service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WhereaboutError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `Whereabout` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhereaboutConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Settings shared by every upstream call
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Geocoding API
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    /// Weather API
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Encyclopedia summary API
    #[serde(default)]
    pub summary: SummaryConfig,
    /// Photo search API
    #[serde(default)]
    pub image: ImageConfig,
    /// Where fallback payloads come from
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory served for every path that is not an API route
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Which stage supplies the coordinates the weather stage needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSource {
    /// A dedicated geocoder call
    #[default]
    Geocoder,
    /// The coordinates attached to the summary page
    Summary,
}

/// Settings shared by every upstream call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Timeout for a single outbound request in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u32,
    /// Upper bound for all upstream work of one query in seconds
    #[serde(default = "default_query_deadline")]
    pub query_deadline_seconds: u32,
    #[serde(default)]
    pub coordinate_source: CoordinateSource,
}

/// Geocoding API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Weather API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Summary API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_summary_base_url")]
    pub base_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Photo search API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_base_url")]
    pub base_url: String,
    /// Sent verbatim in the `Authorization` header
    pub api_key: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Fallback payload source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Directory holding `geocode.json`, `weather.json`, `summary.json` and
    /// `image.json`. The payloads built into the binary are used when unset.
    pub directory: Option<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3031
}

fn default_static_dir() -> String {
    "welcome".to_string()
}

fn default_upstream_timeout() -> u32 {
    5
}

fn default_query_deadline() -> u32 {
    10
}

fn default_geocoder_base_url() -> String {
    "https://api.tomtom.com/search/2/geocode".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_summary_base_url() -> String {
    "https://en.wikipedia.org/api/rest_v1/page/related".to_string()
}

fn default_image_base_url() -> String {
    "https://api.pexels.com/v1".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_upstream_timeout(),
            query_deadline_seconds: default_query_deadline(),
            coordinate_source: CoordinateSource::default(),
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_base_url(),
            api_key: None,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            enabled: default_enabled(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            base_url: default_summary_base_url(),
            enabled: default_enabled(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_base_url(),
            api_key: None,
            enabled: default_enabled(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WhereaboutConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WHEREABOUT_IMAGE__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("WHEREABOUT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WhereaboutConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("whereabout").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.static_dir.is_empty() {
            self.server.static_dir = default_static_dir();
        }
        if self.upstream.timeout_seconds == 0 {
            self.upstream.timeout_seconds = default_upstream_timeout();
        }
        if self.upstream.query_deadline_seconds == 0 {
            self.upstream.query_deadline_seconds = default_query_deadline();
        }
        if self.geocoder.base_url.is_empty() {
            self.geocoder.base_url = default_geocoder_base_url();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.summary.base_url.is_empty() {
            self.summary.base_url = default_summary_base_url();
        }
        if self.image.base_url.is_empty() {
            self.image.base_url = default_image_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_wiring()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Geocoder", &self.geocoder.api_key),
            ("Image", &self.image.api_key),
        ];

        for (name, key) in keys {
            if let Some(key) = key {
                if key.trim().is_empty() {
                    return Err(WhereaboutError::config(format!(
                        "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }

                if key.len() > 200 {
                    return Err(WhereaboutError::config(format!(
                        "{name} API key appears to be invalid (too long). Please check your API key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.upstream.timeout_seconds > 300 {
            return Err(
                WhereaboutError::config("Upstream timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.upstream.query_deadline_seconds > 600 {
            return Err(
                WhereaboutError::config("Query deadline cannot exceed 600 seconds").into(),
            );
        }

        if self.upstream.query_deadline_seconds < self.upstream.timeout_seconds {
            return Err(WhereaboutError::config(
                "Query deadline cannot be shorter than the upstream timeout",
            )
            .into());
        }

        if self.server.port == 0 {
            return Err(WhereaboutError::config("Server port cannot be 0").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WhereaboutError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WhereaboutError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let base_urls = [
            ("Geocoder", &self.geocoder.base_url),
            ("Weather", &self.weather.base_url),
            ("Summary", &self.summary.base_url),
            ("Image", &self.image.base_url),
        ];
        for (name, url) in base_urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WhereaboutError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate that the wired stages form a consistent deployment
    fn validate_wiring(&self) -> Result<()> {
        if self.upstream.coordinate_source == CoordinateSource::Summary && !self.summary.enabled {
            return Err(WhereaboutError::config(
                "coordinate_source = \"summary\" requires the summary stage to be enabled",
            )
            .into());
        }

        Ok(())
    }

    /// Whether a dedicated geocoder call is part of this deployment
    #[must_use]
    pub fn uses_geocoder(&self) -> bool {
        self.weather.enabled && self.upstream.coordinate_source == CoordinateSource::Geocoder
    }
}
