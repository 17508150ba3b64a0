use std::path::Path;

use config as cfg;
use serde::{Deserialize, Serialize};

use crate::{NameOriginError, Result};

/// Which candidate countries receive a popularity increment after a
/// successful aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopularityScope {
    /// Count once per request, keyed to the top-ranked candidate's country.
    TopCandidate,
    /// Count once per request for every returned candidate's country.
    AllCandidates,
}

impl Default for PopularityScope {
    fn default() -> Self {
        Self::TopCandidate
    }
}

/// Runtime settings for the aggregation core.
///
/// Loaded from an optional TOML file overlaid with environment variables.
/// Recognized environment keys: `NATIONALIZE_BASE_URL`, `COUNTRY_BASE_URL`,
/// `CACHE_TTL`, `REQUEST_TIMEOUT` (both in seconds), plus the remaining
/// field names in upper snake case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "Settings::default_nationalize_base_url")]
    pub nationalize_base_url: String,
    #[serde(default = "Settings::default_country_base_url")]
    pub country_base_url: String,
    /// Seconds a cached prediction stays usable. `0` means never expire.
    #[serde(default = "Settings::default_cache_ttl")]
    pub cache_ttl: u64,
    /// Bounded timeout for each upstream call, in seconds.
    #[serde(default = "Settings::default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "Settings::default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub popularity_scope: PopularityScope,
    /// Whether a pure cache hit also increments the popularity counter.
    /// When false, popularity reflects upstream-fetch volume only.
    #[serde(default)]
    pub count_cache_hits: bool,
    #[serde(default = "Settings::default_popular_limit")]
    pub popular_limit: usize,
}

impl Settings {
    fn default_nationalize_base_url() -> String {
        "https://api.nationalize.io/".to_string()
    }

    fn default_country_base_url() -> String {
        "https://restcountries.com/v3.1/".to_string()
    }

    fn default_cache_ttl() -> u64 {
        86_400 // one day
    }

    fn default_request_timeout() -> u64 {
        10
    }

    fn default_db_path() -> String {
        "data/nameorigin.db".to_string()
    }

    fn default_popular_limit() -> usize {
        5
    }

    /// Loads settings from `config_file` (if present) overlaid with
    /// environment variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = cfg::Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(cfg::File::from(path.to_path_buf()).required(false));
        }
        builder = builder.add_source(cfg::Environment::default().try_parsing(true));

        let settings: Self = builder
            .build()
            .map_err(|e| NameOriginError::InvalidInput(format!("building configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| {
                NameOriginError::InvalidInput(format!("deserializing configuration: {}", e))
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nationalize_base_url.is_empty() {
            return Err(NameOriginError::InvalidInput(
                "nationalize_base_url must not be empty".to_string(),
            ));
        }
        if self.country_base_url.is_empty() {
            return Err(NameOriginError::InvalidInput(
                "country_base_url must not be empty".to_string(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(NameOriginError::InvalidInput(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.popular_limit == 0 {
            return Err(NameOriginError::InvalidInput(
                "popular_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nationalize_base_url: Self::default_nationalize_base_url(),
            country_base_url: Self::default_country_base_url(),
            cache_ttl: Self::default_cache_ttl(),
            request_timeout: Self::default_request_timeout(),
            db_path: Self::default_db_path(),
            popularity_scope: PopularityScope::default(),
            count_cache_hits: false,
            popular_limit: Self::default_popular_limit(),
        }
    }
}
