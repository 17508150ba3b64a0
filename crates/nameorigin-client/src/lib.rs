//! Thin request/response wrappers around the two remote services the
//! aggregation core consumes: the nationality-prediction service and the
//! country-metadata service.
//!
//! No retry logic lives here; every call is a single bounded attempt and a
//! timeout is reported as the service being unavailable.

pub mod countries;
pub mod nationalize;

use std::time::Duration;

use async_trait::async_trait;
use nameorigin_core::{
    CountryCode, CountryDetail, NameOriginError, NationalityCandidate, NationalityProvider,
    Result, Settings,
};
use reqwest::{Client, Response};

pub use countries::CountriesClient;
pub use nationalize::NationalizeClient;

fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| NameOriginError::UpstreamUnavailable(format!("building HTTP client: {}", e)))
}

/// Maps a transport-level failure onto the upstream error taxonomy. Timeouts
/// and connect failures are "unavailable"; an undecodable body is
/// "malformed".
fn map_request_error(service: &str, err: reqwest::Error) -> NameOriginError {
    if err.is_decode() {
        NameOriginError::UpstreamMalformed(format!("{}: {}", service, err))
    } else {
        NameOriginError::UpstreamUnavailable(format!("{}: {}", service, err))
    }
}

/// Converts a non-success HTTP status into the matching failure kind:
/// rate limiting and server errors mean the service is unavailable right
/// now, anything else unexpected means it answered in a shape we cannot use.
fn check_status(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = format!("{} responded with status {}", service, status);
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Err(NameOriginError::UpstreamUnavailable(detail))
    } else {
        Err(NameOriginError::UpstreamMalformed(detail))
    }
}

/// Both upstream clients bundled behind the core's provider seam.
pub struct UpstreamClient {
    nationalize: NationalizeClient,
    countries: CountriesClient,
}

impl UpstreamClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.request_timeout);
        Ok(Self {
            nationalize: NationalizeClient::new(&settings.nationalize_base_url, timeout)?,
            countries: CountriesClient::new(&settings.country_base_url, timeout)?,
        })
    }
}

#[async_trait]
impl NationalityProvider for UpstreamClient {
    async fn fetch_candidates(&self, raw_name: &str) -> Result<Vec<NationalityCandidate>> {
        self.nationalize.fetch_candidates(raw_name).await
    }

    async fn fetch_country_detail(&self, country_code: &CountryCode) -> Result<CountryDetail> {
        self.countries.fetch_country_detail(country_code).await
    }
}
