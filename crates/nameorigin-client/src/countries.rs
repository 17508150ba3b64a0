use std::time::Duration;

use nameorigin_core::{CountryCode, CountryDetail, NameOriginError, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::{build_http_client, check_status, map_request_error};

/// Wire format of the country-metadata service. A lookup by alpha-2 code
/// returns a one-element JSON array.
#[derive(Debug, Deserialize)]
struct CountryWire {
    name: Option<CountryNameWire>,
    cca2: Option<String>,
    region: Option<String>,
    subregion: Option<String>,
    population: Option<u64>,
    independent: Option<bool>,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(rename = "capitalInfo")]
    capital_info: Option<CapitalInfoWire>,
    maps: Option<MapsWire>,
    flags: Option<FlagsWire>,
    borders: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct CountryNameWire {
    common: Option<String>,
    official: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CapitalInfoWire {
    latlng: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct MapsWire {
    #[serde(rename = "googleMaps")]
    google_maps: Option<String>,
    #[serde(rename = "openStreetMaps")]
    open_street_maps: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlagsWire {
    png: Option<String>,
    svg: Option<String>,
    alt: Option<String>,
}

/// Thin wrapper around the country-metadata service. Single bounded attempt
/// per call, no retries.
pub struct CountriesClient {
    base_url: String,
    client: Client,
}

impl CountriesClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_http_client(timeout)?,
        })
    }

    pub async fn fetch_country_detail(&self, country_code: &CountryCode) -> Result<CountryDetail> {
        let url = format!("{}/alpha/{}", self.base_url, country_code);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_request_error("countries", e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(NameOriginError::UpstreamMalformed(format!(
                "country metadata service knows no country '{}'",
                country_code
            )));
        }
        let response = check_status("countries", response)?;
        let body: Vec<CountryWire> = response
            .json()
            .await
            .map_err(|e| map_request_error("countries", e))?;

        let wire = body.into_iter().next().ok_or_else(|| {
            NameOriginError::UpstreamMalformed(format!(
                "empty country metadata response for '{}'",
                country_code
            ))
        })?;
        detail_from_wire(wire)
    }
}

fn detail_from_wire(wire: CountryWire) -> Result<CountryDetail> {
    let common_name = wire
        .name
        .as_ref()
        .and_then(|n| n.common.clone())
        .ok_or_else(|| {
            NameOriginError::UpstreamMalformed(
                "country metadata response is missing its common name".to_string(),
            )
        })?;
    let cca2 = wire.cca2.as_deref().ok_or_else(|| {
        NameOriginError::UpstreamMalformed(
            "country metadata response is missing its alpha-2 code".to_string(),
        )
    })?;
    let country_code = CountryCode::parse(cca2).map_err(|_| {
        NameOriginError::UpstreamMalformed(format!(
            "country metadata response carries invalid alpha-2 code '{}'",
            cca2
        ))
    })?;

    let (capital_latitude, capital_longitude) = match wire
        .capital_info
        .and_then(|info| info.latlng)
        .as_deref()
    {
        Some([lat, lon]) => (Some(*lat), Some(*lon)),
        _ => (None, None),
    };

    let maps = wire.maps;
    let flags = wire.flags;
    Ok(CountryDetail {
        country_code,
        common_name,
        official_name: wire.name.and_then(|n| n.official),
        region: wire.region,
        subregion: wire.subregion,
        population: wire.population,
        independent: wire.independent,
        capital: wire.capital.into_iter().next(),
        capital_latitude,
        capital_longitude,
        flag_png_url: flags.as_ref().and_then(|f| f.png.clone()).map(ensure_https),
        flag_svg_url: flags.as_ref().and_then(|f| f.svg.clone()).map(ensure_https),
        flag_alt: flags.and_then(|f| f.alt),
        google_maps_url: maps
            .as_ref()
            .and_then(|m| m.google_maps.clone())
            .map(ensure_https),
        open_street_map_url: maps
            .and_then(|m| m.open_street_maps)
            .map(ensure_https),
        borders: wire.borders,
    })
}

/// Some upstream URL fields arrive without a scheme; prepend `https://` so
/// they stay usable as links.
fn ensure_https(url: String) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url
    } else {
        format!("https://{}", url.trim_start_matches('/'))
    }
}
