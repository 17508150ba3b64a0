use std::time::Duration;

use nameorigin_core::{sort_candidates, CountryCode, NationalityCandidate, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::{build_http_client, check_status, map_request_error};

/// Wire format of the nationality-prediction service:
/// `{"count": n, "name": "...", "country": [{"country_id", "probability"}]}`.
#[derive(Debug, Deserialize)]
struct NationalizeResponse {
    #[serde(default)]
    country: Vec<CountryPrediction>,
}

#[derive(Debug, Deserialize)]
struct CountryPrediction {
    country_id: Option<String>,
    probability: Option<f64>,
}

/// Thin wrapper around the nationality-prediction service. Single bounded
/// attempt per call, no retries.
pub struct NationalizeClient {
    base_url: String,
    client: Client,
}

impl NationalizeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('?').to_string(),
            client: build_http_client(timeout)?,
        })
    }

    /// Fetches nationality candidates for a raw name, ordered descending by
    /// probability (ties by country code ascending). An empty list means the
    /// service knows no candidates for the name.
    pub async fn fetch_candidates(&self, raw_name: &str) -> Result<Vec<NationalityCandidate>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("name", raw_name)])
            .send()
            .await
            .map_err(|e| map_request_error("nationalize", e))?;

        let response = check_status("nationalize", response)?;
        let body: NationalizeResponse = response
            .json()
            .await
            .map_err(|e| map_request_error("nationalize", e))?;

        Ok(candidates_from_wire(body))
    }
}

fn candidates_from_wire(body: NationalizeResponse) -> Vec<NationalityCandidate> {
    let mut candidates = Vec::with_capacity(body.country.len());
    for prediction in body.country {
        let (code, probability) = match (prediction.country_id, prediction.probability) {
            (Some(code), Some(p)) => (code, p),
            (code, _) => {
                warn!(country_id = ?code, "skipping malformed nationality prediction entry");
                continue;
            }
        };
        if !(0.0..=1.0).contains(&probability) {
            warn!(%code, probability, "skipping prediction with out-of-range probability");
            continue;
        }
        match CountryCode::parse(&code) {
            Ok(country_code) => candidates.push(NationalityCandidate {
                country_code,
                probability,
            }),
            Err(_) => {
                warn!(%code, "skipping prediction with invalid country code");
            }
        }
    }
    sort_candidates(&mut candidates);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_orders_candidates() {
        let body: NationalizeResponse = serde_json::from_str(
            r#"{"count": 312, "name": "anna", "country": [
                {"country_id": "PL", "probability": 0.3},
                {"country_id": "US", "probability": 0.5},
                {"country_id": "UA", "probability": 0.3}
            ]}"#,
        )
        .unwrap();
        let candidates = candidates_from_wire(body);
        let codes: Vec<&str> = candidates
            .iter()
            .map(|c| c.country_code.as_str())
            .collect();
        assert_eq!(codes, vec!["US", "PL", "UA"]);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let body: NationalizeResponse = serde_json::from_str(
            r#"{"country": [
                {"country_id": "US", "probability": 0.5},
                {"country_id": null, "probability": 0.2},
                {"country_id": "DE"},
                {"country_id": "XYZ", "probability": 0.1},
                {"country_id": "FR", "probability": 1.5}
            ]}"#,
        )
        .unwrap();
        let candidates = candidates_from_wire(body);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].country_code.as_str(), "US");
    }

    #[test]
    fn missing_country_field_means_no_candidates() {
        let body: NationalizeResponse =
            serde_json::from_str(r#"{"count": 0, "name": "zzzz"}"#).unwrap();
        assert!(candidates_from_wire(body).is_empty());
    }
}
