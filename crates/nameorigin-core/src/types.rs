use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{NameOriginError, Result};

/// Case-folded, whitespace-trimmed form of a queried name. The stable lookup
/// key for both the prediction cache and the popularity counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedName(String);

impl NormalizedName {
    /// Normalizes a raw queried name. Two inputs differing only in leading
    /// or trailing whitespace or letter case normalize identically.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(NameOriginError::InvalidInput(
                "name must not be empty".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ISO 3166-1 alpha-2 country code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    /// Format check only: exactly two ASCII letters. No existence validation
    /// against a country list.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(NameOriginError::InvalidInput(format!(
                "'{}' is not a 2-letter ISO 3166-1 alpha-2 country code",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (country, probability) pair returned by the nationality-prediction
/// service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalityCandidate {
    pub country_code: CountryCode,
    pub probability: f64,
}

/// Sorts candidates descending by probability; ties broken by country code
/// ascending so result ordering is deterministic.
pub fn sort_candidates(candidates: &mut [NationalityCandidate]) {
    candidates.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.country_code.cmp(&b.country_code))
    });
}

/// Enrichment data for a candidate country, as served by the country
/// metadata service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryDetail {
    pub country_code: CountryCode,
    pub common_name: String,
    pub official_name: Option<String>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub population: Option<u64>,
    pub independent: Option<bool>,
    pub capital: Option<String>,
    pub capital_latitude: Option<f64>,
    pub capital_longitude: Option<f64>,
    pub flag_png_url: Option<String>,
    pub flag_svg_url: Option<String>,
    pub flag_alt: Option<String>,
    pub google_maps_url: Option<String>,
    pub open_street_map_url: Option<String>,
    pub borders: Option<Vec<String>>,
}

/// One ranked entry of a prediction: the candidate plus its country
/// metadata. `detail` is `None` when the metadata lookup failed; the
/// candidate itself is still reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCountry {
    pub candidate: NationalityCandidate,
    pub detail: Option<CountryDetail>,
}

/// The unit stored in the prediction cache, keyed by normalized name.
/// Overwritten whole on refresh, never partially mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub name: NormalizedName,
    pub countries: Vec<RankedCountry>,
    pub fetched_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(name: NormalizedName, countries: Vec<RankedCountry>) -> Self {
        Self {
            name,
            countries,
            fetched_at: Utc::now(),
        }
    }

    /// A record is usable while `now - fetched_at < ttl`. A TTL of zero
    /// seconds means records never expire, as does a TTL too large for
    /// chrono to represent.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        if ttl_secs == 0 {
            return true;
        }
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds);
        match ttl {
            Some(ttl) => now.signed_duration_since(self.fetched_at) < ttl,
            None => true,
        }
    }

    /// The top-ranked candidate's country, if any.
    pub fn top_country(&self) -> Option<&CountryCode> {
        self.countries
            .first()
            .map(|ranked| &ranked.candidate.country_code)
    }
}

/// One row of a "most popular names for country X" answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularityEntry {
    pub country_code: CountryCode,
    pub name: NormalizedName,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cc(code: &str) -> CountryCode {
        CountryCode::parse(code).unwrap()
    }

    #[test]
    fn normalization_trims_and_casefolds() {
        let a = NormalizedName::parse("  Anna ").unwrap();
        let b = NormalizedName::parse("anna").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "anna");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = NormalizedName::parse("  JosÉ ").unwrap();
        let twice = NormalizedName::parse(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(NormalizedName::parse("   ").is_err());
        assert!(NormalizedName::parse("").is_err());
    }

    #[test]
    fn country_code_format_check() {
        assert_eq!(cc("us").as_str(), "US");
        assert!(CountryCode::parse("U1").is_err());
        assert!(CountryCode::parse("USA").is_err());
        assert!(CountryCode::parse("").is_err());
    }

    #[test]
    fn candidate_ordering_is_deterministic() {
        let mut candidates = vec![
            NationalityCandidate { country_code: cc("UA"), probability: 0.3 },
            NationalityCandidate { country_code: cc("PL"), probability: 0.3 },
            NationalityCandidate { country_code: cc("US"), probability: 0.5 },
        ];
        sort_candidates(&mut candidates);
        let codes: Vec<&str> = candidates
            .iter()
            .map(|c| c.country_code.as_str())
            .collect();
        assert_eq!(codes, vec!["US", "PL", "UA"]);
    }

    #[test]
    fn freshness_respects_ttl() {
        let name = NormalizedName::parse("anna").unwrap();
        let mut record = PredictionRecord::new(name, vec![]);
        record.fetched_at = Utc::now() - chrono::Duration::seconds(120);

        assert!(!record.is_fresh(Utc::now(), 60));
        assert!(record.is_fresh(Utc::now(), 3600));
        // ttl = 0 means never expire
        assert!(record.is_fresh(Utc::now(), 0));
    }

    #[test]
    fn oversized_ttl_means_never_expire() {
        let name = NormalizedName::parse("anna").unwrap();
        let mut record = PredictionRecord::new(name, vec![]);
        record.fetched_at = Utc::now() - chrono::Duration::days(365);

        // beyond chrono's representable range; must not panic
        assert!(record.is_fresh(Utc::now(), u64::MAX));
        assert!(record.is_fresh(Utc::now(), i64::MAX as u64));
    }
}
