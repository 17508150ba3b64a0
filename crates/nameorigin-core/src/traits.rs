use async_trait::async_trait;

use crate::{
    CountryCode, CountryDetail, NationalityCandidate, NormalizedName, PopularityEntry,
    PredictionRecord, Result,
};

/// The two remote prediction/lookup services, seen as one collaborator.
///
/// Implementations perform a single bounded attempt per call; retry policy
/// belongs to the caller.
#[async_trait]
pub trait NationalityProvider: Send + Sync {
    /// Candidate nationalities for a raw (non-normalized) name, ordered by
    /// descending probability. An empty list is a legitimate answer, not an
    /// error.
    async fn fetch_candidates(&self, raw_name: &str) -> Result<Vec<NationalityCandidate>>;

    /// Metadata for one candidate country.
    async fn fetch_country_detail(&self, country_code: &CountryCode) -> Result<CountryDetail>;
}

/// Durable name → last-known-prediction mapping.
#[async_trait]
pub trait PredictionCache: Send + Sync {
    async fn get(&self, name: &NormalizedName) -> Result<Option<PredictionRecord>>;

    /// Upsert; replaces any existing record for the key. Concurrent puts for
    /// one key are last-write-wins.
    async fn put(&self, record: &PredictionRecord) -> Result<()>;
}

/// Durable country-metadata cache. Country records are fetched at most once;
/// no staleness policy applies.
#[async_trait]
pub trait CountryCache: Send + Sync {
    async fn get_country(&self, country_code: &CountryCode) -> Result<Option<CountryDetail>>;

    async fn put_country(&self, detail: &CountryDetail) -> Result<()>;
}

/// Durable (country, name) → access-count mapping.
#[async_trait]
pub trait PopularityStore: Send + Sync {
    /// Atomically creates-or-increments the entry for the pair. N concurrent
    /// increments of one pair must yield exactly +N.
    async fn increment(&self, country_code: &CountryCode, name: &NormalizedName) -> Result<()>;

    /// Top entries for a country, descending by count, ties broken by name
    /// ascending. At most `limit` entries; empty when the country has none.
    async fn top_n(&self, country_code: &CountryCode, limit: usize)
        -> Result<Vec<PopularityEntry>>;
}
