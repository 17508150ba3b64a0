use std::sync::Arc;

use chrono::Utc;
use nameorigin_core::{
    CountryCache, CountryCode, CountryDetail, NameOriginError, NationalityProvider,
    NormalizedName, PopularityEntry, PopularityScope, PopularityStore, PredictionCache,
    PredictionRecord, RankedCountry, Result, Settings,
};
use tracing::{debug, warn};

/// The slice of [`Settings`] the engine acts on.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seconds a cached prediction stays usable; `0` means never expire.
    pub cache_ttl: u64,
    pub popularity_scope: PopularityScope,
    /// Whether a pure cache hit also counts towards popularity. When false,
    /// popularity reflects upstream-fetch volume only.
    pub count_cache_hits: bool,
    /// Limit applied by [`AggregationEngine::most_popular`] when the caller
    /// does not pass one.
    pub popular_limit: usize,
}

impl From<&Settings> for EngineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            cache_ttl: settings.cache_ttl,
            popularity_scope: settings.popularity_scope,
            count_cache_hits: settings.count_cache_hits,
            popular_limit: settings.popular_limit,
        }
    }
}

/// The single path for turning a raw name into a usable prediction.
/// Enforces cache-then-fetch precedence and write-through consistency over
/// the shared stores.
pub struct AggregationEngine {
    provider: Arc<dyn NationalityProvider>,
    predictions: Arc<dyn PredictionCache>,
    countries: Arc<dyn CountryCache>,
    popularity: Arc<dyn PopularityStore>,
    config: EngineConfig,
}

impl AggregationEngine {
    /// Wires the engine to one store implementing all three store seams.
    pub fn new<S>(
        provider: Arc<dyn NationalityProvider>,
        store: Arc<S>,
        config: EngineConfig,
    ) -> Self
    where
        S: PredictionCache + CountryCache + PopularityStore + 'static,
    {
        Self::with_parts(provider, store.clone(), store.clone(), store, config)
    }

    pub fn with_parts(
        provider: Arc<dyn NationalityProvider>,
        predictions: Arc<dyn PredictionCache>,
        countries: Arc<dyn CountryCache>,
        popularity: Arc<dyn PopularityStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            predictions,
            countries,
            popularity,
            config,
        }
    }

    /// Produces the prediction record for a raw name, from cache when fresh,
    /// otherwise by aggregating the two upstream services and writing the
    /// result through to the cache.
    ///
    /// An empty candidate list is a legitimate answer and is cached like any
    /// other record; a failed upstream fetch surfaces as
    /// [`NameOriginError::PredictionUnavailable`] and caches nothing.
    pub async fn predict(&self, raw_name: &str) -> Result<PredictionRecord> {
        let name = NormalizedName::parse(raw_name)?;

        if let Some(record) = self.predictions.get(&name).await? {
            if record.is_fresh(Utc::now(), self.config.cache_ttl) {
                debug!(name = %name, "serving prediction from cache");
                if self.config.count_cache_hits {
                    self.record_popularity(&record).await?;
                }
                return Ok(record);
            }
            debug!(name = %name, "cached prediction is stale, refetching");
        }

        let candidates = self
            .provider
            .fetch_candidates(raw_name.trim())
            .await
            .map_err(|e| {
                warn!(name = %name, error = %e, "candidate fetch failed");
                e.into_prediction_unavailable()
            })?;

        let mut countries = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let detail = self.resolve_country_detail(&candidate.country_code).await?;
            countries.push(RankedCountry { candidate, detail });
        }

        let record = PredictionRecord::new(name, countries);
        self.predictions.put(&record).await?;
        self.record_popularity(&record).await?;
        Ok(record)
    }

    /// Country metadata, served from the country cache when present. A
    /// failed upstream lookup is recovered as `None` so one missing country
    /// never aborts the whole prediction; store failures still propagate.
    async fn resolve_country_detail(
        &self,
        country_code: &CountryCode,
    ) -> Result<Option<CountryDetail>> {
        if let Some(detail) = self.countries.get_country(country_code).await? {
            return Ok(Some(detail));
        }
        match self.provider.fetch_country_detail(country_code).await {
            Ok(detail) => {
                self.countries.put_country(&detail).await?;
                Ok(Some(detail))
            }
            Err(e) if e.is_upstream() => {
                warn!(country = %country_code, error = %e, "country metadata unavailable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn record_popularity(&self, record: &PredictionRecord) -> Result<()> {
        match self.config.popularity_scope {
            PopularityScope::TopCandidate => {
                if let Some(top) = record.top_country() {
                    self.popularity.increment(top, &record.name).await?;
                }
            }
            PopularityScope::AllCandidates => {
                for ranked in &record.countries {
                    self.popularity
                        .increment(&ranked.candidate.country_code, &record.name)
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Most-queried names for a country, descending by count. The country
    /// code is format-checked before the counter store is touched; a missing
    /// limit falls back to the configured default.
    pub async fn most_popular(
        &self,
        country_code: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PopularityEntry>> {
        let code = CountryCode::parse(country_code)?;
        let limit = limit.unwrap_or(self.config.popular_limit);
        if limit == 0 {
            return Err(NameOriginError::InvalidInput(
                "limit must be greater than zero".to_string(),
            ));
        }
        self.popularity.top_n(&code, limit).await
    }
}
