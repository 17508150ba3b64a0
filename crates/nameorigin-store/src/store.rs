use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nameorigin_core::{
    CountryCache, CountryCode, CountryDetail, NameOriginError, NormalizedName, PredictionCache,
    PredictionRecord, RankedCountry, Result,
};
use rocksdb::{ColumnFamilyDescriptor, Options, DB};
use serde::{Deserialize, Serialize};
use tokio::task;
use tracing::info;

use crate::popularity::popularity_cf_options;

/// Column family holding name → prediction records.
pub const CF_PREDICTIONS: &str = "predictions";
/// Column family holding country code → country metadata.
pub const CF_COUNTRIES: &str = "countries";
/// Column family holding (country, name) → access counts.
pub const CF_POPULARITY: &str = "popularity";

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: String,
    pub enable_compression: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "data/nameorigin.db".to_string(),
            enable_compression: true,
        }
    }
}

/// Serializable prediction record for storage; timestamps flattened to unix
/// seconds.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPrediction {
    name: NormalizedName,
    countries: Vec<RankedCountry>,
    fetched_at_unix: i64,
}

impl From<&PredictionRecord> for StoredPrediction {
    fn from(record: &PredictionRecord) -> Self {
        Self {
            name: record.name.clone(),
            countries: record.countries.clone(),
            fetched_at_unix: record.fetched_at.timestamp(),
        }
    }
}

impl From<StoredPrediction> for PredictionRecord {
    fn from(stored: StoredPrediction) -> Self {
        let fetched_at: DateTime<Utc> = Utc
            .timestamp_opt(stored.fetched_at_unix, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            name: stored.name,
            countries: stored.countries,
            fetched_at,
        }
    }
}

/// Durable backing store for the aggregation core: the prediction cache, the
/// country metadata cache and the popularity counters, one RocksDB column
/// family each.
#[derive(Clone)]
pub struct PersistentStore {
    pub(crate) db: Arc<DB>,
}

impl PersistentStore {
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        if config.enable_compression {
            db_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_PREDICTIONS, Options::default()),
            ColumnFamilyDescriptor::new(CF_COUNTRIES, Options::default()),
            ColumnFamilyDescriptor::new(CF_POPULARITY, popularity_cf_options()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, &config.db_path, cf_descriptors)
            .map_err(|e| NameOriginError::Store(format!("failed to open database: {}", e)))?;

        info!("opened persistent store at {}", config.db_path);

        Ok(Self { db: Arc::new(db) })
    }

    pub(crate) async fn raw_put(&self, cf_name: &'static str, key: String, value: Vec<u8>) -> Result<()> {
        let db = self.db.clone();
        task::spawn_blocking(move || {
            let cf = db
                .cf_handle(cf_name)
                .ok_or_else(|| NameOriginError::Store(format!("column family '{}' not found", cf_name)))?;
            db.put_cf(cf, key.as_bytes(), &value)
                .map_err(|e| NameOriginError::Store(format!("write failed: {}", e)))
        })
        .await
        .map_err(|e| NameOriginError::Store(format!("task failed: {}", e)))?
    }

    pub(crate) async fn raw_get(&self, cf_name: &'static str, key: String) -> Result<Option<Vec<u8>>> {
        let db = self.db.clone();
        task::spawn_blocking(move || {
            let cf = db
                .cf_handle(cf_name)
                .ok_or_else(|| NameOriginError::Store(format!("column family '{}' not found", cf_name)))?;
            db.get_cf(cf, key.as_bytes())
                .map_err(|e| NameOriginError::Store(format!("read failed: {}", e)))
        })
        .await
        .map_err(|e| NameOriginError::Store(format!("task failed: {}", e)))?
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| NameOriginError::Store(format!("serialization failed: {}", e)))
}

pub(crate) fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| NameOriginError::Store(format!("deserialization failed: {}", e)))
}

#[async_trait]
impl PredictionCache for PersistentStore {
    async fn get(&self, name: &NormalizedName) -> Result<Option<PredictionRecord>> {
        match self.raw_get(CF_PREDICTIONS, name.as_str().to_string()).await? {
            Some(bytes) => {
                let stored: StoredPrediction = decode(&bytes)?;
                Ok(Some(stored.into()))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, record: &PredictionRecord) -> Result<()> {
        let bytes = encode(&StoredPrediction::from(record))?;
        self.raw_put(CF_PREDICTIONS, record.name.as_str().to_string(), bytes)
            .await
    }
}

#[async_trait]
impl CountryCache for PersistentStore {
    async fn get_country(&self, country_code: &CountryCode) -> Result<Option<CountryDetail>> {
        match self.raw_get(CF_COUNTRIES, country_code.as_str().to_string()).await? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_country(&self, detail: &CountryDetail) -> Result<()> {
        let bytes = encode(detail)?;
        self.raw_put(CF_COUNTRIES, detail.country_code.as_str().to_string(), bytes)
            .await
    }
}
