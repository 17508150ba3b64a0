pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{PopularityScope, Settings};
pub use error::{NameOriginError, Result};
pub use traits::{CountryCache, NationalityProvider, PopularityStore, PredictionCache};
pub use types::{
    sort_candidates, CountryCode, CountryDetail, NationalityCandidate, NormalizedName,
    PopularityEntry, PredictionRecord, RankedCountry,
};
