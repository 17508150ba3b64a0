//! Durable state for the aggregation core: the name → prediction cache, the
//! country metadata cache and the (country, name) popularity counters.
//!
//! All three live in one RocksDB database, one column family each. Blocking
//! database calls run on the blocking thread pool. Counter increments go
//! through an associative merge operator so concurrent increments of one
//! pair always sum.

pub mod popularity;
pub mod store;

pub use store::{PersistentStore, StoreConfig, CF_COUNTRIES, CF_POPULARITY, CF_PREDICTIONS};
