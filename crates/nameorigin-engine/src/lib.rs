//! The aggregation engine: normalize → cache check → fetch → merge →
//! write-through → count, plus the read-only popularity query.

pub mod engine;

pub use engine::{AggregationEngine, EngineConfig};
