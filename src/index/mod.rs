//! Vector index
//!
//! In-memory k-nearest-neighbour search over one profile's documents with
//! metadata filtering applied before ranking.

pub mod filter;
pub mod store;

pub use filter::MetadataFilter;
pub use store::{IndexStats, SearchHit, VectorIndex};
