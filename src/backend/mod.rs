//! Query backend abstraction for Chado annotation data.
//!
//! The core reaches the data store only through [`Backend`], which exposes
//! exactly the four reads the service needs. Implementations must be safe to
//! share across concurrently running requests.
//!
//! # Implementations
//!
//! - [`PostgresBackend`] - a live Chado database (feature `postgres`)
//! - [`MemoryBackend`] - a JSON dataset held in memory
//! - [`Deadline`] - wraps another backend with a per-query timeout
//!
//! # Example
//!
//! ```no_run
//! use chado_jbrowse::backend::{Backend, MemoryBackend};
//!
//! # async fn run() -> chado_jbrowse::Result<()> {
//! let backend = MemoryBackend::from_path("./data/demo.json")?;
//! let organisms = backend.list_organisms().await?;
//! # Ok(())
//! # }
//! ```

mod deadline;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use deadline::Deadline;
pub use memory::{Dataset, LocatedFeature, MemoryBackend, OrganismData, SequenceData};
#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;

use crate::{
    Result,
    types::{FeatureTypeCategory, Organism, RangeQueryResult},
};
use async_trait::async_trait;

/// Reference sequence row before display bounds are attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSequenceRow {
    pub name: String,
    pub length: i64,
}

/// Bounded read against a single reference sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFetch<'a> {
    /// Residues from `start`, at most `length` of them
    Sequence {
        organism: &'a str,
        ref_seq: &'a str,
        start: i64,
        length: i64,
    },
    /// Features overlapping `[start, end)`; an empty `so_type` matches every type
    Features {
        organism: &'a str,
        ref_seq: &'a str,
        so_type: &'a str,
        start: i64,
        end: i64,
    },
}

/// Read-only access to organisms, feature types, reference sequences and ranges
#[async_trait]
pub trait Backend: Send + Sync {
    /// List every organism
    async fn list_organisms(&self) -> Result<Vec<Organism>>;

    /// Distinct feature types annotated for an organism, in backend order
    async fn list_feature_types(&self, organism: &str) -> Result<Vec<FeatureTypeCategory>>;

    /// Reference sequences of an organism
    async fn list_reference_sequences(&self, organism: &str) -> Result<Vec<ReferenceSequenceRow>>;

    /// Fetch raw rows for a range. The variant of the result matches the request.
    async fn fetch_range(&self, request: &RangeFetch<'_>) -> Result<RangeQueryResult>;
}
