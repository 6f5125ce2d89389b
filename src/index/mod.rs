//! Full-text search index abstraction.
//!
//! Defines the [`SearchIndex`] trait and its implementations:
//! - **[`ElasticIndex`]** - an Elasticsearch-compatible HTTP backend.
//! - **[`InMemoryIndex`]** - process-local term-frequency scoring; used by
//!   tests and by deployments without a search backend.
//!
//! Use [`create_index`] to build the backend named by `[index].provider`.

mod elastic;
mod memory;

pub use elastic::ElasticIndex;
pub use memory::InMemoryIndex;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::models::{Report, SearchHit};

/// A full-text index over report bodies.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Insert or replace the document keyed by `report.id`.
    async fn index(&self, report: &Report) -> Result<()>;

    /// Match `term` against report text, best hits first.
    async fn search(&self, term: &str) -> Result<Vec<SearchHit>>;
}

pub fn create_index(config: &IndexConfig) -> Result<Arc<dyn SearchIndex>> {
    match config.provider.as_str() {
        "elasticsearch" => Ok(Arc::new(ElasticIndex::new(config)?)),
        "memory" => Ok(Arc::new(InMemoryIndex::new())),
        other => Err(Error::MalformedInput(format!(
            "unknown index provider: {}",
            other
        ))),
    }
}
