//! Knowledge retrieval surface
//!
//! The router consumes ranked context passages through the [`Retriever`]
//! trait; [`ChunkRetriever`] is the built-in implementation over an ingested
//! chunk file.

mod chunks;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use chunks::ChunkRetriever;

/// Origin kind of a retrieved passage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Extracted from a PDF document
    Pdf,
    /// Scraped from a web page
    Web,
    /// Anything else
    #[serde(other)]
    Other,
}

/// One ranked context passage returned for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// Passage text
    pub text: String,

    /// Source identifier (document name, URL key)
    pub source: String,

    /// Source kind
    #[serde(rename = "source_type")]
    pub source_type: SourceType,
}

/// Returns ranked context passages for a query, best match first
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve up to `top_k` passages relevant to `query`
    ///
    /// May return fewer passages than requested, or none at all.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying store is unreachable or the query
    /// cannot be executed
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedContext>>;
}
