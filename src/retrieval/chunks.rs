//! Chunk-file retriever
//!
//! Loads the ingestion pipeline's chunk file (a JSON array of passages with
//! source metadata) and ranks passages by token overlap with the query.
//! Tokens are lowercased and stripped of punctuation before matching, so
//! "Library?" matches "library" but "are" never matches "ar".

use std::path::Path;

use async_trait::async_trait;

use crate::retrieval::{RetrievedContext, Retriever};
use crate::{Error, Result};

/// Minimum token length considered for overlap scoring
const MIN_TOKEN_LEN: usize = 3;

/// Retrieves passages from an in-memory chunk index
pub struct ChunkRetriever {
    chunks: Vec<RetrievedContext>,
}

impl ChunkRetriever {
    /// Load a chunk index from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Retrieval(format!("cannot read {}: {e}", path.display())))?;
        let chunks: Vec<RetrievedContext> = serde_json::from_str(&raw)
            .map_err(|e| Error::Retrieval(format!("cannot parse {}: {e}", path.display())))?;

        if chunks.is_empty() {
            tracing::warn!(path = %path.display(), "chunk file is empty");
        } else {
            tracing::info!(path = %path.display(), chunks = chunks.len(), "chunk index loaded");
        }

        Ok(Self { chunks })
    }

    /// Build a retriever from already-loaded chunks
    #[must_use]
    pub fn from_chunks(chunks: Vec<RetrievedContext>) -> Self {
        Self { chunks }
    }

    /// Number of indexed chunks
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Score a chunk by the number of query tokens its text contains
    fn score(query_tokens: &[String], text: &str) -> usize {
        let chunk_tokens: Vec<String> = tokenize(text);
        query_tokens
            .iter()
            .filter(|q| chunk_tokens.iter().any(|t| t == *q))
            .count()
    }
}

#[async_trait]
impl Retriever for ChunkRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedContext>> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, &RetrievedContext)> = self
            .chunks
            .iter()
            .map(|chunk| (Self::score(&query_tokens, &chunk.text), chunk))
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps ingestion order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(top_k);

        tracing::debug!(query = %query, matched = scored.len(), "chunk retrieval");
        Ok(scored.into_iter().map(|(_, chunk)| chunk.clone()).collect())
    }
}

/// Split text into lowercase alphanumeric tokens of useful length
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .collect()
}
