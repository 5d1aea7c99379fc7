//! Vector-store boundary: stored documents and the storage trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::SessionError;

/// A corpus chunk as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique chunk identifier.
    pub id: String,
    /// Chunk text.
    pub content: String,
    /// Corpus file the chunk was cut from.
    pub source: String,
}

/// A retrieved document with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Cosine similarity. Higher is closer.
    pub score: f32,
}

/// Storage backend for embedded corpus chunks.
///
/// Vectors from different embedding strategies are not comparable;
/// the signature methods record which embedder filled the store so a
/// mismatched reopen fails instead of silently returning noise.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embeddings in one transaction.
    async fn insert_batch(&self, items: Vec<(Document, Vec<f32>)>) -> Result<(), SessionError>;

    /// The `k` stored chunks closest to the query embedding, ordered
    /// by descending similarity.
    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>, SessionError>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize, SessionError>;

    /// Drop every stored chunk and the recorded signature.
    async fn clear(&self) -> Result<(), SessionError>;

    /// Signature of the embedder that ingested this store, if any.
    async fn embedding_signature(&self) -> Result<Option<String>, SessionError>;

    /// Record the embedder signature after an ingest.
    async fn set_embedding_signature(&self, signature: &str) -> Result<(), SessionError>;
}
