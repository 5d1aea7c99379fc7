//! Retrieval: corpus ingestion and similarity search over a vector
//! store.
//!
//! `build_retriever` is the session's entry point. It builds the
//! configured embedder, opens the store named by `persist_path` (or an
//! in-memory one), ingests the corpus when the store is empty, and
//! hands back a [`Retriever`] the answering chain can query.

pub mod chunker;
pub mod loader;
pub mod sqlite;
pub mod store;

pub use sqlite::SqliteVectorStore;
pub use store::{Document, ScoredDocument, VectorStore};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::embedding::{self, Embedder};
use crate::errors::SessionError;

use chunker::ChunkerConfig;

/// Chunks embedded per provider call during ingestion.
const EMBED_BATCH: usize = 32;

/// Similarity-search capability handed to the answering chain.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` stored documents closest to `query`, descending score.
    async fn retrieve(&self, query: &str, k: usize)
        -> Result<Vec<ScoredDocument>, SessionError>;
}

impl std::fmt::Debug for dyn Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever").finish_non_exhaustive()
    }
}

/// Embeds the query and searches the vector store.
pub struct VectorRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>, SessionError> {
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        if vectors.is_empty() {
            return Err(SessionError::Provider(
                "embedder returned no vector for the query".into(),
            ));
        }
        let query_embedding = vectors.remove(0);

        let hits = self.store.search(&query_embedding, k).await?;
        tracing::debug!("retrieved {} of {} requested documents", hits.len(), k);
        Ok(hits)
    }
}

/// Build the retrieval side of a session from its configuration.
pub async fn build_retriever(config: &SessionConfig) -> Result<Arc<dyn Retriever>, SessionError> {
    let embedder = embedding::build_embedder(config)?;

    let store: Arc<dyn VectorStore> = match &config.persist_path {
        Some(path) => Arc::new(SqliteVectorStore::open(path).await?),
        None => Arc::new(SqliteVectorStore::in_memory().await?),
    };

    prepare_store(config, embedder.as_ref(), store.as_ref()).await?;

    Ok(Arc::new(VectorRetriever::new(embedder, store)))
}

/// Ingest the corpus into an empty store; verify the embedding
/// signature on a populated one. A populated store with no recorded
/// signature is an interrupted ingest and is refused.
async fn prepare_store(
    config: &SessionConfig,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
) -> Result<(), SessionError> {
    let signature = embedding::signature(embedder);
    let count = store.count().await?;

    if let Some(existing) = store.embedding_signature().await? {
        if existing != signature {
            return Err(SessionError::Config(format!(
                "store was ingested with embedder {existing} but {signature} is configured; \
                 clear the store or align the embedding settings"
            )));
        }
    } else if count > 0 {
        // Chunks without a signature mean an ingest stopped between
        // batches and the store holds a partial corpus.
        return Err(SessionError::Storage(format!(
            "store holds {count} chunks but no embedding signature; an earlier \
             ingest was interrupted, clear the store to ingest again"
        )));
    }

    if count > 0 {
        tracing::debug!("vector store already populated; skipping ingest");
        return Ok(());
    }

    let Some(corpus) = &config.corpus_path else {
        return Ok(());
    };

    let inserted = ingest(corpus, embedder, store).await?;
    if inserted > 0 {
        store.set_embedding_signature(&signature).await?;
    }
    Ok(())
}

/// Load, chunk, embed and insert one corpus directory. Returns the
/// number of chunks inserted.
async fn ingest(
    corpus: &Path,
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
) -> Result<usize, SessionError> {
    let files = loader::load_corpus(corpus)?;
    let chunking = ChunkerConfig::default();

    let mut chunks = Vec::new();
    for file in &files {
        chunks.extend(chunker::split_text(&file.text, &file.source, &chunking));
    }

    if chunks.is_empty() {
        tracing::warn!("corpus {} produced no chunks", corpus.display());
        return Ok(0);
    }

    tracing::info!(
        "ingesting {} chunks from {} corpus files",
        chunks.len(),
        files.len()
    );

    for batch in chunks.chunks(EMBED_BATCH) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(SessionError::Provider(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        let items = batch
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                (
                    Document {
                        id: Uuid::new_v4().to_string(),
                        content: chunk.text.clone(),
                        source: chunk.source.clone(),
                    },
                    embedding,
                )
            })
            .collect();
        store.insert_batch(items).await?;
    }

    Ok(chunks.len())
}
