//! Document store: the indexed corpus shared by every query
//!
//! A [`Corpus`] is built in full (embeddings + BM25 index over the same
//! ordered document list) and only then published, so readers either see the
//! previous corpus or the new one, never a partial build.

use super::bm25::Bm25Index;
use super::dense::DenseRetriever;
use super::sparse::SparseRetriever;
use crate::embedding::EmbeddingBackend;
use crate::error::{Result, RetrievalError};
use crate::types::{Document, Embedding, ScoredDocument};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable indexed corpus
///
/// `documents[i]`, `embeddings[i]` and BM25 position `i` describe the same
/// document.
#[derive(Debug)]
pub struct Corpus {
    documents: Vec<Document>,
    embeddings: Vec<Embedding>,
    dimensions: usize,
    bm25: Bm25Index,
    positions: HashMap<String, usize>,
}

impl Corpus {
    /// Validate documents and their embeddings, then build the BM25 index
    pub fn build(
        documents: Vec<Document>,
        embeddings: Vec<Embedding>,
        writer_memory_bytes: usize,
    ) -> Result<Self> {
        if documents.is_empty() {
            return Err(RetrievalError::Index("no documents to index".to_string()));
        }

        let mut positions = HashMap::with_capacity(documents.len());
        for (position, doc) in documents.iter().enumerate() {
            if positions.insert(doc.id.clone(), position).is_some() {
                return Err(RetrievalError::Index(format!(
                    "duplicate document id '{}'",
                    doc.id
                )));
            }
        }

        if embeddings.len() != documents.len() {
            return Err(RetrievalError::Index(format!(
                "embedding backend returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 {
            return Err(RetrievalError::Index(
                "embedding backend returned zero-dimension vectors".to_string(),
            ));
        }
        if let Some((position, v)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dimensions)
        {
            return Err(RetrievalError::Index(format!(
                "embedding for '{}' has dimension {}, expected {}",
                documents[position].id,
                v.len(),
                dimensions
            )));
        }

        let bm25 = Bm25Index::build(&documents, writer_memory_bytes)?;

        Ok(Self {
            documents,
            embeddings,
            dimensions,
            bm25,
            positions,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn bm25(&self) -> &Bm25Index {
        &self.bm25
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.positions.get(id).map(|&p| &self.documents[p])
    }
}

/// Holds the current corpus and the first-stage retrievers
#[derive(Debug)]
pub struct DocumentStore {
    dense: DenseRetriever,
    sparse: SparseRetriever,
    writer_memory_bytes: usize,
    current: RwLock<Option<Arc<Corpus>>>,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, writer_memory_bytes: usize) -> Self {
        Self {
            dense: DenseRetriever::new(backend),
            sparse: SparseRetriever,
            writer_memory_bytes,
            current: RwLock::new(None),
        }
    }

    /// Replace the whole corpus
    ///
    /// Embeds every document with one batch call and builds the sparse index
    /// outside the lock. On error the previous corpus stays in place.
    pub fn index(&self, documents: Vec<Document>) -> Result<()> {
        if documents.is_empty() {
            return Err(RetrievalError::Index("no documents to index".to_string()));
        }

        let contents: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.dense.backend().embed_batch(&contents)?;
        debug!(
            "Embedded {} documents with '{}' backend",
            embeddings.len(),
            self.dense.backend().name()
        );

        let corpus = Corpus::build(documents, embeddings, self.writer_memory_bytes)?;
        let count = corpus.len();
        let dimensions = corpus.dimensions();

        *self.current.write() = Some(Arc::new(corpus));

        info!("Indexed {} documents ({} dimensions)", count, dimensions);
        Ok(())
    }

    /// Current corpus
    pub fn snapshot(&self) -> Result<Arc<Corpus>> {
        self.current.read().clone().ok_or(RetrievalError::NotIndexed)
    }

    pub fn is_indexed(&self) -> bool {
        self.current.read().is_some()
    }

    /// Number of indexed documents (0 before indexing)
    pub fn len(&self) -> usize {
        self.current.read().as_ref().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned copy of the document with `id`
    pub fn get(&self, id: &str) -> Option<Document> {
        self.current.read().as_ref().and_then(|c| c.get(id).cloned())
    }

    pub fn dense(&self) -> &DenseRetriever {
        &self.dense
    }

    pub fn sparse(&self) -> &SparseRetriever {
        &self.sparse
    }

    /// Dense search over the current corpus
    pub fn dense_search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        let corpus = self.snapshot()?;
        self.dense.search(&corpus, query, top_k)
    }

    /// BM25 search over the current corpus
    pub fn sparse_search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        let corpus = self.snapshot()?;
        self.sparse.search(&corpus, query, top_k)
    }
}
