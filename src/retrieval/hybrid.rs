//! Hybrid retrieval combining dense and sparse search
//!
//! dense + BM25 (optionally in parallel) -> RRF fusion -> truncation ->
//! cross-encoder style reranking. Every stage hands an immutable list to the
//! next; the shared corpus is never written by a query.

use super::{
    cancel::{CancellationToken, QueryContext},
    fusion::{fuse, FusedDocument},
    reranker::{PairwiseScorer, Reranker},
    scorers::create_scorer,
    store::{Corpus, DocumentStore},
};
use crate::config::{Config, RetrievalConfig};
use crate::embedding::{create_backend, EmbeddingBackend};
use crate::error::{Result, RetrievalError};
use crate::graph::{
    open_configured_graph, GraphContext, GraphNode, GraphQueryOptions, KnowledgeGraph,
};
use crate::types::{Document, DocumentId, RetrievalMethod, ScoredDocument, StageScore};
use crate::util::truncate_str;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Parameters of one retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    pub query: String,
    pub dense_k: usize,
    pub sparse_k: usize,
    pub final_k: usize,
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>, dense_k: usize, sparse_k: usize, final_k: usize) -> Self {
        Self {
            query: query.into(),
            dense_k,
            sparse_k,
            final_k,
        }
    }

    /// Request using the configured candidate depths and final count
    pub fn from_config(query: impl Into<String>, config: &RetrievalConfig) -> Self {
        Self::new(query, config.dense_k, config.sparse_k, config.final_k)
    }
}

/// Why a returned document is where it is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub id: DocumentId,
    pub dense_rank: Option<usize>,
    pub sparse_rank: Option<usize>,
    pub fusion_score: f32,
    pub rerank_score: f32,
    pub matched_by: Vec<RetrievalMethod>,
}

/// Counts and timing for one retrieval
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalMetadata {
    pub query: String,
    pub total_documents: usize,
    pub dense_retrieved: usize,
    pub sparse_retrieved: usize,
    pub fused_candidates: usize,
    pub rerank_candidates: usize,
    pub final_count: usize,
    pub elapsed_ms: u64,
}

/// Output of [`HybridRetrievalPipeline::retrieve`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    /// Final documents; each `score` is its rerank score
    pub documents: Vec<Document>,
    pub dense_scores: Vec<StageScore>,
    pub sparse_scores: Vec<StageScore>,
    pub fusion_scores: Vec<StageScore>,
    pub rerank_scores: Vec<StageScore>,
    /// One entry per returned document, same order
    pub explanations: Vec<Explanation>,
    pub metadata: RetrievalMetadata,
}

/// Document retrieval plus knowledge-graph context for the same query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridContext {
    pub retrieval: RetrievalResult,
    pub graph: Option<GraphContext>,
}

fn stage_scores(list: &[ScoredDocument]) -> Vec<StageScore> {
    list.iter().map(StageScore::from).collect()
}

/// Hybrid retrieval pipeline over one document store
#[derive(Debug)]
pub struct HybridRetrievalPipeline {
    store: DocumentStore,
    reranker: Reranker,
    graph: Option<Arc<KnowledgeGraph>>,
    config: RetrievalConfig,
    graph_options: GraphQueryOptions,
}

impl HybridRetrievalPipeline {
    /// Create a pipeline around an embedding function and a pairwise scorer
    pub fn new(
        backend: Arc<dyn EmbeddingBackend>,
        scorer: Arc<dyn PairwiseScorer>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store: DocumentStore::new(backend, config.bm25_writer_memory_bytes),
            reranker: Reranker::new(scorer),
            graph: None,
            config,
            graph_options: GraphQueryOptions::default(),
        }
    }

    /// Attach a knowledge graph for [`Self::retrieve_with_graph`]
    pub fn with_graph(mut self, graph: Arc<KnowledgeGraph>, options: GraphQueryOptions) -> Self {
        self.graph = Some(graph);
        self.graph_options = options;
        self
    }

    /// Build backends, scorer and graph from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let backend = create_backend(&config.embedding)?;
        let scorer = create_scorer(&config.reranker)?;
        let pipeline = Self::new(backend, scorer, config.retrieval.clone());

        Ok(match open_configured_graph(&config.graph)? {
            Some(graph) => pipeline.with_graph(Arc::new(graph), GraphQueryOptions::from(&config.graph)),
            None => pipeline,
        })
    }

    /// Replace the indexed corpus
    pub fn index(&self, documents: Vec<Document>) -> Result<()> {
        self.store.index(documents)
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn graph(&self) -> Option<&Arc<KnowledgeGraph>> {
        self.graph.as_ref()
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    fn query_context(&self) -> QueryContext {
        match self.config.query_timeout_ms {
            Some(ms) => QueryContext::new().with_timeout(Duration::from_millis(ms)),
            None => QueryContext::new(),
        }
    }

    /// Run the full pipeline with the configured deadline
    pub fn retrieve(
        &self,
        query: &str,
        dense_k: usize,
        sparse_k: usize,
        final_k: usize,
    ) -> Result<RetrievalResult> {
        let request = RetrievalRequest::new(query, dense_k, sparse_k, final_k);
        self.retrieve_with(&request, &self.query_context())
    }

    /// Documents only, using the configured candidate depths
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<Document>> {
        let result = self.retrieve(query, self.config.dense_k, self.config.sparse_k, top_k)?;
        Ok(result.documents)
    }

    /// Documents plus graph context for the same query
    ///
    /// `graph` is `None` when no graph is attached.
    pub fn retrieve_with_graph(&self, query: &str, final_k: usize) -> Result<HybridContext> {
        let retrieval = self.retrieve(query, self.config.dense_k, self.config.sparse_k, final_k)?;
        let graph = self
            .graph
            .as_ref()
            .map(|g| g.query_with(query, &self.graph_options));
        Ok(HybridContext { retrieval, graph })
    }

    /// Entities matching `query` plus their neighbors up to the configured depth
    ///
    /// Empty when no graph is attached.
    pub fn related_entities(&self, query: &str) -> Vec<GraphNode> {
        self.graph.as_ref().map_or_else(Vec::new, |g| {
            g.related_context_with(query, &self.graph_options)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    /// Run the pipeline under an explicit context (cancellation, deadline)
    pub fn retrieve_with(&self, request: &RetrievalRequest, ctx: &QueryContext) -> Result<RetrievalResult> {
        let corpus = self.store.snapshot()?;
        let query = request.query.as_str();

        let mut metadata = RetrievalMetadata {
            query: request.query.clone(),
            total_documents: corpus.len(),
            ..Default::default()
        };

        if query.trim().is_empty() || request.final_k == 0 {
            metadata.elapsed_ms = ctx.elapsed().as_millis() as u64;
            return Ok(RetrievalResult {
                metadata,
                ..Default::default()
            });
        }

        // Stage 1: dense + sparse
        ctx.checkpoint("first-stage retrieval")?;
        let (dense, sparse) = self.first_stage(&corpus, query, request.dense_k, request.sparse_k)?;
        metadata.dense_retrieved = dense.len();
        metadata.sparse_retrieved = sparse.len();
        debug!("First stage: {} dense, {} sparse", dense.len(), sparse.len());

        // Stage 2: fusion
        ctx.checkpoint("fusion")?;
        let fused = fuse(&dense, &sparse, self.config.rrf_k);
        metadata.fused_candidates = fused.len();
        let fusion_scores: Vec<StageScore> = fused
            .iter()
            .map(|f| StageScore {
                id: f.document.id.clone(),
                score: f.rrf_score,
            })
            .collect();

        let candidates: Vec<ScoredDocument> = fused
            .iter()
            .take(self.config.max_rerank_candidates)
            .map(FusedDocument::as_scored)
            .collect();
        metadata.rerank_candidates = candidates.len();

        // Stage 3: reranking
        ctx.checkpoint("reranking")?;
        let reranked = self.reranker.rerank(query, &candidates, request.final_k)?;

        let by_id: HashMap<&str, &FusedDocument> =
            fused.iter().map(|f| (f.document.id.as_str(), f)).collect();
        let explanations: Vec<Explanation> = reranked
            .iter()
            .map(|r| {
                let entry = by_id.get(r.id());
                Explanation {
                    id: r.document.id.clone(),
                    dense_rank: entry.and_then(|f| f.dense_rank),
                    sparse_rank: entry.and_then(|f| f.sparse_rank),
                    fusion_score: entry.map_or(0.0, |f| f.rrf_score),
                    rerank_score: r.score,
                    matched_by: entry.map(|f| f.matched_by()).unwrap_or_default(),
                }
            })
            .collect();

        metadata.final_count = reranked.len();
        metadata.elapsed_ms = ctx.elapsed().as_millis() as u64;

        info!(
            "Hybrid search for '{}': {} results in {}ms",
            truncate_str(query, 50),
            reranked.len(),
            metadata.elapsed_ms
        );

        Ok(RetrievalResult {
            dense_scores: stage_scores(&dense),
            sparse_scores: stage_scores(&sparse),
            fusion_scores,
            rerank_scores: stage_scores(&reranked),
            explanations,
            documents: reranked.into_iter().map(|r| r.document).collect(),
            metadata,
        })
    }

    /// Dense and sparse search over the same corpus snapshot
    fn first_stage(
        &self,
        corpus: &Corpus,
        query: &str,
        dense_k: usize,
        sparse_k: usize,
    ) -> Result<(Vec<ScoredDocument>, Vec<ScoredDocument>)> {
        if !self.config.parallel_first_stage {
            let dense = self.store.dense().search(corpus, query, dense_k)?;
            let sparse = self.store.sparse().search(corpus, query, sparse_k)?;
            return Ok((dense, sparse));
        }

        std::thread::scope(|s| {
            let dense_handle = s.spawn(|| self.store.dense().search(corpus, query, dense_k));
            let sparse = self.store.sparse().search(corpus, query, sparse_k);
            let dense = match dense_handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            Ok((dense?, sparse?))
        })
    }

    /// Run a retrieval on the blocking pool with a hard deadline
    ///
    /// Returns `Timeout` once `budget` elapses even if an injected call is
    /// still blocked; the background query is cancelled and stops at its
    /// next stage boundary.
    pub async fn retrieve_with_timeout(
        self: Arc<Self>,
        request: RetrievalRequest,
        budget: Duration,
    ) -> Result<RetrievalResult> {
        let token = CancellationToken::new();
        let ctx = QueryContext::new()
            .with_timeout(budget)
            .with_cancellation(token.clone());

        let handle = tokio::task::spawn_blocking(move || self.retrieve_with(&request, &ctx));

        match tokio::time::timeout(budget, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                if join_error.is_panic() {
                    std::panic::resume_unwind(join_error.into_panic());
                }
                Err(RetrievalError::Cancelled)
            }
            Err(_) => {
                token.cancel();
                let budget_ms = budget.as_millis() as u64;
                warn!("Retrieval exceeded its {}ms budget, cancelling", budget_ms);
                Err(RetrievalError::Timeout {
                    elapsed_ms: budget_ms,
                    budget_ms,
                })
            }
        }
    }
}
