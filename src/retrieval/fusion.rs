//! Result fusion strategies
//!
//! Implements Reciprocal Rank Fusion (RRF) for combining results
//! from multiple retrieval methods

use crate::types::{Document, DocumentId, RetrievalMethod, ScoredDocument};
use std::collections::HashMap;

/// Reciprocal Rank Fusion (RRF) parameters
#[derive(Debug, Clone)]
pub struct RrfConfig {
    /// K parameter for RRF (default: 60)
    pub k: usize,
}

impl Default for RrfConfig {
    fn default() -> Self {
        Self { k: 60 }
    }
}

/// A ranked result from a single retrieval method
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub id: DocumentId,
    pub rank: usize,
    pub original_score: f32,
    pub method: RetrievalMethod,
}

/// Fused result after combining multiple ranking sources
#[derive(Debug, Clone)]
pub struct FusedResult {
    pub id: DocumentId,
    pub rrf_score: f32,
    pub contributing_methods: Vec<RetrievalMethod>,
    pub rank_per_method: HashMap<RetrievalMethod, usize>,
}

/// Compute Reciprocal Rank Fusion score for multiple ranking lists
///
/// RRF score = Σ 1/(k + rank_r(d)) for all rankers r
///
/// Works on ranks rather than scores, so heterogeneous retrieval methods need
/// no calibration. Equal scores keep first-seen order across the lists.
pub fn reciprocal_rank_fusion(
    ranked_lists: &[Vec<RankedResult>],
    config: &RrfConfig,
) -> Vec<FusedResult> {
    let mut results: Vec<FusedResult> = Vec::new();
    let mut slots: HashMap<DocumentId, usize> = HashMap::new();

    for list in ranked_lists {
        for result in list {
            let rrf_contribution = 1.0 / (config.k as f32 + result.rank as f32);

            match slots.get(&result.id) {
                Some(&slot) => {
                    let fused = &mut results[slot];
                    fused.rrf_score += rrf_contribution;
                    if !fused.contributing_methods.contains(&result.method) {
                        fused.contributing_methods.push(result.method);
                    }
                    // Best rank wins if a list repeats an id
                    fused
                        .rank_per_method
                        .entry(result.method)
                        .and_modify(|r| *r = (*r).min(result.rank))
                        .or_insert(result.rank);
                }
                None => {
                    slots.insert(result.id.clone(), results.len());
                    let mut rank_per_method = HashMap::new();
                    rank_per_method.insert(result.method, result.rank);
                    results.push(FusedResult {
                        id: result.id.clone(),
                        rrf_score: rrf_contribution,
                        contributing_methods: vec![result.method],
                        rank_per_method,
                    });
                }
            }
        }
    }

    // Stable: ties keep first-seen order
    results.sort_by(|a, b| b.rrf_score.total_cmp(&a.rrf_score));
    results
}

/// Convert raw search results to ranked results
pub fn to_ranked_results(results: &[(DocumentId, f32)], method: RetrievalMethod) -> Vec<RankedResult> {
    results
        .iter()
        .enumerate()
        .map(|(rank, (id, score))| RankedResult {
            id: id.clone(),
            rank: rank + 1, // 1-indexed ranks
            original_score: *score,
            method,
        })
        .collect()
}

/// A document after fusion, with its per-method ranks
#[derive(Debug, Clone, PartialEq)]
pub struct FusedDocument {
    /// Copy whose `score` is the fused score
    pub document: Document,
    pub rrf_score: f32,
    pub dense_rank: Option<usize>,
    pub sparse_rank: Option<usize>,
}

impl FusedDocument {
    pub fn matched_by(&self) -> Vec<RetrievalMethod> {
        let mut methods = Vec::with_capacity(2);
        if self.dense_rank.is_some() {
            methods.push(RetrievalMethod::Dense);
        }
        if self.sparse_rank.is_some() {
            methods.push(RetrievalMethod::Bm25);
        }
        methods
    }

    pub fn as_scored(&self) -> ScoredDocument {
        ScoredDocument::new(self.document.clone(), self.rrf_score)
    }
}

/// Fuse the dense and sparse candidate lists with RRF
pub fn fuse(dense: &[ScoredDocument], sparse: &[ScoredDocument], k: usize) -> Vec<FusedDocument> {
    let as_pairs = |list: &[ScoredDocument]| -> Vec<(DocumentId, f32)> {
        list.iter().map(|s| (s.document.id.clone(), s.score)).collect()
    };
    let ranked_lists = [
        to_ranked_results(&as_pairs(dense), RetrievalMethod::Dense),
        to_ranked_results(&as_pairs(sparse), RetrievalMethod::Bm25),
    ];
    let fused = reciprocal_rank_fusion(&ranked_lists, &RrfConfig { k });

    let mut by_id: HashMap<&str, &Document> = HashMap::new();
    for scored in dense.iter().chain(sparse.iter()) {
        by_id.entry(scored.document.id.as_str()).or_insert(&scored.document);
    }

    fused
        .into_iter()
        .filter_map(|result| {
            let doc = by_id.get(result.id.as_str())?;
            Some(FusedDocument {
                document: doc.scored(result.rrf_score),
                rrf_score: result.rrf_score,
                dense_rank: result.rank_per_method.get(&RetrievalMethod::Dense).copied(),
                sparse_rank: result.rank_per_method.get(&RetrievalMethod::Bm25).copied(),
            })
        })
        .collect()
}
