//! Sparse (BM25) retrieval over a corpus snapshot

use super::store::Corpus;
use crate::error::Result;
use crate::types::ScoredDocument;
use tracing::debug;

/// BM25 retriever; the index itself lives in the [`Corpus`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SparseRetriever;

impl SparseRetriever {
    /// Best `top_k` documents with a strictly positive BM25 score
    pub fn search(&self, corpus: &Corpus, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let hits = corpus.bm25().search(query, top_k)?;
        debug!("BM25 search: {} results", hits.len());

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                corpus
                    .documents()
                    .get(hit.position)
                    .map(|doc| ScoredDocument::new(doc.scored(hit.score), hit.score))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;

    fn corpus(contents: &[&str]) -> Corpus {
        let documents: Vec<Document> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| Document::new(format!("d{}", i), *c))
            .collect();
        let embeddings = vec![vec![1.0, 0.0]; documents.len()];
        Corpus::build(documents, embeddings, 15_000_000).unwrap()
    }

    #[test]
    fn test_hits_map_to_documents_with_scores() {
        let corpus = corpus(&["stocks rallied", "inflation data surprised", "bonds sold off"]);
        let results = SparseRetriever.search(&corpus, "inflation", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), "d1");
        assert!(results[0].score > 0.0);
        assert_eq!(results[0].document.score, results[0].score);
    }

    #[test]
    fn test_whitespace_query_returns_nothing() {
        let corpus = corpus(&["stocks rallied"]);
        assert!(SparseRetriever.search(&corpus, " \t ", 10).unwrap().is_empty());
    }
}
