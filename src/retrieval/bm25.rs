//! BM25 lexical search using Tantivy
//!
//! Text is split on Unicode whitespace (NBSP included) and lower-cased,
//! nothing else: no stemming, no stop words, punctuation stays attached to
//! its token. Each indexed entry stores its corpus position so hits map back
//! to documents.
//!
//! Tokens longer than [`MAX_TOKEN_BYTES`] are dropped on both the index and
//! the query side, so a document whose only overlap with a query is such a
//! token is not found by sparse search.

use crate::types::Document;
use tantivy::{
    collector::TopDocs,
    query::{BooleanQuery, Occur, Query, TermQuery},
    schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED},
    tokenizer::{LowerCaser, RemoveLongFilter, TextAnalyzer, Token, TokenStream, Tokenizer},
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
};
use std::str::CharIndices;
use tracing::debug;

const TOKENIZER_NAME: &str = "finrag_whitespace_lower";

/// Tokens longer than this are dropped (tantivy cannot index huge terms)
pub const MAX_TOKEN_BYTES: usize = 255;

/// In-memory BM25 index over one corpus snapshot
pub struct Bm25Index {
    reader: IndexReader,
    schema: Bm25Schema,
    analyzer: TextAnalyzer,
    num_docs: usize,
}

/// Schema fields for BM25 index
struct Bm25Schema {
    position: Field,
    content: Field,
}

/// BM25 hit, identified by corpus position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Hit {
    pub position: usize,
    pub score: f32,
}

/// Splits on `char::is_whitespace`
///
/// tantivy's own `WhitespaceTokenizer` only splits on ASCII whitespace.
#[derive(Debug, Clone, Default)]
struct UnicodeWhitespaceTokenizer {
    token: Token,
}

struct UnicodeWhitespaceTokenStream<'a> {
    text: &'a str,
    chars: CharIndices<'a>,
    token: &'a mut Token,
}

impl Tokenizer for UnicodeWhitespaceTokenizer {
    type TokenStream<'a> = UnicodeWhitespaceTokenStream<'a>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        self.token = Token::default();
        UnicodeWhitespaceTokenStream {
            text,
            chars: text.char_indices(),
            token: &mut self.token,
        }
    }
}

impl UnicodeWhitespaceTokenStream<'_> {
    fn token_end(&mut self) -> usize {
        (&mut self.chars)
            .find(|(_, c)| c.is_whitespace())
            .map_or(self.text.len(), |(offset, _)| offset)
    }
}

impl TokenStream for UnicodeWhitespaceTokenStream<'_> {
    fn advance(&mut self) -> bool {
        self.token.text.clear();
        self.token.position = self.token.position.wrapping_add(1);
        while let Some((offset_from, c)) = self.chars.next() {
            if !c.is_whitespace() {
                let offset_to = self.token_end();
                self.token.offset_from = offset_from;
                self.token.offset_to = offset_to;
                self.token.text.push_str(&self.text[offset_from..offset_to]);
                return true;
            }
        }
        false
    }

    fn token(&self) -> &Token {
        self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        self.token
    }
}

fn has_oversized_token(text: &str) -> bool {
    text.split_whitespace().any(|t| t.len() > MAX_TOKEN_BYTES)
}

fn whitespace_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(UnicodeWhitespaceTokenizer::default())
        .filter(RemoveLongFilter::limit(MAX_TOKEN_BYTES))
        .filter(LowerCaser)
        .build()
}

/// Lower-cased whitespace tokens, as indexed by BM25
pub fn tokenize(text: &str) -> Vec<String> {
    let mut analyzer = whitespace_analyzer();
    collect_tokens(&mut analyzer, text)
}

fn collect_tokens(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        tokens.push(stream.token().text.clone());
    }
    tokens
}

impl std::fmt::Debug for Bm25Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bm25Index")
            .field("num_docs", &self.num_docs)
            .finish_non_exhaustive()
    }
}

impl Bm25Index {
    /// Build an index over `documents`, in order
    pub fn build(documents: &[Document], writer_memory_bytes: usize) -> tantivy::Result<Self> {
        let (schema, fields) = Self::build_schema();
        let index = Index::create_in_ram(schema);
        index
            .tokenizers()
            .register(TOKENIZER_NAME, whitespace_analyzer());

        // Single indexing thread keeps the whole corpus in one segment
        let mut writer: IndexWriter = index.writer_with_num_threads(1, writer_memory_bytes)?;
        for (position, document) in documents.iter().enumerate() {
            let mut doc = TantivyDocument::new();
            doc.add_u64(fields.position, position as u64);
            doc.add_text(fields.content, &document.content);
            writer.add_document(doc)?;
        }
        writer.commit()?;

        let oversized = documents
            .iter()
            .filter(|d| has_oversized_token(&d.content))
            .count();
        if oversized > 0 {
            debug!(
                "{} documents contain tokens over {} bytes; those tokens are not indexed",
                oversized, MAX_TOKEN_BYTES
            );
        }

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        debug!("BM25 index built over {} documents", documents.len());

        Ok(Self {
            reader,
            schema: fields,
            analyzer: whitespace_analyzer(),
            num_docs: documents.len(),
        })
    }

    fn build_schema() -> (Schema, Bm25Schema) {
        let mut schema_builder = Schema::builder();

        let content_options = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(TOKENIZER_NAME)
                .set_index_option(IndexRecordOption::WithFreqs),
        );

        let position = schema_builder.add_u64_field("position", STORED);
        let content = schema_builder.add_text_field("content", content_options);

        (schema_builder.build(), Bm25Schema { position, content })
    }

    pub fn len(&self) -> usize {
        self.num_docs
    }

    pub fn is_empty(&self) -> bool {
        self.num_docs == 0
    }

    /// Score every document against `query_text` and return the best `k`
    ///
    /// Only strictly positive scores are returned. Ties keep corpus order.
    pub fn search(&self, query_text: &str, k: usize) -> tantivy::Result<Vec<Bm25Hit>> {
        if k == 0 || self.num_docs == 0 {
            return Ok(Vec::new());
        }

        if has_oversized_token(query_text) {
            debug!("Query tokens over {} bytes are ignored by BM25", MAX_TOKEN_BYTES);
        }

        let mut analyzer = self.analyzer.clone();
        let terms = collect_tokens(&mut analyzer, query_text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        // One SHOULD clause per query token; repeated tokens count repeatedly
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|token| {
                let term = Term::from_field_text(self.schema.content, token);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, query)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        // Collect every match so the tie-break below is applied before the cut
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(self.num_docs))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            if score <= 0.0 {
                continue;
            }
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            if let Some(position) = doc
                .get_first(self.schema.position)
                .and_then(|v| v.as_u64())
            {
                hits.push(Bm25Hit {
                    position: position as usize,
                    score,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.position.cmp(&b.position))
        });
        hits.truncate(k);

        debug!("BM25 search for '{}': {} results", query_text, hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(contents: &[&str]) -> Bm25Index {
        let docs: Vec<Document> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| Document::new(format!("d{}", i), *c))
            .collect();
        Bm25Index::build(&docs, 15_000_000).unwrap()
    }

    #[test]
    fn test_bm25_search() {
        let index = build(&[
            "The quick brown fox jumps over the lazy dog",
            "A fast cat runs across the street",
        ]);

        let results = index.search("fox jumps", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].position, 0);
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn test_zero_overlap_documents_are_excluded() {
        let index = build(&[
            "inflation erodes purchasing power",
            "bond prices fall when rates rise",
            "equity markets rallied",
        ]);

        let results = index.search("inflation", 100).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].position, 0);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let index = build(&["Sharpe Ratio measures risk-adjusted return"]);
        let results = index.search("SHARPE", 5).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_no_stemming_or_punctuation_stripping() {
        let index = build(&["interest rates, bonds."]);
        assert!(index.search("rate", 5).unwrap().is_empty());
        assert!(index.search("bonds", 5).unwrap().is_empty());
        assert_eq!(index.search("bonds.", 5).unwrap().len(), 1);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let index = build(&[
            "unrelated text",
            "volatility drives value at risk",
            "volatility drives value at risk",
        ]);
        let results = index.search("volatility", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, results[1].score);
        assert_eq!(results[0].position, 1);
        assert_eq!(results[1].position, 2);
    }

    #[test]
    fn test_top_k_truncates() {
        let index = build(&["risk one", "risk two", "risk three", "risk four"]);
        assert_eq!(index.search("risk", 2).unwrap().len(), 2);
        assert!(index.search("risk", 0).unwrap().is_empty());
    }

    #[test]
    fn test_higher_term_frequency_ranks_first() {
        let index = build(&[
            "liquidity matters",
            "liquidity liquidity liquidity matters",
            "nothing relevant here",
        ]);
        let results = index.search("liquidity", 10).unwrap();
        assert_eq!(results[0].position, 1);
        assert_eq!(results[1].position, 0);
    }

    #[test]
    fn test_empty_query_returns_empty() {
        let index = build(&["some content here"]);
        assert!(index.search("", 10).unwrap().is_empty());
        assert!(index.search("   ", 10).unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_lowercases_and_splits_on_whitespace() {
        assert_eq!(
            tokenize("Interest  Rate\tHikes"),
            vec!["interest", "rate", "hikes"]
        );
    }

    #[test]
    fn test_tokenize_splits_on_unicode_whitespace() {
        assert_eq!(
            tokenize("Yield\u{00A0}Curve\u{2003}inverted"),
            vec!["yield", "curve", "inverted"]
        );
        assert!(tokenize("\u{00A0}\u{3000}").is_empty());
    }

    #[test]
    fn test_nbsp_joined_terms_are_searchable() {
        let index = build(&["yield\u{00A0}curve inverted", "equities rallied"]);
        let results = index.search("curve", 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].position, 0);
    }

    #[test]
    fn test_oversized_tokens_are_not_indexed() {
        let long = "x".repeat(MAX_TOKEN_BYTES + 1);
        let content = format!("{} filing", long);
        let index = build(&[content.as_str()]);
        assert!(index.search(&long, 5).unwrap().is_empty());
        assert_eq!(index.search("filing", 5).unwrap().len(), 1);
    }
}
