use crate::OutputFormat;
use anyhow::{Context, Result};
use finrag::{
    config::Config,
    corpus::load_jsonl,
    graph::GraphQueryOptions,
    retrieval::{
        HybridContext, HybridRetrievalPipeline, QueryContext, RetrievalRequest, RetrievalResult,
    },
    util::truncate_str,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn search_corpus(
    config: Config,
    corpus: PathBuf,
    query: String,
    top_k: Option<usize>,
    with_graph: bool,
    format: OutputFormat,
) -> Result<()> {
    // Embedding backends may block on HTTP; keep them off the async workers
    let build_config = config.clone();
    let pipeline = tokio::task::spawn_blocking(move || -> Result<HybridRetrievalPipeline> {
        let documents = load_jsonl(&corpus)?;
        let pipeline = HybridRetrievalPipeline::from_config(&build_config)
            .context("Failed to build retrieval pipeline")?;
        pipeline.index(documents).context("Failed to index corpus")?;
        Ok(pipeline)
    })
    .await??;
    let pipeline = Arc::new(pipeline);

    info!("Searching for: {}", query);

    let mut request = RetrievalRequest::from_config(query.clone(), &config.retrieval);
    request.final_k = top_k.unwrap_or(config.retrieval.final_k);

    let retrieval = match config.retrieval.query_timeout_ms {
        Some(ms) => {
            Arc::clone(&pipeline)
                .retrieve_with_timeout(request, Duration::from_millis(ms))
                .await?
        }
        None => {
            let worker = Arc::clone(&pipeline);
            tokio::task::spawn_blocking(move || {
                worker.retrieve_with(&request, &QueryContext::new())
            })
            .await??
        }
    };

    let graph = if with_graph {
        let options = GraphQueryOptions::from(&config.graph);
        pipeline.graph().map(|g| g.query_with(&query, &options))
    } else {
        None
    };

    let context = HybridContext { retrieval, graph };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&context)?),
        OutputFormat::Text => print_text(&context),
    }
    Ok(())
}

fn print_text(context: &HybridContext) {
    let RetrievalResult {
        documents,
        explanations,
        metadata,
        ..
    } = &context.retrieval;

    println!(
        "\nSearch Results ({} of {} documents, {}ms):\n",
        documents.len(),
        metadata.total_documents,
        metadata.elapsed_ms
    );
    for (i, (doc, why)) in documents.iter().zip(explanations).enumerate() {
        let rank = |r: Option<usize>| r.map_or("-".to_string(), |r| r.to_string());
        println!("[{}] [Score: {:.4}] {}", i + 1, doc.score, doc.id);
        println!(
            "   dense #{} | bm25 #{} | rrf {:.4}",
            rank(why.dense_rank),
            rank(why.sparse_rank),
            why.fusion_score
        );
        if !doc.source.is_empty() {
            println!("   Source: {}", doc.source);
        }
        println!("   {}", truncate_str(&doc.content, 200));
        println!();
    }

    if let Some(graph) = &context.graph {
        println!("Graph context: {}", graph.description);
    }
}
