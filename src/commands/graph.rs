use crate::OutputFormat;
use anyhow::{Context, Result};
use finrag::{
    config::Config,
    graph::{open_configured_graph, GraphQueryOptions, KnowledgeGraph},
};

fn open_graph(config: &Config) -> Result<KnowledgeGraph> {
    open_configured_graph(&config.graph)?
        .context("No graph configured: set [graph] path or enable seed_financial")
}

pub fn query_graph(
    config: Config,
    query: String,
    max_nodes: Option<usize>,
    related: bool,
    depth: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let graph = open_graph(&config)?;

    let mut options = GraphQueryOptions::from(&config.graph);
    if let Some(max_nodes) = max_nodes {
        options.max_nodes = max_nodes;
    }
    if let Some(depth) = depth {
        options.max_depth = depth;
    }
    let context = graph.query_with(&query, &options);
    let related = (related || depth.is_some()).then(|| graph.related_context_with(&query, &options));

    match format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "context": context,
                "related": related,
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("{}", context.description);
            for path in &context.paths {
                println!("  path: {}", path.join(" -> "));
            }
            if let Some(related) = related {
                println!("\nRelated entities (depth {}):", options.max_depth);
                for node in related {
                    println!("  {} ({}): {}", node.name, node.entity_type, node.description);
                }
            }
        }
    }
    Ok(())
}

pub fn find_paths(
    config: Config,
    source: String,
    target: String,
    max_paths: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let graph = open_graph(&config)?;

    let mut options = GraphQueryOptions::from(&config.graph);
    if let Some(max_paths) = max_paths {
        options.max_paths = max_paths;
    }
    let paths = graph.find_paths_with(&source, &target, &options);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&paths)?),
        OutputFormat::Text => {
            if paths.is_empty() {
                println!("No path from '{}' to '{}'", source, target);
            }
            for path in &paths {
                println!("{}", path.join(" -> "));
            }
        }
    }
    Ok(())
}
