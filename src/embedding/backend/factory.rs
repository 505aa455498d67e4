//! Backend factory for creating embedding backends from configuration

use super::hash::HashBackend;
use super::http::{HttpBackend, HttpBackendConfig};
use super::traits::{EmbeddingBackend, EmbeddingResult};
use crate::config::{EmbeddingBackendKind, EmbeddingConfig};
use std::sync::Arc;
use tracing::{info, warn};

/// Create an embedding backend from configuration
///
/// Returns an `Arc<dyn EmbeddingBackend>` that can be shared across threads.
pub fn create_backend(config: &EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingBackend>> {
    match config.backend {
        EmbeddingBackendKind::Http => {
            let http_config = HttpBackendConfig {
                endpoint: config.endpoint.clone(),
                api_key: config.api_key.clone(),
                model: config.model.clone(),
                dimensions: config.dimensions,
                timeout_secs: config.timeout_secs,
                max_batch_size: config.max_batch_size,
            };
            Ok(Arc::new(HttpBackend::new(http_config)?))
        }
        EmbeddingBackendKind::Hash => {
            warn!("Using hash-based embeddings: dense rankings carry no semantic meaning");
            info!("Creating hash embedding backend ({} dimensions)", config.dimensions);
            Ok(Arc::new(HashBackend::new(config.dimensions)))
        }
    }
}
