//! HTTP embedding backend for OpenAI-compatible `/v1/embeddings` endpoints
//!
//! Works against OpenAI, Azure OpenAI and local servers that speak the same
//! protocol (vLLM, LM Studio, Ollama, text-embeddings-inference).

use super::traits::{EmbeddingBackend, EmbeddingError, EmbeddingResult};
use crate::types::Embedding;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variables consulted for an API key, in order
const API_KEY_ENV_VARS: [&str; 2] = ["FINRAG_EMBEDDING_API_KEY", "OPENAI_API_KEY"];

/// Settings for the HTTP embedding backend
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
    pub max_batch_size: usize,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout_secs: 30,
            max_batch_size: 100,
        }
    }
}

/// HTTP embedding backend
#[derive(Debug)]
pub struct HttpBackend {
    client: Client,
    config: HttpBackendConfig,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
    encoding_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> EmbeddingResult<Self> {
        if config.max_batch_size == 0 {
            return Err(EmbeddingError::Config(
                "max_batch_size must be positive".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let api_key = config.api_key.clone().or_else(|| {
            API_KEY_ENV_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok())
        });

        match &api_key {
            Some(key) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|e| EmbeddingError::Config(format!("Invalid API key: {}", e)))?;
                headers.insert(AUTHORIZATION, value);
            }
            None if config.endpoint.contains("openai.com") || config.endpoint.contains("azure.com") => {
                warn!("No API key provided for {}", config.endpoint);
            }
            None => {}
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            "HTTP embedding backend: endpoint={}, model={}, {} dimensions",
            config.endpoint, config.model, config.dimensions
        );

        Ok(Self { client, config })
    }

    /// Embed one request-sized batch
    fn request(&self, texts: &[&str]) -> EmbeddingResult<Vec<Embedding>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
            // Only text-embedding-3-* models accept a requested dimension
            dimensions: self
                .config
                .model
                .contains("text-embedding-3")
                .then_some(self.config.dimensions),
            encoding_format: "float",
        };
        let body = serde_json::to_vec(&request).map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to serialize request: {}", e))
        })?;

        debug!("POST {} ({} texts)", self.config.endpoint, texts.len());

        // reqwest's blocking client panics inside a tokio runtime; keep the
        // call on its own thread so the backend is usable from both contexts.
        let response = std::thread::scope(|s| {
            s.spawn(|| self.client.post(&self.config.endpoint).body(body).send())
                .join()
        })
        .map_err(|_| EmbeddingError::EmbeddingFailed("HTTP request thread panicked".to_string()))??;

        let embeddings = parse_response(response)?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "Endpoint returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

fn parse_response(response: Response) -> EmbeddingResult<Vec<Embedding>> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_ms = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(|secs| secs * 1000);
        return Err(EmbeddingError::RateLimited { retry_after_ms });
    }

    if !status.is_success() {
        let text = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        return Err(EmbeddingError::EmbeddingFailed(format!(
            "API error ({}): {}",
            status, message
        )));
    }

    let parsed: EmbeddingResponse = response
        .json()
        .map_err(|e| EmbeddingError::EmbeddingFailed(format!("Failed to parse response: {}", e)))?;

    let mut data = parsed.data;
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| normalize(d.embedding)).collect())
}

impl EmbeddingBackend for HttpBackend {
    fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        self.request(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding returned".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Embedding>> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut out = Vec::with_capacity(refs.len());
        for batch in refs.chunks(self.config.max_batch_size) {
            out.extend(self.request(batch)?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Scale a vector to unit length; zero vectors are returned unchanged
pub(crate) fn normalize(mut embedding: Embedding) -> Embedding {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        embedding.iter_mut().for_each(|x| *x /= norm);
    }
    embedding
}
