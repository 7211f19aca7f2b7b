use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, Error as ReqwestError};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
};

#[derive(Serialize)]
pub struct EmbeddingsRequest {
    pub model: String,
    pub input: Vec<String>,
}

#[derive(Deserialize)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vector>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsClientConfig {
    pub service_url: String,
    pub model_name: String,
    pub embedding_dimension: usize,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

impl Default for EmbeddingsClientConfig {
    fn default() -> Self {
        let service_url = env::var("EMBEDDINGS_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8091/embeddings".to_string());
        let model_name =
            env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());
        let embedding_dimension = env::var("EMBEDDING_DIMENSION")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1536);

        Self {
            service_url,
            model_name,
            embedding_dimension,
            max_retries: 3,
            timeout_secs: 30,
            backoff_factor: 1.5,
        }
    }
}

#[derive(Debug)]
pub enum EmbeddingsError {
    RequestError(String),
    ParseError(String),
    MaxRetriesExceeded(String),
}

impl std::fmt::Display for EmbeddingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingsError::RequestError(msg) => write!(f, "Request error: {}", msg),
            EmbeddingsError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            EmbeddingsError::MaxRetriesExceeded(msg) => write!(f, "Max retries exceeded: {}", msg),
        }
    }
}

impl std::error::Error for EmbeddingsError {}

#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    config: EmbeddingsClientConfig,
}

impl InferenceClient {
    pub fn new(config: EmbeddingsClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        Self::new(EmbeddingsClientConfig::default())
    }

    pub fn config(&self) -> &EmbeddingsClientConfig {
        &self.config
    }

    pub async fn get_embeddings(
        &self,
        texts: &[String],
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let request = EmbeddingsRequest {
            model: self.config.model_name.clone(),
            input: texts.to_vec(),
        };

        self.send_request(request).await
    }

    async fn send_request(
        &self,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let mut attempts = 0;
        let mut last_error = None;

        loop {
            attempts += 1;

            match self.execute_request(&request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = Some(e);

                    if attempts > self.config.max_retries {
                        break;
                    }

                    let backoff_time = Duration::from_millis(
                        (self.config.backoff_factor.powi(attempts as i32 - 1) * 1000.0) as u64,
                    );

                    tokio::time::sleep(backoff_time).await;
                }
            }
        }

        Err(last_error.unwrap_or(EmbeddingsError::MaxRetriesExceeded(
            "Max retries exceeded".to_string(),
        )))
    }

    async fn execute_request(
        &self,
        request: &EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, EmbeddingsError> {
        let response = self
            .client
            .post(&self.config.service_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| EmbeddingsError::RequestError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingsError::RequestError(format!(
                "Embedding service returned HTTP {}",
                response.status()
            )));
        }

        response
            .json::<EmbeddingsResponse>()
            .await
            .map_err(|e| EmbeddingsError::ParseError(e.to_string()))
    }
}

// Adapter to implement the EmbeddingProvider trait
pub struct InferenceEmbeddingProvider {
    client: InferenceClient,
}

impl InferenceEmbeddingProvider {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        let client = InferenceClient::from_env()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EmbeddingProvider for InferenceEmbeddingProvider {
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        if request.texts.is_empty() {
            return Ok(BatchEmbeddingResponse {
                embeddings: Vec::new(),
                model_name: self.model_name(),
            });
        }

        let response = self
            .client
            .get_embeddings(&request.texts)
            .await
            .map_err(|e| match e {
                EmbeddingsError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
                EmbeddingsError::ParseError(msg) => EmbeddingProviderError::ApiError(msg),
                EmbeddingsError::MaxRetriesExceeded(_) => {
                    EmbeddingProviderError::ServiceUnavailable
                }
            })?;

        if response.embeddings.len() != request.texts.len() {
            return Err(EmbeddingProviderError::ApiError(format!(
                "Expected {} embeddings, got {}",
                request.texts.len(),
                response.embeddings.len()
            )));
        }

        Ok(BatchEmbeddingResponse {
            embeddings: response.embeddings,
            model_name: response.model.unwrap_or_else(|| self.model_name()),
        })
    }

    fn model_name(&self) -> String {
        self.client.config().model_name.clone()
    }

    fn embedding_dimension(&self) -> usize {
        self.client.config().embedding_dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_construction() {
        let request = EmbeddingsRequest {
            model: "test-model".to_string(),
            input: vec!["Hello".to_string(), "World".to_string()],
        };

        assert_eq!(request.input.len(), 2);
        assert_eq!(request.input[0], "Hello");
    }

    #[test]
    fn test_config_defaults() {
        let config = EmbeddingsClientConfig::default();

        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.embedding_dimension > 0);
    }
}
