use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug)]
pub enum OcrError {
    Configuration(String),
    Timeout(String),
    Http(String),
    ParseError(String),
    EmptyResult,
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::Configuration(msg) => write!(f, "OCR configuration error: {}", msg),
            OcrError::Timeout(msg) => write!(f, "OCR request timed out: {}", msg),
            OcrError::Http(msg) => write!(f, "OCR HTTP error: {}", msg),
            OcrError::ParseError(msg) => write!(f, "OCR response parse error: {}", msg),
            OcrError::EmptyResult => write!(f, "OCR returned no text"),
        }
    }
}

impl std::error::Error for OcrError {}

#[derive(Serialize)]
struct OcrRequest<'a> {
    document_url: &'a str,
    filename: &'a str,
}

#[derive(Deserialize)]
struct OcrPage {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct OcrResponse {
    pages: Vec<OcrPage>,
}

#[derive(Debug, Clone)]
pub struct OcrClientConfig {
    pub label: String,
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
}

impl OcrClientConfig {
    fn from_env_with(label_var: &str, url_var: &str, key_var: &str, default_label: &str) -> Option<Self> {
        let endpoint = env::var(url_var).ok()?;
        let api_key = env::var(key_var).ok()?;
        let label = env::var(label_var).unwrap_or_else(|_| default_label.to_string());

        Some(Self {
            label,
            endpoint,
            api_key,
            timeout_secs: 60,
            max_retries: 2,
            backoff_base_ms: 500,
            backoff_cap_ms: 5_000,
        })
    }

    pub fn primary_from_env() -> Option<Self> {
        Self::from_env_with("OCR_SERVICE_NAME", "OCR_API_URL", "OCR_API_KEY", "primary")
    }

    pub fn secondary_from_env() -> Option<Self> {
        Self::from_env_with(
            "FALLBACK_OCR_SERVICE_NAME",
            "FALLBACK_OCR_API_URL",
            "FALLBACK_OCR_API_KEY",
            "fallback",
        )
    }
}

/// Client for a remote OCR service: takes a fetchable document URL, returns
/// the concatenated page text. Every call is bounded by a timeout and a
/// small number of retries with capped exponential backoff.
pub struct RemoteOcrClient {
    client: Client,
    config: OcrClientConfig,
}

impl RemoteOcrClient {
    pub fn new(config: OcrClientConfig) -> Result<Self, OcrError> {
        if config.endpoint.trim().is_empty() {
            return Err(OcrError::Configuration("OCR endpoint is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub async fn extract_document(
        &self,
        document_url: &str,
        filename: &str,
    ) -> Result<String, OcrError> {
        let request = OcrRequest {
            document_url,
            filename,
        };

        let response = self.send_with_retry(&request).await?;

        let text = response
            .pages
            .into_iter()
            .filter_map(|page| page.markdown.or(page.text))
            .filter(|page_text| !page_text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        if text.trim().is_empty() {
            return Err(OcrError::EmptyResult);
        }

        Ok(text)
    }

    async fn send_with_retry(&self, request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        let mut attempts = 0;
        let mut last_error = None;

        loop {
            attempts += 1;

            match self.execute_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        service = %self.config.label,
                        attempt = attempts,
                        error = %e,
                        "OCR request failed"
                    );
                    last_error = Some(e);

                    if attempts > self.config.max_retries {
                        break;
                    }

                    let delay_ms = (self.config.backoff_base_ms
                        * 2u64.pow(attempts.saturating_sub(1)))
                    .min(self.config.backoff_cap_ms);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| OcrError::Http("OCR retries exhausted".to_string())))
    }

    async fn execute_request(&self, request: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OcrError::Timeout(e.without_url().to_string())
                } else {
                    OcrError::Http(e.without_url().to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(OcrError::Http(format!(
                "OCR service returned HTTP {}",
                response.status()
            )));
        }

        response
            .json::<OcrResponse>()
            .await
            .map_err(|e| OcrError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_endpoint_rejected() {
        let config = OcrClientConfig {
            label: "primary".to_string(),
            endpoint: "  ".to_string(),
            api_key: "key".to_string(),
            timeout_secs: 5,
            max_retries: 1,
            backoff_base_ms: 10,
            backoff_cap_ms: 100,
        };

        assert!(RemoteOcrClient::new(config).is_err());
    }

    #[test]
    fn test_backoff_is_capped() {
        // delay(attempt) = base * 2^(attempt - 1), bounded by the cap
        let base: u64 = 500;
        let cap: u64 = 5_000;

        let delay = |attempt: u32| (base * 2u64.pow(attempt.saturating_sub(1))).min(cap);

        assert_eq!(delay(1), 500);
        assert_eq!(delay(2), 1_000);
        assert_eq!(delay(3), 2_000);
        assert_eq!(delay(5), 5_000);
        assert_eq!(delay(8), 5_000);
    }
}
