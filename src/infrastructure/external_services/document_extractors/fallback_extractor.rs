use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::Client;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::content_extractor::{
    ContentExtractionError, ContentExtractor, DocumentSource, ExtractedDocument, ExtractionMethod,
};
use crate::application::ports::object_storage::ObjectStorage;
use crate::infrastructure::external_services::ocr_client::{
    OcrClientConfig, OcrError, RemoteOcrClient,
};

use super::FileParser;

const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PRESIGN_TTL_SECS: u64 = 900;

/// Ordered extraction chain: primary OCR, secondary OCR, then the local
/// file parser. A tier failure (configuration, HTTP, timeout, or empty
/// output) moves on to the next tier; only the final tier's failure becomes
/// the document's error.
pub struct FallbackContentExtractor {
    primary_ocr: Option<RemoteOcrClient>,
    secondary_ocr: Option<RemoteOcrClient>,
    file_parser: FileParser,
    storage: Option<Arc<dyn ObjectStorage>>,
    client: Client,
    presign_ttl_secs: u64,
}

impl FallbackContentExtractor {
    pub fn new(
        primary_ocr: Option<RemoteOcrClient>,
        secondary_ocr: Option<RemoteOcrClient>,
        storage: Option<Arc<dyn ObjectStorage>>,
    ) -> Result<Self, ContentExtractionError> {
        let download_timeout = env::var("DOWNLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS);
        let presign_ttl_secs = env::var("PRESIGN_TTL_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PRESIGN_TTL_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(download_timeout))
            .build()
            .map_err(|e| ContentExtractionError::Configuration(e.to_string()))?;

        Ok(Self {
            primary_ocr,
            secondary_ocr,
            file_parser: FileParser::new(),
            storage,
            client,
            presign_ttl_secs,
        })
    }

    pub fn from_env(
        storage: Option<Arc<dyn ObjectStorage>>,
    ) -> Result<Self, ContentExtractionError> {
        let primary_ocr = match OcrClientConfig::primary_from_env() {
            Some(config) => Some(
                RemoteOcrClient::new(config)
                    .map_err(|e| ContentExtractionError::Configuration(e.to_string()))?,
            ),
            None => None,
        };
        let secondary_ocr = match OcrClientConfig::secondary_from_env() {
            Some(config) => Some(
                RemoteOcrClient::new(config)
                    .map_err(|e| ContentExtractionError::Configuration(e.to_string()))?,
            ),
            None => None,
        };

        Self::new(primary_ocr, secondary_ocr, storage)
    }

    fn is_pdf(source: &DocumentSource) -> bool {
        source.mime_type.eq_ignore_ascii_case("application/pdf")
            || source.filename.to_ascii_lowercase().ends_with(".pdf")
    }

    fn is_durable_url(url: &str) -> bool {
        url.starts_with("https://") || url.starts_with("http://")
    }

    async fn try_ocr(
        &self,
        ocr: &RemoteOcrClient,
        source: &DocumentSource,
    ) -> Result<String, ContentExtractionError> {
        let document_url = self.durable_url(source).await?;

        let text = ocr
            .extract_document(&document_url, &source.filename)
            .await
            .map_err(|e| match e {
                OcrError::Configuration(msg) => ContentExtractionError::Configuration(msg),
                OcrError::Timeout(msg) => ContentExtractionError::Timeout(msg),
                OcrError::EmptyResult => {
                    ContentExtractionError::EmptyContent(ocr.label().to_string())
                }
                other => ContentExtractionError::Http(other.to_string()),
            })?;

        if text.trim().is_empty() {
            return Err(ContentExtractionError::EmptyContent(
                ocr.label().to_string(),
            ));
        }

        Ok(text)
    }

    /// OCR services fetch the document themselves, so the source must sit
    /// behind a reachable URL. Inline payloads get staged to object storage
    /// and served through a short-lived presigned link.
    async fn durable_url(
        &self,
        source: &DocumentSource,
    ) -> Result<String, ContentExtractionError> {
        if Self::is_durable_url(&source.file_url) {
            return Ok(source.file_url.clone());
        }

        let storage = self.storage.as_ref().ok_or_else(|| {
            ContentExtractionError::Configuration(
                "Source is not a fetchable URL and no object storage is configured".to_string(),
            )
        })?;

        let bytes = self.load_source_bytes(source).await?;
        let key = storage
            .upload_file(&bytes, &source.filename, &source.mime_type)
            .await
            .map_err(|e| ContentExtractionError::Storage(e.to_string()))?;

        storage
            .presigned_url(&key, self.presign_ttl_secs)
            .await
            .map_err(|e| ContentExtractionError::Storage(e.to_string()))
    }

    async fn load_source_bytes(
        &self,
        source: &DocumentSource,
    ) -> Result<Vec<u8>, ContentExtractionError> {
        if let Some(rest) = source.file_url.strip_prefix("data:") {
            let payload = rest.split_once(',').map(|(_, payload)| payload).ok_or_else(|| {
                ContentExtractionError::Download("Malformed data URI".to_string())
            })?;

            return BASE64
                .decode(payload.trim())
                .map_err(|e| ContentExtractionError::Download(format!("Invalid base64: {}", e)));
        }

        if Self::is_durable_url(&source.file_url) {
            let response = self
                .client
                .get(&source.file_url)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        ContentExtractionError::Timeout(e.without_url().to_string())
                    } else {
                        ContentExtractionError::Download(e.without_url().to_string())
                    }
                })?;

            if !response.status().is_success() {
                return Err(ContentExtractionError::Download(format!(
                    "Source download returned HTTP {}",
                    response.status()
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| ContentExtractionError::Download(e.without_url().to_string()))?;

            return Ok(bytes.to_vec());
        }

        Err(ContentExtractionError::Download(format!(
            "Unsupported source URL scheme: {}",
            source.file_url.chars().take(32).collect::<String>()
        )))
    }
}

#[async_trait]
impl ContentExtractor for FallbackContentExtractor {
    async fn extract(
        &self,
        source: &DocumentSource,
    ) -> Result<ExtractedDocument, ContentExtractionError> {
        if Self::is_pdf(source) {
            let ocr_tiers = [self.primary_ocr.as_ref(), self.secondary_ocr.as_ref()];

            for ocr in ocr_tiers.into_iter().flatten() {
                match self.try_ocr(ocr, source).await {
                    Ok(text) => {
                        tracing::info!(
                            filename = %source.filename,
                            service = %ocr.label(),
                            "Extracted document via OCR"
                        );
                        return Ok(ExtractedDocument {
                            text,
                            method: ExtractionMethod::RemoteOcr(ocr.label().to_string()),
                        });
                    }
                    Err(error) => {
                        tracing::warn!(
                            filename = %source.filename,
                            service = %ocr.label(),
                            error = %error,
                            "OCR tier failed, falling back"
                        );
                    }
                }
            }
        }

        // Final tier: local parsing. Its failure is the document's failure.
        let bytes = self.load_source_bytes(source).await?;
        let (text, format) = self
            .file_parser
            .parse(&bytes, &source.filename, &source.mime_type)?;

        if text.trim().is_empty() {
            return Err(ContentExtractionError::EmptyContent(format!(
                "parser produced no text for {}",
                source.filename
            )));
        }

        tracing::info!(
            filename = %source.filename,
            format = %format,
            "Extracted document via local parser"
        );

        Ok(ExtractedDocument {
            text,
            method: ExtractionMethod::FileParser(format),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FallbackContentExtractor {
        FallbackContentExtractor::new(None, None, None).unwrap()
    }

    fn source(file_url: &str, filename: &str, mime_type: &str) -> DocumentSource {
        DocumentSource {
            file_url: file_url.to_string(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
        }
    }

    #[tokio::test]
    async fn test_data_uri_parsed_without_ocr() {
        let payload = BASE64.encode(b"inline document body");
        let data_uri = format!("data:text/plain;base64,{}", payload);
        let source = source(&data_uri, "inline.txt", "text/plain");

        let extracted = extractor().extract(&source).await.unwrap();

        assert_eq!(extracted.text, "inline document body");
        assert_eq!(
            extracted.method,
            ExtractionMethod::FileParser("txt".to_string())
        );
    }

    #[tokio::test]
    async fn test_malformed_data_uri_is_hard_error() {
        let source = source("data:text/plain;base64", "broken.txt", "text/plain");

        let result = extractor().extract(&source).await;
        assert!(matches!(result, Err(ContentExtractionError::Download(_))));
    }

    #[tokio::test]
    async fn test_empty_content_is_failure() {
        let payload = BASE64.encode(b"   \n  ");
        let data_uri = format!("data:text/plain;base64,{}", payload);
        let source = source(&data_uri, "blank.txt", "text/plain");

        let result = extractor().extract(&source).await;
        assert!(matches!(
            result,
            Err(ContentExtractionError::EmptyContent(_))
        ));
    }

    #[tokio::test]
    async fn test_non_durable_pdf_without_storage_falls_to_parser() {
        // No OCR configured and no storage: a data-URI PDF goes straight to
        // the local parser, whose verdict stands.
        let payload = BASE64.encode(b"not really a pdf");
        let data_uri = format!("data:application/pdf;base64,{}", payload);
        let source = source(&data_uri, "scan.pdf", "application/pdf");

        let result = extractor().extract(&source).await;
        assert!(matches!(
            result,
            Err(ContentExtractionError::ParseFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_ocr_tier_falls_back_to_parser() {
        // Primary OCR is configured but cannot run (the inline source has no
        // durable URL and no storage is available to stage it); the local
        // parser wins and is recorded as the extraction method.
        let primary = RemoteOcrClient::new(OcrClientConfig {
            label: "primary".to_string(),
            endpoint: "http://127.0.0.1:9/ocr".to_string(),
            api_key: "key".to_string(),
            timeout_secs: 1,
            max_retries: 0,
            backoff_base_ms: 1,
            backoff_cap_ms: 10,
        })
        .unwrap();
        let extractor = FallbackContentExtractor::new(Some(primary), None, None).unwrap();

        let payload = BASE64.encode(b"scanned page text");
        let data_uri = format!("data:application/pdf;base64,{}", payload);
        let source = source(&data_uri, "scan.txt", "application/pdf");

        let extracted = extractor.extract(&source).await.unwrap();

        assert_eq!(extracted.text, "scanned page text");
        assert_eq!(
            extracted.method,
            ExtractionMethod::FileParser("txt".to_string())
        );
    }

    #[test]
    fn test_durable_url_detection() {
        assert!(FallbackContentExtractor::is_durable_url(
            "https://files.example.com/doc.pdf"
        ));
        assert!(!FallbackContentExtractor::is_durable_url(
            "data:application/pdf;base64,AAAA"
        ));
        assert!(!FallbackContentExtractor::is_durable_url("/tmp/doc.pdf"));
    }
}
