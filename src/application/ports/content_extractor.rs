use async_trait::async_trait;

#[derive(Debug)]
pub enum ContentExtractionError {
    Configuration(String),
    Timeout(String),
    Http(String),
    Download(String),
    Storage(String),
    EmptyContent(String),
    UnsupportedFormat(String),
    ParseFailed(String),
}

impl std::fmt::Display for ContentExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentExtractionError::Configuration(msg) => {
                write!(f, "Extractor configuration error: {}", msg)
            }
            ContentExtractionError::Timeout(msg) => write!(f, "Extraction timed out: {}", msg),
            ContentExtractionError::Http(msg) => write!(f, "Extraction HTTP error: {}", msg),
            ContentExtractionError::Download(msg) => write!(f, "Source download failed: {}", msg),
            ContentExtractionError::Storage(msg) => write!(f, "Object storage error: {}", msg),
            ContentExtractionError::EmptyContent(msg) => {
                write!(f, "Extraction produced no content: {}", msg)
            }
            ContentExtractionError::UnsupportedFormat(format) => {
                write!(f, "Unsupported format: {}", format)
            }
            ContentExtractionError::ParseFailed(msg) => write!(f, "Parse failed: {}", msg),
        }
    }
}

impl std::error::Error for ContentExtractionError {}

/// Reference to the source bytes of one document.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub file_url: String,
    pub filename: String,
    pub mime_type: String,
}

/// How the text of a document was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionMethod {
    /// A remote OCR service, identified by its configured label.
    RemoteOcr(String),
    /// The local parser, identified by the format it handled.
    FileParser(String),
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionMethod::RemoteOcr(label) => write!(f, "ocr:{}", label),
            ExtractionMethod::FileParser(format) => write!(f, "parser:{}", format),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    pub method: ExtractionMethod,
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(
        &self,
        source: &DocumentSource,
    ) -> Result<ExtractedDocument, ContentExtractionError>;
}
