use html2text::from_read;

use crate::application::ports::content_extractor::ContentExtractionError;

const RENDER_WIDTH: usize = 120;

pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, data: &[u8]) -> Result<String, ContentExtractionError> {
        from_read(data, RENDER_WIDTH)
            .map_err(|e| ContentExtractionError::ParseFailed(e.to_string()))
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_body_text() {
        let extractor = HtmlExtractor::new();
        let html = b"<html><body><h1>Title</h1><p>Hello world</p></body></html>";

        let text = extractor.parse(html).unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("Hello world"));
        assert!(!text.contains("<p>"));
    }
}
