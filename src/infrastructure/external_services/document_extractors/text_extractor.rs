use crate::application::ports::content_extractor::ContentExtractionError;

pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, data: &[u8]) -> Result<String, ContentExtractionError> {
        match String::from_utf8(data.to_vec()) {
            Ok(text) => Ok(text),
            Err(_) => {
                // Salvage what we can from mixed encodings.
                Ok(String::from_utf8_lossy(data).into_owned())
            }
        }
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_utf8_passes_through() {
        let extractor = PlainTextExtractor::new();
        assert_eq!(extractor.parse("héllo".as_bytes()).unwrap(), "héllo");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let extractor = PlainTextExtractor::new();
        let text = extractor.parse(&[b'o', b'k', 0xFF, b'!']).unwrap();
        assert!(text.starts_with("ok"));
        assert!(text.ends_with('!'));
    }
}
