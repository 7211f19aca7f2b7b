use lopdf::Document;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::application::ports::content_extractor::ContentExtractionError;

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, data: &[u8]) -> Result<String, ContentExtractionError> {
        let mut doc = Document::load_mem(data)
            .map_err(|e| ContentExtractionError::ParseFailed(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt("").map_err(|_| {
                ContentExtractionError::ParseFailed(
                    "PDF is encrypted and could not be opened".to_string(),
                )
            })?;
        }

        let pages = doc.get_pages();

        let mut extracted: Vec<(u32, String)> = pages
            .into_par_iter()
            .filter_map(|(page_num, _): (u32, (u32, u16))| {
                match doc.extract_text(&[page_num]) {
                    Ok(text) => Some((page_num, text)),
                    Err(e) => {
                        tracing::warn!(page = page_num, error = %e, "Skipping unreadable PDF page");
                        None
                    }
                }
            })
            .collect();

        extracted.sort_by_key(|(page_num, _)| *page_num);

        let text = extracted
            .into_iter()
            .map(|(_, page_text)| {
                page_text
                    .split('\n')
                    .map(|line| line.trim_end())
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|page_text| !page_text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(text)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_rejected() {
        let extractor = PdfExtractor::new();
        assert!(extractor.parse(b"definitely not a pdf").is_err());
    }
}
