use crate::application::ports::content_extractor::ContentExtractionError;

use super::{HtmlExtractor, PdfExtractor, PlainTextExtractor};

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "csv", "tsv", "json", "xml", "yaml", "yml", "log", "rst",
];

/// Local byte parser keyed by file extension, the final tier of the
/// extraction chain.
pub struct FileParser {
    pdf_extractor: PdfExtractor,
    html_extractor: HtmlExtractor,
    text_extractor: PlainTextExtractor,
}

impl FileParser {
    pub fn new() -> Self {
        Self {
            pdf_extractor: PdfExtractor::new(),
            html_extractor: HtmlExtractor::new(),
            text_extractor: PlainTextExtractor::new(),
        }
    }

    fn extension_of(filename: &str) -> Option<String> {
        let name = filename.rsplit('/').next().unwrap_or(filename);
        let (stem, extension) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(extension.to_ascii_lowercase())
    }

    /// Parse raw bytes into text. Returns the extracted text together with
    /// the format label that handled it.
    pub fn parse(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<(String, String), ContentExtractionError> {
        let extension = Self::extension_of(filename);

        match extension.as_deref() {
            Some("pdf") => Ok((self.pdf_extractor.parse(data)?, "pdf".to_string())),
            Some("html") | Some("htm") => {
                Ok((self.html_extractor.parse(data)?, "html".to_string()))
            }
            Some(ext) if TEXT_EXTENSIONS.contains(&ext) => {
                Ok((self.text_extractor.parse(data)?, ext.to_string()))
            }
            _ => {
                // No usable extension; fall back on the declared MIME type.
                if mime_type.eq_ignore_ascii_case("application/pdf") {
                    Ok((self.pdf_extractor.parse(data)?, "pdf".to_string()))
                } else if mime_type.eq_ignore_ascii_case("text/html") {
                    Ok((self.html_extractor.parse(data)?, "html".to_string()))
                } else if mime_type.to_ascii_lowercase().starts_with("text/") {
                    Ok((self.text_extractor.parse(data)?, "text".to_string()))
                } else {
                    Err(ContentExtractionError::UnsupportedFormat(format!(
                        "{} ({})",
                        filename, mime_type
                    )))
                }
            }
        }
    }
}

impl Default for FileParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection() {
        assert_eq!(FileParser::extension_of("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(
            FileParser::extension_of("notes.backup.md").as_deref(),
            Some("md")
        );
        assert_eq!(FileParser::extension_of("README").as_deref(), None);
        assert_eq!(FileParser::extension_of(".gitignore").as_deref(), None);
    }

    #[test]
    fn test_parse_plain_text_by_extension() {
        let parser = FileParser::new();
        let (text, format) = parser
            .parse(b"plain contents", "notes.txt", "text/plain")
            .unwrap();

        assert_eq!(text, "plain contents");
        assert_eq!(format, "txt");
    }

    #[test]
    fn test_parse_html_by_extension() {
        let parser = FileParser::new();
        let (text, format) = parser
            .parse(b"<p>hi there</p>", "page.html", "text/html")
            .unwrap();

        assert!(text.contains("hi there"));
        assert_eq!(format, "html");
    }

    #[test]
    fn test_mime_fallback_for_unknown_extension() {
        let parser = FileParser::new();
        let (text, format) = parser
            .parse(b"log line", "output.data", "text/x-log")
            .unwrap();

        assert_eq!(text, "log line");
        assert_eq!(format, "text");
    }

    #[test]
    fn test_unknown_binary_rejected() {
        let parser = FileParser::new();
        let result = parser.parse(&[0, 1, 2, 3], "blob.bin", "application/octet-stream");

        assert!(matches!(
            result,
            Err(ContentExtractionError::UnsupportedFormat(_))
        ));
    }
}
