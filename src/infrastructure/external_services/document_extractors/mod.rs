pub mod fallback_extractor;
pub mod file_parser;
pub mod html_extractor;
pub mod pdf_extractor;
pub mod text_extractor;

pub use fallback_extractor::FallbackContentExtractor;
pub use file_parser::FileParser;
pub use html_extractor::HtmlExtractor;
pub use pdf_extractor::PdfExtractor;
pub use text_extractor::PlainTextExtractor;
