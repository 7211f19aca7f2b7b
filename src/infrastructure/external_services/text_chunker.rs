/// A chunk of source text with half-open character offsets into the
/// original input.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub token_count: i32,
}

/// Sliding-window splitter over characters. Chunking is deterministic for
/// identical input and parameters, which keeps chunk hashes stable across
/// retries of unchanged content.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    min_chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, min_chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        // Overlap must leave the window a forward step of at least one char.
        let overlap = if chunk_size > 1 {
            overlap.min(chunk_size - 1)
        } else {
            0
        };

        Self {
            chunk_size,
            min_chunk_size,
            overlap,
        }
    }

    /// Token estimate used across the pipeline: ceil(chars / 4). An
    /// approximation carried over from the source system, not a real
    /// tokenizer.
    pub fn estimate_tokens(char_count: usize) -> i32 {
        char_count.div_ceil(4) as i32
    }

    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let step = self.chunk_size - self.overlap;

        let mut windows: Vec<(usize, usize)> = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);

            let window: String = chars[start..end].iter().collect();
            if !window.trim().is_empty() {
                windows.push((start, end));
            }

            if end == total {
                break;
            }

            start += step;
        }

        // A short tail fragment is folded into the previous chunk rather
        // than emitted on its own.
        if windows.len() > 1 {
            let (last_start, last_end) = windows[windows.len() - 1];
            if last_end - last_start < self.min_chunk_size {
                windows.pop();
                let index = windows.len() - 1;
                windows[index].1 = last_end;
            }
        }

        windows
            .into_iter()
            .map(|(start, end)| {
                let content: String = chars[start..end].iter().collect();
                let token_count = Self::estimate_tokens(end - start);

                TextChunk {
                    content,
                    start_offset: start,
                    end_offset: end,
                    token_count,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunker = TextChunker::new(100, 10, 20);

        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TextChunker::new(100, 10, 20);
        let chunks = chunker.chunk("hello world");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "hello world");
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].end_offset, 11);
        assert_eq!(chunks[0].token_count, 3);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = TextChunker::new(50, 10, 10);
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
                    Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.";

        let first = chunker.chunk(text);
        let second = chunker.chunk(text);

        assert_eq!(first, second);
        assert!(first.len() > 1);
    }

    #[test]
    fn test_offsets_map_back_to_source() {
        let chunker = TextChunker::new(40, 5, 8);
        let text = "The quick brown fox jumps over the lazy dog, again and again and again.";
        let chars: Vec<char> = text.chars().collect();

        for chunk in chunker.chunk(text) {
            let slice: String = chars[chunk.start_offset..chunk.end_offset].iter().collect();
            assert_eq!(slice, chunk.content);
            assert!(!chunk.content.trim().is_empty());
        }
    }

    #[test]
    fn test_overlap_repeats_window_prefix() {
        let chunker = TextChunker::new(20, 1, 5);
        let text = "abcdefghijklmnopqrstuvwxyz0123456789abcdefghij";
        let chunks = chunker.chunk(text);

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            // Each window starts `chunk_size - overlap` after the previous.
            assert_eq!(pair[1].start_offset, pair[0].start_offset + 15);
        }
    }

    #[test]
    fn test_short_tail_merges_into_previous() {
        let chunker = TextChunker::new(10, 8, 0);
        // 24 chars: windows of 10, 10, then a 4-char tail below min size.
        let text = "abcdefghijABCDEFGHIJwxyz";
        let chunks = chunker.chunk(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "abcdefghij");
        assert_eq!(chunks[1].content, "ABCDEFGHIJwxyz");
        assert_eq!(chunks[1].end_offset, 24);
    }

    #[test]
    fn test_token_estimate_rounds_up() {
        assert_eq!(TextChunker::estimate_tokens(0), 0);
        assert_eq!(TextChunker::estimate_tokens(1), 1);
        assert_eq!(TextChunker::estimate_tokens(4), 1);
        assert_eq!(TextChunker::estimate_tokens(5), 2);
        assert_eq!(TextChunker::estimate_tokens(1024), 256);
    }

    #[test]
    fn test_multibyte_text_offsets_in_characters() {
        let chunker = TextChunker::new(10, 1, 0);
        let text = "héllo wörld çharacters";
        let chars: Vec<char> = text.chars().collect();

        for chunk in chunker.chunk(text) {
            assert!(chunk.end_offset <= chars.len());
            let slice: String = chars[chunk.start_offset..chunk.end_offset].iter().collect();
            assert_eq!(slice, chunk.content);
        }
    }
}
