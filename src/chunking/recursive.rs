//! Boundary-aware chunking with a fixed overlap.
//!
//! Each chunk is cut at the coarsest natural boundary (paragraph, line, sentence,
//! word) that fits in the window, falling back to a hard cut at `chunk_size`. The
//! next chunk starts exactly `chunk_overlap` characters before that cut.

use super::{Chunk, Chunker, ChunkingConfig};
use crate::document::Page;
use tracing::debug;

/// Natural text boundaries, coarsest first. A boundary sits right after its separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
}

impl Boundary {
    const PREFERENCE: [Boundary; 4] = [
        Boundary::Paragraph,
        Boundary::Line,
        Boundary::Sentence,
        Boundary::Word,
    ];

    /// Whether a cut at `pos` (exclusive end) falls right after this separator.
    fn ends_at(self, chars: &[char], pos: usize) -> bool {
        if pos == 0 {
            return false;
        }
        let last = chars[pos - 1];
        match self {
            Boundary::Paragraph => pos >= 2 && last == '\n' && chars[pos - 2] == '\n',
            Boundary::Line => last == '\n',
            Boundary::Sentence => {
                pos >= 2 && last.is_whitespace() && matches!(chars[pos - 2], '.' | '!' | '?')
            }
            Boundary::Word => last.is_whitespace(),
        }
    }
}

/// Chunker that prefers natural boundaries and keeps an exact overlap.
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split one page's text into overlapping pieces.
    fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let ChunkingConfig {
            chunk_size,
            chunk_overlap,
        } = self.config;

        let mut pieces = Vec::new();
        let mut start = 0;

        loop {
            let limit = start + chunk_size;
            if limit >= chars.len() {
                pieces.push(chars[start..].iter().collect());
                break;
            }

            let end = Self::find_cut(&chars, start + chunk_overlap, limit);
            pieces.push(chars[start..end].iter().collect());
            start = end - chunk_overlap;
        }

        pieces
    }

    /// Pick a cut in `(floor, limit]`, preferring coarse boundaries near the limit.
    fn find_cut(chars: &[char], floor: usize, limit: usize) -> usize {
        for boundary in Boundary::PREFERENCE {
            if let Some(pos) = (floor + 1..=limit)
                .rev()
                .find(|&pos| boundary.ends_at(chars, pos))
            {
                return pos;
            }
        }
        limit
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages {
            let text = page.text.trim();
            if text.is_empty() {
                continue;
            }

            for piece in self.split(text) {
                let ordinal = chunks.len();
                chunks.push(Chunk::new(piece, page.number, ordinal));
            }
        }

        debug!(
            "Split {} pages into {} chunks (size {}, overlap {})",
            pages.len(),
            chunks.len(),
            self.config.chunk_size,
            self.config.chunk_overlap
        );
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> RecursiveChunker {
        RecursiveChunker::new(ChunkingConfig::new(size, overlap).unwrap())
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    fn head(text: &str, n: usize) -> String {
        text.chars().take(n).collect()
    }

    fn tail(text: &str, n: usize) -> String {
        let len = text.chars().count();
        text.chars().skip(len.saturating_sub(n)).collect()
    }

    /// Size bound and exact overlap between neighbours of the same page.
    fn assert_chunk_contract(chunks: &[Chunk], size: usize, overlap: usize) {
        for chunk in chunks {
            assert!(chunk.char_len() <= size, "chunk too long: {:?}", chunk.text);
        }
        for pair in chunks.windows(2) {
            if pair[0].source_page != pair[1].source_page {
                continue;
            }
            if pair[0].char_len() > overlap && pair[1].char_len() > overlap {
                assert_eq!(tail(&pair[0].text, overlap), head(&pair[1].text, overlap));
            }
        }
    }

    #[test]
    fn test_short_sentence_pair() {
        let chunks = chunker(15, 5).chunk(&[Page::new(1, "The sky is blue. Water is wet.")]);

        assert_eq!(
            texts(&chunks),
            vec!["The sky is ", "y is blue. ", "lue. Water is ", "r is wet."]
        );
        assert_chunk_contract(&chunks, 15, 5);
    }

    #[test]
    fn test_text_shorter_than_chunk() {
        let chunks = chunker(100, 20).chunk(&[Page::new(3, "  Short text.  ")]);
        assert_eq!(chunks, vec![Chunk::new("Short text.", 3, 0)]);
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let text = "First paragraph here.\n\nSecond paragraph follows. It is longer.";
        let chunks = chunker(40, 5).chunk(&[Page::new(1, text)]);

        assert_eq!(chunks[0].text, "First paragraph here.\n\n");
        assert_chunk_contract(&chunks, 40, 5);
    }

    #[test]
    fn test_prefers_sentence_over_word() {
        let text = "One two three. Four five six seven eight nine ten";
        let chunks = chunker(30, 4).chunk(&[Page::new(1, text)]);

        assert_eq!(chunks[0].text, "One two three. ");
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let text = "a".repeat(25);
        let chunks = chunker(10, 3).chunk(&[Page::new(1, text.as_str())]);

        assert_eq!(chunks[0].char_len(), 10);
        assert_chunk_contract(&chunks, 10, 3);
        let last = chunks.last().unwrap();
        assert!(text.ends_with(&last.text));
    }

    #[test]
    fn test_pages_are_separate_sources() {
        let pages = vec![
            Page::new(1, "Alpha beta gamma delta epsilon."),
            Page::new(2, "   "),
            Page::new(3, "Zeta eta theta iota kappa lambda."),
        ];
        let chunks = chunker(20, 5).chunk(&pages);

        assert!(chunks.iter().any(|c| c.source_page == 1));
        assert!(chunks.iter().all(|c| c.source_page != 2));
        assert!(chunks.iter().any(|c| c.source_page == 3));

        let ordinals: Vec<usize> = chunks.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, (0..chunks.len()).collect::<Vec<_>>());

        let first_of_page_3 = chunks.iter().find(|c| c.source_page == 3).unwrap();
        assert!(first_of_page_3.text.starts_with("Zeta"));
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let text = "Blåbærsyltetøy er godt. Æbler og pærer smaker også fint på høsten.";
        let chunks = chunker(20, 6).chunk(&[Page::new(1, text)]);
        assert!(chunks.len() > 1);
        assert_chunk_contract(&chunks, 20, 6);
    }

    #[test]
    fn test_contract_holds_for_varied_inputs() {
        let paragraph = "Retrieval augmented generation grounds answers in documents. \
                         Each passage is embedded once!\nQueries are embedded the same way? \
                         Then the closest passages are returned.\n\n";
        let text = paragraph.repeat(12);

        for (size, overlap) in [(50, 10), (64, 0), (120, 40), (200, 199), (1000, 200)] {
            let chunks = chunker(size, overlap).chunk(&[Page::new(1, text.as_str())]);
            assert!(!chunks.is_empty());
            assert_chunk_contract(&chunks, size, overlap);
        }
    }

    #[test]
    fn test_covers_whole_page() {
        let text = "word ".repeat(60);
        let trimmed = text.trim();
        let chunks = chunker(37, 7).chunk(&[Page::new(1, trimmed)]);

        let mut rebuilt: String = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(7));
        }
        assert_eq!(rebuilt, trimmed);
    }
}
