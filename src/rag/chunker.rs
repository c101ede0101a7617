use uuid::Uuid;

/// Text chunk produced by the chunker.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Unique chunk id (doubles as the vector point id)
    pub id: Uuid,
    /// Raw text of the chunk
    pub text: String,
    /// Ordinal of the chunk within its document
    pub index: usize,
    /// Character offset of the first char
    pub start: usize,
    /// Character offset after the last char
    pub end: usize,
    /// Source label (document file name)
    pub source: String,
}

impl Chunk {
    pub fn new(
        text: String,
        index: usize,
        start: usize,
        end: usize,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            index,
            start,
            end,
            source: source.into(),
        }
    }
}

/// Fixed-size chunker with character-level overlap.
///
/// Windows are measured in Unicode scalar values, never byte offsets, so
/// multi-byte text cannot split a character in half.
#[derive(Debug, Clone)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a new chunker. Degenerate parameters are clamped.
    pub fn new(size: usize, overlap: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            overlap: overlap.min(size.saturating_sub(1)),
        }
    }

    /// Split text into overlapping chunks.
    pub fn chunk(&self, text: &str, source: impl Into<String>) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let step = self.size.saturating_sub(self.overlap).max(1);
        let source = source.into();

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < chars.len() {
            let end = (start + self.size).min(chars.len());
            let chunk_text: String = chars[start..end].iter().collect();
            chunks.push(Chunk::new(chunk_text, index, start, end, source.clone()));

            if end == chars.len() {
                break;
            }
            start += step;
            index += 1;
        }

        chunks
    }
}
