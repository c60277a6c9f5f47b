//! Text chunking for the ingestion pipeline.
//!
//! Splits extracted text into bounded chunks for embedding, preferring
//! paragraph boundaries, then sentence boundaries, then word windows, with
//! overlap between adjacent chunks for context preservation.

use regex::Regex;

use studium_core::defaults;

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum size of a chunk in bytes.
    pub max_chunk_size: usize,
    /// Bytes of overlap carried between adjacent chunks.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: defaults::CHUNK_SIZE,
            overlap: defaults::CHUNK_OVERLAP,
        }
    }
}

/// Common trait for chunking strategies.
pub trait Chunker: Send + Sync {
    /// Chunk the given text. Empty chunks are discarded.
    fn chunk(&self, text: &str) -> Vec<String>;

    /// The configuration used by this chunker.
    fn config(&self) -> &ChunkerConfig;
}

/// Hierarchical chunker: paragraphs, then sentences, then word windows.
pub struct RecursiveChunker {
    config: ChunkerConfig,
    paragraph_re: Regex,
    sentence_re: Regex,
}

impl RecursiveChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self {
            config,
            paragraph_re: Regex::new(r"\n\s*\n").expect("static regex"),
            sentence_re: Regex::new(r"[.!?]+[\s\n]+").expect("static regex"),
        }
    }

    /// Break text into units no larger than `max_chunk_size`, descending
    /// from paragraphs to sentences to word windows as needed.
    fn split_units(&self, text: &str) -> Vec<String> {
        let mut units = Vec::new();
        for para in self.paragraph_re.split(text) {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }
            if para.len() <= self.config.max_chunk_size {
                units.push(para.to_string());
                continue;
            }
            for sentence in split_sentences(&self.sentence_re, para) {
                if sentence.len() <= self.config.max_chunk_size {
                    units.push(sentence);
                } else {
                    units.extend(word_windows(
                        &sentence,
                        self.config.max_chunk_size,
                        self.config.overlap,
                    ));
                }
            }
        }
        units
    }

    /// Greedily merge units into chunks, carrying an overlap tail from each
    /// finished chunk into the next.
    fn merge_units(&self, units: Vec<String>) -> Vec<String> {
        let max = self.config.max_chunk_size;
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for unit in units {
            if current.is_empty() {
                current = unit;
            } else if current.len() + 1 + unit.len() <= max {
                current.push('\n');
                current.push_str(&unit);
            } else {
                let tail = overlap_tail(&current, self.config.overlap);
                chunks.push(std::mem::take(&mut current));
                if !tail.is_empty() && tail.len() + 1 + unit.len() <= max {
                    current = format!("{}\n{}", tail, unit);
                } else {
                    current = unit;
                }
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return vec![];
        }
        if text.len() <= self.config.max_chunk_size {
            return vec![text.to_string()];
        }
        let units = self.split_units(text);
        self.merge_units(units)
    }

    fn config(&self) -> &ChunkerConfig {
        &self.config
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

/// Split text into sentences, keeping terminal punctuation attached.
fn split_sentences(re: &Regex, text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        let sentence = text[last..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        last = m.end();
    }
    let rest = text[last..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Fixed-size windows over whitespace-separated words with overlap.
fn word_windows(text: &str, max: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![];
    }

    let mut windows = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let mut end = start;
        let mut len = 0;
        while end < words.len() {
            let add = words[end].len() + usize::from(end > start);
            if len + add > max && end > start {
                break;
            }
            len += add;
            end += 1;
        }

        windows.push(words[start..end].join(" "));
        if end >= words.len() {
            break;
        }

        // Step back enough words to cover the overlap.
        let mut back = end;
        let mut carried = 0;
        while back > start + 1 && carried < overlap {
            back -= 1;
            carried += words[back].len() + 1;
        }
        start = back.max(start + 1);
    }
    windows
}

/// The last `overlap` bytes of a chunk, snapped forward to a word boundary.
fn overlap_tail(chunk: &str, overlap: usize) -> String {
    if overlap == 0 || chunk.len() <= overlap {
        return String::new();
    }
    let mut pos = chunk.len() - overlap;
    while !chunk.is_char_boundary(pos) {
        pos += 1;
    }
    match chunk[pos..].find(char::is_whitespace) {
        Some(ws) => chunk[pos + ws..].trim().to_string(),
        None => chunk[pos..].trim().to_string(),
    }
}
