//! Corpus chunking: overlapping character windows snapped to sentence
//! ends.

use serde::{Deserialize, Serialize};

/// Chunking knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring windows.
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// A chunk cut from one corpus file.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    /// Position of the chunk within its file, starting at 0.
    pub index: usize,
}

/// Split `text` into overlapping windows of `chunk_size` characters.
///
/// Windows that stop mid-document are snapped back to the last
/// sentence ending in their final fifth, so chunks tend to close on a
/// full sentence. Indexing is by character, never by byte.
pub fn split_text(text: &str, source: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();

    if total == 0 {
        return chunks;
    }

    let chunk_size = config.chunk_size.max(1);
    let step = chunk_size.saturating_sub(config.chunk_overlap).max(1);
    let mut start = 0;
    let mut index = 0;

    while start < total {
        let end = (start + chunk_size).min(total);
        let cut = if end < total {
            snap_to_sentence(&chars, start, end)
        } else {
            end
        };

        let window: String = chars[start..cut].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(Chunk {
                text: trimmed.to_string(),
                source: source.to_string(),
                index,
            });
            index += 1;
        }

        start += step;
    }

    chunks
}

/// Index just past the last sentence ending in the window's final
/// fifth, or `end` when none is found there.
fn snap_to_sentence(chars: &[char], start: usize, end: usize) -> usize {
    let window = end - start;
    let search_start = start + (window * 4) / 5;

    let mut i = end;
    while i > search_start + 1 {
        if matches!(chars[i - 1], ' ' | '\n') && matches!(chars[i - 2], '.' | '!' | '?') {
            return i;
        }
        i -= 1;
    }
    end
}
