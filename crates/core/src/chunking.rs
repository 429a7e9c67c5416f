use crate::error::IngestError;
use crate::models::{Chunk, RawDocument};
use std::collections::VecDeque;
use std::ops::Range;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1_000,
            overlap_chars: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "max_chars must be positive".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than max_chars {}",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

pub fn split_documents(documents: &[RawDocument], config: ChunkingConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for (document_index, document) in documents.iter().enumerate() {
        let content = document.content.as_str();
        let mut cursor_byte = 0;
        let mut cursor_char = 0;

        for (chunk_index, range) in split_text(content, config).into_iter().enumerate() {
            // Chunk starts only move forward, so offsets can be counted incrementally.
            cursor_char += content[cursor_byte..range.start].chars().count();
            cursor_byte = range.start;
            let text = &content[range];

            chunks.push(Chunk {
                text: text.to_string(),
                chunk_index,
                char_start: cursor_char,
                char_end: cursor_char + text.chars().count(),
                document_index,
                metadata: document.metadata.clone(),
            });
        }
    }

    chunks
}

pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<Range<usize>> {
    if text.is_empty() {
        return Vec::new();
    }

    let max_chars = config.max_chars.max(1);
    let mut pieces = Vec::new();
    split_pieces(text, 0..text.len(), &SEPARATORS, max_chars, &mut pieces);
    merge_pieces(text, &pieces, max_chars, config.overlap_chars)
}

fn split_pieces(
    text: &str,
    range: Range<usize>,
    separators: &[&str],
    max_chars: usize,
    out: &mut Vec<Range<usize>>,
) {
    let slice = &text[range.clone()];
    if slice.chars().count() <= max_chars {
        out.push(range);
        return;
    }

    let Some(position) = separators
        .iter()
        .position(|separator| separator.is_empty() || slice.contains(separator))
    else {
        push_characters(slice, range.start, out);
        return;
    };

    let separator = separators[position];
    if separator.is_empty() {
        push_characters(slice, range.start, out);
        return;
    }

    // The separator stays attached to the piece that follows it.
    let finer = &separators[position + 1..];
    let mut piece_start = range.start;
    for (offset, _) in slice.match_indices(separator) {
        let boundary = range.start + offset;
        if boundary > piece_start {
            split_pieces(text, piece_start..boundary, finer, max_chars, out);
            piece_start = boundary;
        }
    }
    if piece_start < range.end {
        split_pieces(text, piece_start..range.end, finer, max_chars, out);
    }
}

fn push_characters(slice: &str, base: usize, out: &mut Vec<Range<usize>>) {
    for (offset, character) in slice.char_indices() {
        let start = base + offset;
        out.push(start..start + character.len_utf8());
    }
}

fn merge_pieces(
    text: &str,
    pieces: &[Range<usize>],
    max_chars: usize,
    overlap_chars: usize,
) -> Vec<Range<usize>> {
    let mut merged = Vec::new();
    let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let length = text[piece.clone()].chars().count();

        if total + length > max_chars {
            if let Some(span) = window_span(&window) {
                merged.push(span);
            }
            while total > overlap_chars || (total > 0 && total + length > max_chars) {
                match window.pop_front() {
                    Some((_, dropped)) => total -= dropped,
                    None => break,
                }
            }
        }

        total += length;
        window.push_back((piece.clone(), length));
    }

    if let Some(span) = window_span(&window) {
        merged.push(span);
    }

    merged
}

fn window_span(window: &VecDeque<(Range<usize>, usize)>) -> Option<Range<usize>> {
    let first = window.front()?;
    let last = window.back()?;
    Some(first.0.start..last.0.end)
}
