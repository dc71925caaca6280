//! Recursive character splitter.
//!
//! Text is cut on the coarsest separator present (blank line, newline,
//! space, then single characters). Pieces shorter than the chunk size are
//! merged back together with a sliding overlap; oversized pieces recurse
//! into the next separator. Separators stay attached to the start of the
//! piece that follows them. Lengths are measured in characters.

use std::collections::VecDeque;

use tracing::warn;

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl RecursiveCharacterSplitter {
    /// `chunk_size` is clamped to at least 1 and the overlap to below it.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge_splits(&pending));
                pending.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge_splits(&pending));
        }
        chunks
    }

    /// Greedily pack pieces into chunks, carrying up to `chunk_overlap`
    /// characters of trailing pieces into the next chunk.
    fn merge_splits(&self, pieces: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }
                if !current.is_empty() {
                    if let Some(doc) = join_pieces(&current) {
                        docs.push(doc);
                    }
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match current.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }
        if let Some(doc) = join_pieces(&current) {
            docs.push(doc);
        }
        docs
    }
}

fn join_pieces(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split on `separator`, prefixing each occurrence onto the piece after it.
/// An empty separator splits into single characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(text[start..idx].to_string());
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(text[start..].to_string());
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let s = RecursiveCharacterSplitter::new(100, 10);
        assert_eq!(s.split_text("  hello world  "), vec!["hello world"]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        let s = RecursiveCharacterSplitter::new(100, 10);
        assert!(s.split_text("").is_empty());
        assert!(s.split_text("\n\n   \n").is_empty());
    }

    #[test]
    fn separator_attaches_to_following_piece() {
        assert_eq!(
            split_keeping_separator("a b c", " "),
            vec!["a", " b", " c"]
        );
        assert_eq!(
            split_keeping_separator("one\n\ntwo\n\n", "\n\n"),
            vec!["one", "\n\ntwo", "\n\n"]
        );
    }

    #[test]
    fn paragraphs_split_before_lines() {
        let s = RecursiveCharacterSplitter::new(12, 0);
        let chunks = s.split_text("first para\n\nsecond one");
        assert_eq!(chunks, vec!["first para", "second one"]);
    }

    #[test]
    fn chunks_respect_size_and_overlap() {
        let s = RecursiveCharacterSplitter::new(10, 4);
        let text = "aa bb cc dd ee ff gg hh";
        let chunks = s.split_text(text);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(char_len(c) <= 10, "chunk too long: {:?}", c);
        }
        // Consecutive chunks share a word through the overlap window
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').next_back().unwrap();
            assert!(pair[1].starts_with(last_word), "{:?}", pair);
        }
    }

    #[test]
    fn long_words_fall_back_to_characters() {
        let s = RecursiveCharacterSplitter::new(4, 0);
        let chunks = s.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let s = RecursiveCharacterSplitter::new(3, 0);
        let chunks = s.split_text("ééééé");
        assert_eq!(chunks, vec!["ééé", "éé"]);
    }

    #[test]
    fn overlap_is_clamped_below_size() {
        let s = RecursiveCharacterSplitter::new(5, 50);
        assert_eq!(s.chunk_overlap(), 4);
        assert_eq!(RecursiveCharacterSplitter::new(0, 0).chunk_size(), 1);
    }
}
