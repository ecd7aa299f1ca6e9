// jurisguard-core/src/offsets.rs
//! Conversion between byte offsets and character offsets.
//!
//! Recognizers work on byte offsets (what `regex` reports), while findings and
//! audit records are expressed in character offsets so they stay meaningful to
//! consumers in other languages. `OffsetMap` bridges the two for one text.

/// Maps character indices to byte indices for a single text.
#[derive(Debug, Clone)]
pub struct OffsetMap {
    /// `None` when the text is pure ASCII and both offset kinds coincide.
    char_starts: Option<Vec<usize>>,
    byte_len: usize,
}

impl OffsetMap {
    pub fn new(text: &str) -> Self {
        if text.is_ascii() {
            return Self { char_starts: None, byte_len: text.len() };
        }
        let mut char_starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        char_starts.push(text.len());
        Self { char_starts: Some(char_starts), byte_len: text.len() }
    }

    /// Number of characters in the text.
    pub fn char_len(&self) -> usize {
        match &self.char_starts {
            Some(starts) => starts.len() - 1,
            None => self.byte_len,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Converts a byte offset to a character offset. Returns `None` if the byte
    /// offset is out of range or not on a character boundary.
    pub fn byte_to_char(&self, byte: usize) -> Option<usize> {
        if byte > self.byte_len {
            return None;
        }
        match &self.char_starts {
            Some(starts) => starts.binary_search(&byte).ok(),
            None => Some(byte),
        }
    }

    /// Converts a character offset to a byte offset. Returns `None` past the end.
    pub fn char_to_byte(&self, ch: usize) -> Option<usize> {
        match &self.char_starts {
            Some(starts) => starts.get(ch).copied(),
            None if ch <= self.byte_len => Some(ch),
            None => None,
        }
    }
}
