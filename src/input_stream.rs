//! Input cursor with position tracking and backtracking support
//!
//! Holds the characters of one scanned fragment and the matcher's current
//! offset into them. Besides the offset, the cursor carries the slot of the
//! last pre-parsed element it consumed, so token lookups can continue
//! forward from there instead of searching from the start of the fragment.

use std::fmt;

/// Saved cursor state for backtracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    position: usize,
    last_token: Option<usize>,
}

impl Checkpoint {
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Input stream that tracks position in text for parsing with backtracking
#[derive(Clone)]
pub struct InputStream {
    chars: Vec<char>,
    position: usize,
    /// Slot of the last pre-parsed element consumed at or before `position`
    last_token: Option<usize>,
    /// When set, a match must consume the whole input
    eof_check: bool,
    /// Offset of the first character of every line
    line_starts: Vec<usize>,
}

impl InputStream {
    /// Create a new input stream from a string
    pub fn new(input: &str) -> Self {
        Self::from_chars(input.chars().collect())
    }

    pub fn from_chars(chars: Vec<char>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                chars
                    .iter()
                    .enumerate()
                    .filter(|&(_, &ch)| ch == '\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        InputStream {
            chars,
            line_starts,
            position: 0,
            last_token: None,
            eof_check: false,
        }
    }

    /// Get the current character without advancing
    pub fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    /// Get the current character and advance position
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    /// Get current position (character index, not byte offset)
    pub fn position(&self) -> usize {
        self.position
    }

    /// Reposition the cursor. Moving to a different offset forgets the last
    /// visited token, since it no longer describes what precedes the cursor.
    pub fn set_position(&mut self, pos: usize) {
        let pos = pos.min(self.chars.len());
        if pos != self.position {
            self.last_token = None;
        }
        self.position = pos;
    }

    /// Start a fresh match at `pos` with no token history
    pub fn reset(&mut self, pos: usize) {
        self.position = pos.min(self.chars.len());
        self.last_token = None;
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            position: self.position,
            last_token: self.last_token,
        }
    }

    /// Return to a checkpoint, restoring the offset and the last visited
    /// token together.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.position.min(self.chars.len());
        self.last_token = checkpoint.last_token;
    }

    pub fn last_token(&self) -> Option<usize> {
        self.last_token
    }

    /// Consume a pre-parsed element occupying `length` characters and bind it
    /// as the last visited token.
    pub fn advance_token(&mut self, slot: usize, length: usize) {
        self.position = (self.position + length).min(self.chars.len());
        self.last_token = Some(slot);
    }

    pub fn eof_check(&self) -> bool {
        self.eof_check
    }

    pub fn set_eof_check(&mut self, check: bool) {
        self.eof_check = check;
    }

    /// Get remaining input as a string (for debugging)
    pub fn remaining(&self) -> String {
        self.chars[self.position..].iter().collect()
    }

    /// Check if at end of input
    pub fn is_eof(&self) -> bool {
        self.position >= self.chars.len()
    }

    /// Get total length in characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Get line and column for a position (both 1-based)
    pub fn line_col(&self, pos: usize) -> (usize, usize) {
        let pos = pos.min(self.chars.len());
        let line = self.line_starts.partition_point(|&start| start <= pos);
        let column = pos - self.line_starts[line - 1] + 1;
        (line, column)
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InputStream(pos={}, last_token={:?}, remaining={:?})",
            self.position,
            self.last_token,
            self.remaining().chars().take(20).collect::<String>()
        )
    }
}
