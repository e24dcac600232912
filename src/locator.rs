//! Finds existing elements that a grammar consumes as tokens
//!
//! The locator holds the enclosing element's descendants in pre-order, which
//! for a well-formed tree is also sorted by start offset. A lookup resumes
//! right after the last token the cursor consumed, so a left-to-right match
//! never walks the list from the beginning again.

use crate::document::{Document, ElementId};
use crate::matcher::{PreParsedToken, TokenLookup};

#[derive(Debug, Clone)]
struct Entry {
    /// Start relative to the fragment
    start: usize,
    length: usize,
    name: String,
    element: ElementId,
}

/// Token lookup over the elements inside one fragment
#[derive(Debug, Clone)]
pub struct TokenLocator {
    entries: Vec<Entry>,
}

impl TokenLocator {
    /// Snapshot the descendants of `enclosing`. The enclosing element itself
    /// is never a token.
    pub fn new(document: &Document, enclosing: ElementId) -> Self {
        let base = document.element(enclosing).start();
        let entries = document
            .descendants(enclosing)
            .into_iter()
            .map(|id| {
                let element = document.element(id);
                Entry {
                    start: element.start() - base,
                    length: element.span_len(),
                    name: element.local_name().to_string(),
                    element: id,
                }
            })
            .collect();
        TokenLocator { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First slot whose element starts at or after `position`
    fn first_slot_at(&self, position: usize) -> usize {
        self.entries.partition_point(|e| e.start < position)
    }
}

impl TokenLookup for TokenLocator {
    fn lookup(&self, name: &str, position: usize, after: Option<usize>) -> Option<PreParsedToken> {
        let mut slot = match after {
            Some(last) => last + 1,
            None => self.first_slot_at(position),
        };
        while self.entries.get(slot).is_some_and(|e| e.start < position) {
            slot += 1;
        }

        while let Some(entry) = self.entries.get(slot) {
            if entry.start != position {
                break;
            }
            if entry.name == name {
                return Some(PreParsedToken {
                    element: entry.element,
                    slot,
                    length: entry.length,
                });
            }
            slot += 1;
        }
        None
    }
}
