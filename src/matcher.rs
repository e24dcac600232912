//! The seam between the scanner and a grammar implementation
//!
//! A [`Matcher`] turns the input under a cursor into a parse tree. It may ask
//! a [`TokenLookup`] whether an existing element starts at the cursor, which
//! is how grammars consume pre-parsed markup as tokens.

use crate::document::ElementId;
use crate::input_stream::InputStream;
use crate::parse_tree::Match;

/// An existing element found at a cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreParsedToken {
    pub element: ElementId,
    /// Position in the lookup's document-order list, used to continue the
    /// next search
    pub slot: usize,
    /// Characters covered by the element
    pub length: usize,
}

pub trait TokenLookup {
    /// Find an element named `name` starting exactly at `position`,
    /// searching forward from the slot after `after` when given.
    fn lookup(&self, name: &str, position: usize, after: Option<usize>) -> Option<PreParsedToken>;
}

/// Lookup for matching plain text with no markup
pub struct NoTokens;

impl TokenLookup for NoTokens {
    fn lookup(&self, _name: &str, _position: usize, _after: Option<usize>) -> Option<PreParsedToken> {
        None
    }
}

/// A compiled grammar. Implementations keep no per-call state, so one
/// matcher can serve concurrent scans.
pub trait Matcher: Send + Sync {
    /// Match starting at the cursor's position. With the cursor's
    /// end-of-input check on, the match must reach the end of the input.
    fn parse(&self, input: &mut InputStream, tokens: &dyn TokenLookup) -> Match;
}
