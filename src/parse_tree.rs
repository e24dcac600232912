//! Parse trees and match failures
//!
//! All spans are character offsets relative to the scanned fragment.

use crate::document::ElementId;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseTree {
    /// A non-terminal application
    Node {
        kind: String,
        start: usize,
        end: usize,
        children: Vec<ParseTree>,
    },
    /// One matched character
    Char { ch: char, position: usize },
    /// Nothing matched, or everything was voided
    Empty,
    /// An existing element consumed as a token
    Token {
        element: ElementId,
        start: usize,
        end: usize,
    },
}

impl ParseTree {
    pub fn start(&self) -> usize {
        match self {
            ParseTree::Node { start, .. } | ParseTree::Token { start, .. } => *start,
            ParseTree::Char { position, .. } => *position,
            ParseTree::Empty => 0,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            ParseTree::Node { end, .. } | ParseTree::Token { end, .. } => *end,
            ParseTree::Char { position, .. } => position + 1,
            ParseTree::Empty => 0,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            ParseTree::Node { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn children(&self) -> &[ParseTree] {
        match self {
            ParseTree::Node { children, .. } => children,
            _ => &[],
        }
    }

    /// Only a non-terminal with at least one child counts as a match
    pub fn is_empty_match(&self) -> bool {
        !matches!(self, ParseTree::Node { children, .. } if !children.is_empty())
    }

    /// Compact one-line rendering, for logs and tests
    pub fn to_sexpr(&self) -> String {
        match self {
            ParseTree::Node { kind, children, .. } => {
                let inner: Vec<String> = children.iter().map(ParseTree::to_sexpr).collect();
                format!("({} {})", kind, inner.join(" "))
            }
            ParseTree::Char { ch, .. } => format!("{:?}", ch),
            ParseTree::Empty => "()".to_string(),
            ParseTree::Token { element, .. } => format!("<#{}>", element.index()),
        }
    }
}

/// Where and in which non-terminal a match attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    pub nonterminal: String,
    pub line: usize,
    pub column: usize,
    pub position: usize,
}

impl MatchFailure {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to match '{}' at line={}, col={}, pos={}",
            self.nonterminal, self.line, self.column, self.position
        )
    }
}

impl std::error::Error for MatchFailure {}

/// Result of one matcher invocation
pub type Match = Result<ParseTree, MatchFailure>;
