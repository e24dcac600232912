//! Errors surfaced by a scan

use crate::document::DocumentError;
use crate::grammar::GrammarError;
use crate::parse_tree::MatchFailure;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// The grammar could not be acquired
    Grammar(GrammarError),

    /// The matcher failed where unmatched text is not allowed
    Match {
        failure: MatchFailure,
        /// Up to 12 characters of the fragment from where matching started
        fragment: String,
    },

    /// Inserting markup would break the element tree
    Inconsistent(DocumentError),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Grammar(error) => write!(f, "{}", error),
            ScanError::Match { failure, fragment } => {
                write!(f, "Parser error: {}\nParsing [{}]", failure, fragment)
            }
            ScanError::Inconsistent(error) => write!(f, "Internal consistency error: {}", error),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Grammar(error) => Some(error),
            ScanError::Match { failure, .. } => Some(failure),
            ScanError::Inconsistent(error) => Some(error),
        }
    }
}

impl From<GrammarError> for ScanError {
    fn from(error: GrammarError) -> Self {
        ScanError::Grammar(error)
    }
}

impl From<DocumentError> for ScanError {
    fn from(error: DocumentError) -> Self {
        ScanError::Inconsistent(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_error_display() {
        let error = ScanError::Match {
            failure: MatchFailure {
                nonterminal: "sum".to_string(),
                line: 1,
                column: 3,
                position: 2,
            },
            fragment: "12a".to_string(),
        };
        let text = error.to_string();
        assert!(text.contains("failed to match 'sum' at line=1, col=3, pos=2"));
        assert!(text.ends_with("Parsing [12a]"));
    }

    #[test]
    fn test_conversions() {
        let error: ScanError = GrammarError::Empty.into();
        assert_eq!(error, ScanError::Grammar(GrammarError::Empty));
        let error: ScanError = DocumentError::Cycle { name: "x".to_string() }.into();
        assert!(matches!(error, ScanError::Inconsistent(_)));
    }
}
