//! pegmark - markup-aware incremental PEG scanner
//!
//! Scans the text of a document that already carries inline markup with a
//! parsing expression grammar, and inserts an element for every non-terminal
//! of every match. Existing markup stays well-formed, and existing elements
//! can be consumed by the grammar as tokens with `<name>`.
//!
//! # Quick Start
//!
//! ```rust
//! use pegmark::{Document, GrammarSource, MarkupScanner, ScanOptions};
//!
//! let grammar = "
//!     sum <- num *(ws '+' ws num)
//!     num <- +[0-9]
//!     ws  <: *' '
//! ";
//!
//! let scanner = MarkupScanner::new(&GrammarSource::text(grammar), ScanOptions::default())
//!     .expect("Invalid grammar");
//!
//! let mut doc = Document::from_xml("<p>Is 1 + <i>1</i> really 2?</p>").expect("Invalid XML");
//! scanner.scan(&mut doc).expect("Scan failed");
//!
//! assert_eq!(
//!     doc.to_xml(),
//!     "<p>Is <Sum><Num>1</Num> + <Num><i>1</i></Num></Sum> really <Sum><Num>2</Num></Sum>?</p>"
//! );
//! ```
//!
//! # Features
//!
//! - Waxeye-style grammars with pruning and voiding definitions
//! - Complete, adjacent and whole-word matching
//! - Restriction to named elements
//! - Position-preserving ASCII folding of the input
//! - WebAssembly support for browser use

pub mod ast;
pub mod cache;
pub mod charclass;
pub mod document;
pub mod error;
pub mod grammar;
pub mod grammar_parser;
pub mod input_stream;
pub mod lexer;
pub mod locator;
pub mod matcher;
pub mod native_parser;
pub mod normalize;
pub mod options;
pub mod parse_context;
pub mod parse_tree;
pub mod projector;
pub mod scanner;
mod xml;

// WASM bindings (only when compiling for wasm32)
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export main API
pub use cache::ParserCache;
pub use document::{Document, DocumentError, Element, ElementId, Placement};
pub use error::ScanError;
pub use grammar::{compile, GrammarError, GrammarOptions, GrammarSource};
pub use matcher::{Matcher, PreParsedToken, TokenLookup};
pub use native_parser::PegMatcher;
pub use options::ScanOptions;
pub use parse_tree::{Match, MatchFailure, ParseTree};
pub use scanner::MarkupScanner;

// Re-export WASM API for convenience
#[cfg(target_arch = "wasm32")]
pub use wasm::*;
