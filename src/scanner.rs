//! The scan driver
//!
//! A [`MarkupScanner`] runs a matcher over the text of a document again and
//! again, left to right, and turns every match into markup. The text is
//! scanned either as a whole or one restricted element at a time; each such
//! region is a fragment.
//!
//! Within a fragment, the options decide what happens between matches:
//!
//! - by default, text that does not match is skipped one character (or, for
//!   whole words, one word) at a time;
//! - with `adjacentMatches` every character must belong to a match;
//! - with `completeMatch` the fragment must be a single match.
//!
//! Offsets found in normalized text are valid in the original, because
//! normalization maps each character to exactly one character.

use crate::cache::ParserCache;
use crate::charclass::{is_letter_or_digit, is_whitespace};
use crate::document::{Document, ElementId};
use crate::error::ScanError;
use crate::grammar::{compile, GrammarSource};
use crate::input_stream::InputStream;
use crate::locator::TokenLocator;
use crate::matcher::Matcher;
use crate::normalize::normalize_chars;
use crate::options::ScanOptions;
use crate::parse_tree::{MatchFailure, ParseTree};
use crate::projector::Projector;
use std::sync::Arc;
use tracing::{debug, trace};

/// Characters of context reported with a match error
const ERROR_CONTEXT: usize = 12;

/// A grammar and options, ready to scan any number of documents
#[derive(Clone)]
pub struct MarkupScanner {
    matcher: Arc<dyn Matcher>,
    options: ScanOptions,
}

impl MarkupScanner {
    /// Compile `source` and build a scanner
    pub fn new(source: &GrammarSource, options: ScanOptions) -> Result<Self, ScanError> {
        let matcher = compile(source, &options.grammar_options())?;
        Ok(Self::from_matcher(Arc::new(matcher), options))
    }

    /// Like [`MarkupScanner::new`], but take the matcher from `cache` when
    /// the `cacheParser` option is on
    pub fn with_cache(
        source: &GrammarSource,
        options: ScanOptions,
        cache: &ParserCache,
    ) -> Result<Self, ScanError> {
        if !options.cache_parser {
            return Self::new(source, options);
        }
        let matcher = cache.get_or_compile(source, &options.grammar_options())?;
        Ok(Self::from_matcher(matcher, options))
    }

    pub fn from_matcher(matcher: Arc<dyn Matcher>, options: ScanOptions) -> Self {
        MarkupScanner { matcher, options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Insert markup for every match in `document`.
    ///
    /// On error the document keeps the markup inserted so far.
    pub fn scan(&self, document: &mut Document) -> Result<(), ScanError> {
        let fragments = self.fragments(document);
        debug!("Scanning {} fragment(s)", fragments.len());
        for enclosing in fragments {
            self.scan_fragment(document, enclosing)?;
        }
        Ok(())
    }

    /// Elements to scan, in document order. Restricted elements are
    /// collected up front and never searched for nested restricted elements.
    fn fragments(&self, document: &Document) -> Vec<ElementId> {
        let Some(name) = self.options.within_element_name.as_deref() else {
            return vec![document.root()];
        };
        let namespace = self.options.within_element_namespace.as_deref();

        let mut found = Vec::new();
        let mut stack = vec![document.root()];
        while let Some(id) = stack.pop() {
            let element = document.element(id);
            if element.local_name() == name && element.namespace() == namespace {
                found.push(id);
            } else {
                stack.extend(document.children(id).iter().rev().copied());
            }
        }
        found
    }

    fn scan_fragment(&self, document: &mut Document, enclosing: ElementId) -> Result<(), ScanError> {
        let options = &self.options;
        let (base, text) = {
            let element = document.element(enclosing);
            (element.start(), document.text()[element.start()..element.end()].to_vec())
        };
        let len = text.len();

        let chars = if options.normalize {
            normalize_chars(&text)
        } else {
            text.clone()
        };
        let mut input = InputStream::from_chars(chars);
        input.set_eof_check(options.complete_match);
        let locator = TokenLocator::new(document, enclosing);

        let allow_unmatched = options.allow_unmatched_text();
        let whole_words = options.match_whole_words;
        let in_word = |at: usize| text.get(at).is_some_and(|&c| is_letter_or_digit(c));

        let mut unmatched = String::new();
        let mut pos = 0;
        let mut prev_pos = None;

        while pos <= len && prev_pos.map_or(true, |prev| pos > prev) {
            if allow_unmatched && whole_words {
                while pos < len && is_whitespace(text[pos]) {
                    unmatched.push(text[pos]);
                    pos += 1;
                }
            }
            prev_pos = Some(pos);

            input.reset(pos);
            let result = self.matcher.parse(&mut input, &locator);

            match result {
                Err(failure) if pos < len && !allow_unmatched => {
                    if options.show_parse_errors {
                        Projector::new(document, enclosing, base, options)
                            .project_failure(&failure, base + pos)?;
                        break;
                    }
                    return Err(match_error(failure, &text[pos..len.min(pos + ERROR_CONTEXT)]));
                }
                Ok(tree) if accepted(&tree, whole_words, &in_word) => {
                    flush(&mut unmatched);
                    Projector::new(document, enclosing, base, options).project_tree(&tree)?;
                    pos = if tree.end() > pos { tree.end() } else { pos + 1 };
                }
                _ if allow_unmatched && pos < len => {
                    let skipped = text[pos];
                    unmatched.push(skipped);
                    pos += 1;
                    if whole_words && is_letter_or_digit(skipped) {
                        while in_word(pos) {
                            unmatched.push(text[pos]);
                            pos += 1;
                        }
                    }
                }
                _ => break,
            }
        }

        flush(&mut unmatched);
        Ok(())
    }
}

/// A non-empty tree, not followed by a letter or digit when only whole
/// words may match
fn accepted(tree: &ParseTree, whole_words: bool, in_word: &impl Fn(usize) -> bool) -> bool {
    !tree.is_empty_match() && !(whole_words && in_word(tree.end()))
}

fn match_error(failure: MatchFailure, context: &[char]) -> ScanError {
    ScanError::Match {
        failure,
        fragment: context.iter().collect(),
    }
}

/// Unmatched text gets no markup
fn flush(unmatched: &mut String) {
    if !unmatched.is_empty() {
        trace!("Skipped {:?}", unmatched);
        unmatched.clear();
    }
}
