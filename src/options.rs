//! Scan options
//!
//! Options arrive as a flat string map (from a host query engine, the
//! command line, or JavaScript) and are converted once into [`ScanOptions`].
//! Unknown keys are ignored. A boolean option is on only when its value is
//! exactly `"true"`.

use crate::grammar::GrammarOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// The whole fragment must be one match
    pub complete_match: bool,
    /// The fragment must be covered by matches with nothing between them
    pub adjacent_matches: bool,
    /// Matches may not start or end inside a run of letters and digits
    pub match_whole_words: bool,
    /// Record match failures as `fn:error` elements instead of failing
    pub show_parse_errors: bool,
    /// Fold the text to ASCII before matching
    pub normalize: bool,
    /// The grammar source is a list of grammar modules
    pub modular_grammar: bool,
    /// Reuse compiled grammars through a `ParserCache`
    pub cache_parser: bool,
    /// Only scan inside elements with this local name
    pub within_element_name: Option<String>,
    /// Namespace of the elements named by `within_element_name`
    pub within_element_namespace: Option<String>,
    pub inserted_namespace_prefix: Option<String>,
    pub inserted_namespace_uri: Option<String>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from key/value pairs
    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = ScanOptions::default();
        for (key, value) in entries {
            options.set(key.as_ref(), value.as_ref());
        }
        options
    }

    /// Set one option by key. Returns false for an unknown key.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let flag = value == "true";
        let text = (!value.is_empty()).then(|| value.to_string());
        match key {
            "completeMatch" => self.complete_match = flag,
            "adjacentMatches" => self.adjacent_matches = flag,
            "matchWholeWords" => self.match_whole_words = flag,
            "showParseErrors" => self.show_parse_errors = flag,
            "normalize" => self.normalize = flag,
            "modularGrammar" => self.modular_grammar = flag,
            "cacheParser" => self.cache_parser = flag,
            "withinElementName" => self.within_element_name = text,
            "withinElementNamespace" => self.within_element_namespace = text,
            "insertedNamespacePrefix" => self.inserted_namespace_prefix = text,
            "insertedNamespaceUri" => self.inserted_namespace_uri = text,
            _ => return false,
        }
        true
    }

    /// Text between or around matches is skipped rather than an error
    pub fn allow_unmatched_text(&self) -> bool {
        !(self.complete_match || self.adjacent_matches)
    }

    pub fn grammar_options(&self) -> GrammarOptions {
        GrammarOptions {
            modular: self.modular_grammar,
        }
    }
}
