//! Grammar acquisition
//!
//! Reads a grammar from inline text or a file, parses it, checks it, and
//! builds a [`PegMatcher`]. A modular grammar source is a list of grammar
//! files, one per line, resolved against the directory of the list.

use crate::ast::{Definition, Grammar};
use crate::grammar_parser::parse_grammar;
use crate::native_parser::PegMatcher;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a grammar comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GrammarSource {
    Text(String),
    File(PathBuf),
}

impl GrammarSource {
    pub fn text(grammar: impl Into<String>) -> Self {
        GrammarSource::Text(grammar.into())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        GrammarSource::File(path.into())
    }

    fn describe(&self) -> String {
        match self {
            GrammarSource::Text(text) => format!("inline grammar ({} bytes)", text.len()),
            GrammarSource::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GrammarOptions {
    pub modular: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    Io { path: PathBuf, message: String },
    Syntax(String),
    Duplicate(String),
    Undefined { name: String, referenced_by: String },
    Empty,
    EmptyModuleList,
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::Io { path, message } => {
                write!(f, "Cannot read grammar {}: {}", path.display(), message)
            }
            GrammarError::Syntax(message) => write!(f, "Grammar syntax error: {}", message),
            GrammarError::Duplicate(name) => {
                write!(f, "Non-terminal '{}' is defined more than once", name)
            }
            GrammarError::Undefined {
                name,
                referenced_by,
            } => write!(
                f,
                "Non-terminal '{}' is used in '{}' but never defined",
                name, referenced_by
            ),
            GrammarError::Empty => write!(f, "Grammar has no definitions"),
            GrammarError::EmptyModuleList => write!(f, "Modular grammar lists no modules"),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Read, parse and check a grammar
pub fn compile(source: &GrammarSource, options: &GrammarOptions) -> Result<PegMatcher, GrammarError> {
    info!("Compiling {}", source.describe());
    let result = load(source, options).and_then(|grammar| {
        check(&grammar)?;
        Ok(grammar)
    });

    match result {
        Ok(grammar) => {
            debug!(
                "Grammar has {} definition{}",
                grammar.definitions.len(),
                if grammar.definitions.len() == 1 { "" } else { "s" }
            );
            Ok(PegMatcher::new(grammar))
        }
        Err(error) => {
            warn!("Grammar {} rejected: {}", source.describe(), error);
            Err(error)
        }
    }
}

fn load(source: &GrammarSource, options: &GrammarOptions) -> Result<Grammar, GrammarError> {
    match (source, options.modular) {
        (GrammarSource::Text(text), false) => parse(text),
        (GrammarSource::File(path), false) => parse(&read(path)?),
        (GrammarSource::Text(text), true) => load_modules(text, Path::new(".")),
        (GrammarSource::File(path), true) => {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            load_modules(&read(path)?, base)
        }
    }
}

fn read(path: &Path) -> Result<String, GrammarError> {
    std::fs::read_to_string(path).map_err(|error| {
        debug!(?error);
        GrammarError::Io {
            path: path.to_path_buf(),
            message: error.kind().to_string(),
        }
    })
}

fn parse(text: &str) -> Result<Grammar, GrammarError> {
    parse_grammar(text).map_err(GrammarError::Syntax)
}

/// Concatenate the definitions of every module, in list order
fn load_modules(list: &str, base: &Path) -> Result<Grammar, GrammarError> {
    let mut definitions: Vec<Definition> = Vec::new();
    let mut modules = 0;
    for line in list.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let name = line.trim_matches(|c| c == '"' || c == '\'');
        let path = base.join(name);
        debug!("Loading grammar module {}", path.display());
        let module = parse(&read(&path)?)?;
        definitions.extend(module.definitions);
        modules += 1;
    }

    if modules == 0 {
        return Err(GrammarError::EmptyModuleList);
    }
    Ok(Grammar::new(definitions))
}

/// At least one definition, no duplicates, no dangling references
fn check(grammar: &Grammar) -> Result<(), GrammarError> {
    if grammar.definitions.is_empty() {
        return Err(GrammarError::Empty);
    }

    let mut names = HashSet::new();
    for def in &grammar.definitions {
        if !names.insert(def.name.as_str()) {
            return Err(GrammarError::Duplicate(def.name.clone()));
        }
    }

    for def in &grammar.definitions {
        if let Some(missing) = def.expr.references().into_iter().find(|r| !names.contains(r)) {
            return Err(GrammarError::Undefined {
                name: missing.to_string(),
                referenced_by: def.name.clone(),
            });
        }
    }
    Ok(())
}
