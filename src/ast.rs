//! AST (Abstract Syntax Tree) for PEG grammars
//!
//! This module defines the data structures representing parsed grammars.

use crate::charclass::RangeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub mode: Mode,
    pub expr: Expr,
}

/// What a definition contributes to the parse tree
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum Mode {
    Normal, // name <- expr : always a node
    Prune,  // name <= expr : a single child replaces the node
    Void,   // name <: expr : no node at all
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Ordered choice, first success wins
    Choice(Vec<Expr>),
    Sequence(Vec<Expr>),
    Repeat {
        expr: Box<Expr>,
        min: usize,
        max: Option<usize>,
    },
    /// Positive lookahead `&e`
    And(Box<Expr>),
    /// Negative lookahead `!e`
    Not(Box<Expr>),
    /// Match but drop from the tree `:e`
    Void(Box<Expr>),
    Literal {
        text: Vec<char>,
        case_insensitive: bool,
    },
    CharClass(RangeSet),
    /// Any single character `.`
    Any,
    NonTerminal(String),
    /// An existing element recognized by name, `<name>`
    PreParsed(String),
}

impl Grammar {
    pub fn new(definitions: Vec<Definition>) -> Self {
        Grammar { definitions }
    }

    /// The first definition is the start rule
    pub fn start(&self) -> Option<&Definition> {
        self.definitions.first()
    }

    pub fn find(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }
}

impl Definition {
    pub fn new(name: String, mode: Mode, expr: Expr) -> Self {
        Definition { name, mode, expr }
    }

    /// Element name for nodes produced by this definition
    pub fn type_name(&self) -> String {
        type_name(&self.name)
    }
}

impl Expr {
    pub fn optional(expr: Expr) -> Self {
        Expr::Repeat {
            expr: Box::new(expr),
            min: 0,
            max: Some(1),
        }
    }

    pub fn star(expr: Expr) -> Self {
        Expr::Repeat {
            expr: Box::new(expr),
            min: 0,
            max: None,
        }
    }

    pub fn plus(expr: Expr) -> Self {
        Expr::Repeat {
            expr: Box::new(expr),
            min: 1,
            max: None,
        }
    }

    /// Names of all non-terminals referenced by this expression
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Choice(items) | Expr::Sequence(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Expr::Repeat { expr, .. } | Expr::And(expr) | Expr::Not(expr) | Expr::Void(expr) => {
                expr.collect_references(out)
            }
            Expr::NonTerminal(name) => out.push(name),
            Expr::Literal { .. } | Expr::CharClass(_) | Expr::Any | Expr::PreParsed(_) => {}
        }
    }
}

/// Upper camel case of a definition name: `sum` gives `Sum`, `foo_bar`
/// gives `FooBar`.
pub fn type_name(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
