//! Native PEG interpreter
//!
//! Interprets a grammar AST directly by recursive descent: ordered choice
//! with backtracking through cursor checkpoints, packrat memoization keyed by
//! (definition, position, last visited token), a left-recursion guard, and
//! farthest-failure error reporting.
//!
//! The matcher itself is immutable. All per-call state lives in a
//! [`ParseContext`] created for each invocation.

use crate::ast::{Expr, Grammar, Mode};
use crate::input_stream::InputStream;
use crate::matcher::{Matcher, NoTokens, TokenLookup};
use crate::parse_context::ParseContext;
use crate::parse_tree::{Match, MatchFailure, ParseTree};
use std::collections::HashMap;

/// A compiled grammar that matches by interpretation
#[derive(Debug, Clone)]
pub struct PegMatcher {
    grammar: Grammar,
    type_names: Vec<String>,
    index: HashMap<String, usize>,
}

impl PegMatcher {
    /// Build a matcher; the first definition is the start rule
    pub fn new(grammar: Grammar) -> Self {
        let type_names = grammar.definitions.iter().map(|d| d.type_name()).collect();
        let mut index = HashMap::new();
        for (i, def) in grammar.definitions.iter().enumerate() {
            index.entry(def.name.clone()).or_insert(i);
        }

        PegMatcher {
            grammar,
            type_names,
            index,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn definition_count(&self) -> usize {
        self.grammar.definitions.len()
    }

    pub fn start_rule(&self) -> Option<&str> {
        self.grammar.start().map(|d| d.name.as_str())
    }

    /// Match plain text from its beginning, without requiring the whole text
    pub fn parse_str(&self, text: &str) -> Match {
        let mut input = InputStream::new(text);
        self.parse(&mut input, &NoTokens)
    }

    fn failure(&self, input: &InputStream, ctx: &ParseContext, start: usize) -> MatchFailure {
        let (position, rule) = ctx.farthest_failure().unwrap_or((start, 0));
        let (line, column) = input.line_col(position);
        MatchFailure {
            nonterminal: self
                .grammar
                .definitions
                .get(rule)
                .map(|d| d.name.clone())
                .unwrap_or_default(),
            line,
            column,
            position,
        }
    }

    fn parse_definition(
        &self,
        idx: usize,
        input: &mut InputStream,
        tokens: &dyn TokenLookup,
        ctx: &mut ParseContext,
    ) -> Option<Vec<ParseTree>> {
        let start = input.checkpoint();
        let key = (idx, start.position(), input.last_token());
        if let Some(entry) = ctx.memo_cache.get(&key) {
            return match entry {
                Some((nodes, after)) => {
                    input.restore(*after);
                    Some(nodes.clone())
                }
                None => None,
            };
        }

        let def = &self.grammar.definitions[idx];
        let entered = ctx.enter_rule(idx, start.position());
        let result = if entered {
            self.eval(&def.expr, input, tokens, ctx)
        } else {
            None
        };
        ctx.exit_rule(idx, start.position(), entered);

        let result = result.map(|children| {
            let end = input.position();
            match def.mode {
                Mode::Void => Vec::new(),
                Mode::Prune if children.len() <= 1 => children,
                Mode::Normal | Mode::Prune => vec![ParseTree::Node {
                    kind: self.type_names[idx].clone(),
                    start: start.position(),
                    end,
                    children,
                }],
            }
        });
        if result.is_none() {
            input.restore(start);
        }

        // Results cut short by the recursion guard depend on the call stack
        if entered {
            let entry = result.as_ref().map(|nodes| (nodes.clone(), input.checkpoint()));
            ctx.memo_cache.insert(key, entry);
        }
        result
    }

    fn eval(
        &self,
        expr: &Expr,
        input: &mut InputStream,
        tokens: &dyn TokenLookup,
        ctx: &mut ParseContext,
    ) -> Option<Vec<ParseTree>> {
        match expr {
            Expr::Choice(alts) => {
                let start = input.checkpoint();
                for alt in alts {
                    if let Some(nodes) = self.eval(alt, input, tokens, ctx) {
                        return Some(nodes);
                    }
                    input.restore(start);
                }
                None
            }

            Expr::Sequence(items) => {
                let start = input.checkpoint();
                let mut out = Vec::new();
                for item in items {
                    match self.eval(item, input, tokens, ctx) {
                        Some(nodes) => out.extend(nodes),
                        None => {
                            input.restore(start);
                            return None;
                        }
                    }
                }
                Some(out)
            }

            Expr::Repeat { expr, min, max } => {
                let start = input.checkpoint();
                let mut out = Vec::new();
                let mut count = 0;
                while max.map_or(true, |m| count < m) {
                    let before = input.checkpoint();
                    match self.eval(expr, input, tokens, ctx) {
                        Some(nodes) => {
                            count += 1;
                            out.extend(nodes);
                            // No progress: further iterations would loop forever
                            if input.checkpoint() == before {
                                break;
                            }
                        }
                        None => {
                            input.restore(before);
                            break;
                        }
                    }
                }
                if count < *min {
                    input.restore(start);
                    None
                } else {
                    Some(out)
                }
            }

            Expr::And(inner) => {
                let start = input.checkpoint();
                ctx.enter_lookahead();
                let result = self.eval(inner, input, tokens, ctx);
                ctx.exit_lookahead();
                input.restore(start);
                result.map(|_| Vec::new())
            }

            Expr::Not(inner) => {
                let start = input.checkpoint();
                ctx.enter_lookahead();
                let result = self.eval(inner, input, tokens, ctx);
                ctx.exit_lookahead();
                input.restore(start);
                if result.is_some() {
                    ctx.record_failure(start.position());
                    None
                } else {
                    Some(Vec::new())
                }
            }

            Expr::Void(inner) => self.eval(inner, input, tokens, ctx).map(|_| Vec::new()),

            Expr::Literal {
                text,
                case_insensitive,
            } => {
                let start = input.checkpoint();
                let mut out = Vec::with_capacity(text.len());
                for &expected in text {
                    match input.current() {
                        Some(ch) if chars_equal(ch, expected, *case_insensitive) => {
                            out.push(ParseTree::Char {
                                ch,
                                position: input.position(),
                            });
                            input.advance();
                        }
                        _ => {
                            ctx.record_failure(input.position());
                            input.restore(start);
                            return None;
                        }
                    }
                }
                Some(out)
            }

            Expr::CharClass(set) => self.eval_char(input, ctx, |ch| set.contains(ch)),

            Expr::Any => self.eval_char(input, ctx, |_| true),

            Expr::NonTerminal(name) => match self.index.get(name) {
                Some(&idx) => self.parse_definition(idx, input, tokens, ctx),
                None => {
                    ctx.record_failure(input.position());
                    None
                }
            },

            Expr::PreParsed(name) => {
                let position = input.position();
                match tokens.lookup(name, position, input.last_token()) {
                    Some(token) => {
                        input.advance_token(token.slot, token.length);
                        Some(vec![ParseTree::Token {
                            element: token.element,
                            start: position,
                            end: position + token.length,
                        }])
                    }
                    None => {
                        ctx.record_failure(position);
                        None
                    }
                }
            }
        }
    }

    fn eval_char(
        &self,
        input: &mut InputStream,
        ctx: &mut ParseContext,
        accept: impl Fn(char) -> bool,
    ) -> Option<Vec<ParseTree>> {
        let position = input.position();
        match input.current() {
            Some(ch) if accept(ch) => {
                input.advance();
                Some(vec![ParseTree::Char { ch, position }])
            }
            _ => {
                ctx.record_failure(position);
                None
            }
        }
    }
}

fn chars_equal(actual: char, expected: char, case_insensitive: bool) -> bool {
    actual == expected || (case_insensitive && actual.to_lowercase().eq(expected.to_lowercase()))
}

impl Matcher for PegMatcher {
    fn parse(&self, input: &mut InputStream, tokens: &dyn TokenLookup) -> Match {
        let mut ctx = ParseContext::new();
        let start = input.position();
        if self.grammar.definitions.is_empty() {
            return Err(self.failure(input, &ctx, start));
        }

        match self.parse_definition(0, input, tokens, &mut ctx) {
            Some(mut nodes) => {
                if input.eof_check() && !input.is_eof() {
                    ctx.force_failure(input.position(), 0);
                    return Err(self.failure(input, &ctx, start));
                }
                if nodes.len() == 1 {
                    Ok(nodes.remove(0))
                } else {
                    Ok(ParseTree::Empty)
                }
            }
            None => Err(self.failure(input, &ctx, start)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ElementId;
    use crate::grammar_parser::parse_grammar;
    use crate::matcher::PreParsedToken;

    const CALC: &str = "
        sum <- prod *(ws [+\\-] ws prod)
        prod <- unary *(ws [*/] ws unary)
        unary <= '-' ws unary
               | :'(' ws sum ws :')'
               | num
        num <- +[0-9] ?('.' +[0-9])
        ws <: *[ \\t\\n\\r]
    ";

    fn matcher(grammar: &str) -> PegMatcher {
        PegMatcher::new(parse_grammar(grammar).unwrap())
    }

    #[test]
    fn test_calc_tree() {
        let tree = matcher(CALC).parse_str("1 + 1").unwrap();
        assert_eq!(
            tree.to_sexpr(),
            "(Sum (Prod (Num '1')) '+' (Prod (Num '1')))"
        );
        assert_eq!((tree.start(), tree.end()), (0, 5));
    }

    #[test]
    fn test_void_and_prune() {
        let tree = matcher(CALC).parse_str("(2)").unwrap();
        // Parentheses are voided; unary prunes to its single child
        assert_eq!(tree.to_sexpr(), "(Sum (Prod (Sum (Prod (Num '2')))))");

        let tree = matcher(CALC).parse_str("-2").unwrap();
        assert_eq!(tree.to_sexpr(), "(Sum (Prod (Unary '-' (Num '2'))))");
    }

    #[test]
    fn test_prefix_match_without_eof_check() {
        let tree = matcher(CALC).parse_str("12 apples").unwrap();
        assert_eq!(tree.end(), 2);
    }

    #[test]
    fn test_eof_check() {
        let m = matcher(CALC);
        let mut input = InputStream::new("12a");
        input.set_eof_check(true);
        let failure = m.parse(&mut input, &NoTokens).unwrap_err();
        assert_eq!(failure.position, 2);
        assert!(failure.to_string().contains("failed to match"));
    }

    #[test]
    fn test_failure_location() {
        let failure = matcher("greeting <- 'hello' ' ' name\nname <- +[a-z]")
            .parse_str("hello\nX")
            .unwrap_err();
        assert_eq!(failure.position, 5);
        assert_eq!((failure.line, failure.column), (1, 6));
        assert_eq!(failure.nonterminal, "greeting");

        let failure = matcher("greeting <- 'hello' ' ' name\nname <- +[a-z]")
            .parse_str("hello X")
            .unwrap_err();
        assert_eq!(failure.position, 6);
        assert_eq!(failure.nonterminal, "name");
    }

    #[test]
    fn test_case_insensitive_literal() {
        let m = matcher("kw <- \"select\"");
        assert!(m.parse_str("SeLeCt").is_ok());
        assert!(matcher("kw <- 'select'").parse_str("SELECT").is_err());
    }

    #[test]
    fn test_lookahead() {
        let m = matcher("word <- +(!' ' .) &' '");
        assert_eq!(m.parse_str("ab cd").unwrap().end(), 2);
        assert!(m.parse_str("abcd").is_err());
    }

    #[test]
    fn test_empty_match() {
        let tree = matcher("digits <- *[0-9]").parse_str("abc").unwrap();
        assert!(tree.is_empty_match());

        let tree = matcher("x <: 'a'").parse_str("a").unwrap();
        assert_eq!(tree, ParseTree::Empty);
    }

    #[test]
    fn test_palindrome() {
        let m = matcher(
            "palindrome <- 'a' :?palindrome 'a' | 'b' ?:palindrome 'b' | 'c' ?:palindrome 'c' | 'a' | 'b' | 'c'",
        );
        assert_eq!(m.parse_str("abcba").unwrap().end(), 5);
        assert_eq!(m.parse_str("aba").unwrap().end(), 3);
        // Ordered choice commits to "a" once the longer alternative fails
        assert_eq!(m.parse_str("abba").unwrap().end(), 1);
    }

    #[test]
    fn test_left_recursion_fails_instead_of_looping() {
        let m = matcher("expr <- expr '+' 'x' | 'x'");
        let tree = m.parse_str("x+x").unwrap();
        assert_eq!(tree.end(), 1);
    }

    #[test]
    fn test_empty_grammar_fails() {
        let m = PegMatcher::new(Grammar::new(vec![]));
        assert!(m.parse_str("x").is_err());
    }

    /// Elements `a` at slot 0 and `b` at slots 1 and 2, all zero-width at 0
    struct FakeTokens;

    impl TokenLookup for FakeTokens {
        fn lookup(&self, name: &str, position: usize, after: Option<usize>) -> Option<PreParsedToken> {
            let slots = ["a", "b", "b"];
            let from = after.map_or(0, |s| s + 1);
            (from..slots.len())
                .find(|&slot| position == 0 && slots[slot] == name)
                .map(|slot| PreParsedToken {
                    element: ElementId(slot),
                    slot,
                    length: 0,
                })
        }
    }

    #[test]
    fn test_preparsed_tokens_advance_slots() {
        let m = matcher("x <- <a> +<b>");
        let mut input = InputStream::new("");
        let tree = m.parse(&mut input, &FakeTokens).unwrap();
        assert_eq!(tree.to_sexpr(), "(X <#0> <#1> <#2>)");
        assert_eq!(input.last_token(), Some(2));
    }
}
