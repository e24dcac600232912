//! Handwritten recursive descent parser for PEG grammars
//!
//! ```text
//! grammar    := definition*
//! definition := Ident Arrow choice
//! choice     := sequence ('|' sequence)*
//! sequence   := unit+
//! unit       := prefix* primary
//! prefix     := '*' | '+' | '?' | ':' | '!' | '&'
//! primary    := Ident | Literal | CharClass | '<' name '>' | '.' | '(' choice ')'
//! ```
//!
//! Definitions are not terminated; a sequence ends before an identifier that
//! is followed by an arrow.

use crate::ast::{Definition, Expr, Grammar};
use crate::charclass::parse_class;
use crate::lexer::{Lexer, Token};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_ahead(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn consume(&mut self) -> Option<Token> {
        if self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            Some(token)
        } else {
            None
        }
    }

    fn expect(&mut self, description: &str) -> Result<Token, String> {
        self.consume()
            .ok_or_else(|| format!("Expected {} but reached end of input", description))
    }

    fn matches(&self, expected: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.matches(&Token::Eof)
    }

    /// True at the start of the next definition
    fn at_definition(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident(_)))
            && matches!(self.peek_ahead(1), Some(Token::Arrow(_)))
    }

    // Grammar: Definition*
    pub fn parse_grammar(&mut self) -> Result<Grammar, String> {
        let mut definitions = Vec::new();

        while !self.at_end() {
            definitions.push(self.parse_definition()?);
        }

        Ok(Grammar::new(definitions))
    }

    // Definition: Ident Arrow Choice
    fn parse_definition(&mut self) -> Result<Definition, String> {
        let name = match self.expect("definition name")? {
            Token::Ident(s) => s,
            other => return Err(format!("Expected definition name, got {:?}", other)),
        };

        let mode = match self.expect("'<-', '<=' or '<:'")? {
            Token::Arrow(mode) => mode,
            other => {
                return Err(format!(
                    "Expected '<-', '<=' or '<:' after '{}', got {:?}",
                    name, other
                ))
            }
        };

        let expr = self.parse_choice()
            .map_err(|e| format!("In definition '{}': {}", name, e))?;
        Ok(Definition::new(name, mode, expr))
    }

    // Choice: Sequence ("|" Sequence)*
    fn parse_choice(&mut self) -> Result<Expr, String> {
        let mut alts = vec![self.parse_sequence()?];

        while self.matches(&Token::Pipe) {
            self.consume();
            alts.push(self.parse_sequence()?);
        }

        if alts.len() == 1 {
            Ok(alts.remove(0))
        } else {
            Ok(Expr::Choice(alts))
        }
    }

    // Sequence: Unit+
    fn parse_sequence(&mut self) -> Result<Expr, String> {
        let mut units = Vec::new();

        while !self.at_end()
            && !self.matches(&Token::Pipe)
            && !self.matches(&Token::RParen)
            && !self.at_definition()
        {
            units.push(self.parse_unit()?);
        }

        match units.len() {
            0 => Err(format!("Expected an expression, found {:?}", self.peek())),
            1 => Ok(units.remove(0)),
            _ => Ok(Expr::Sequence(units)),
        }
    }

    // Unit: Prefix* Primary, prefixes bind right to left (":?x" is Void(Optional(x)))
    fn parse_unit(&mut self) -> Result<Expr, String> {
        let mut prefixes = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                Token::Star
                | Token::Plus
                | Token::Question
                | Token::Colon
                | Token::Bang
                | Token::Amp => {
                    prefixes.push(token.clone());
                    self.consume();
                }
                _ => break,
            }
        }

        let mut expr = self.parse_primary()?;
        for prefix in prefixes.into_iter().rev() {
            expr = match prefix {
                Token::Star => Expr::star(expr),
                Token::Plus => Expr::plus(expr),
                Token::Question => Expr::optional(expr),
                Token::Colon => Expr::Void(Box::new(expr)),
                Token::Bang => Expr::Not(Box::new(expr)),
                _ => Expr::And(Box::new(expr)),
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.expect("expression")? {
            Token::Ident(name) => Ok(Expr::NonTerminal(name)),
            Token::Literal {
                text,
                case_insensitive,
            } => Ok(Expr::Literal {
                text: text.chars().collect(),
                case_insensitive,
            }),
            Token::CharClass(content) => Ok(Expr::CharClass(parse_class(&content)?)),
            Token::PreParsed(name) => Ok(Expr::PreParsed(name)),
            Token::Dot => Ok(Expr::Any),
            Token::LParen => {
                let inner = self.parse_choice()?;
                match self.expect("')'")? {
                    Token::RParen => Ok(inner),
                    other => Err(format!("Expected ')' but found {:?}", other)),
                }
            }
            other => Err(format!("Unexpected token {:?}", other)),
        }
    }
}

/// Tokenize and parse grammar text
pub fn parse_grammar(input: &str) -> Result<Grammar, String> {
    let tokens = Lexer::new(input).tokenize()?;
    Parser::new(tokens).parse_grammar()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Mode;

    #[test]
    fn test_calc_grammar() {
        let grammar = parse_grammar(
            "sum <- prod *(ws [+-] ws prod)
             prod <- unary *(ws [*/] ws unary)
             unary <= '-' ws unary
                    | :'(' ws sum ws :')'
                    | num
             num <- +[0-9] ?('.' +[0-9])
             ws <: *[ \\t\\n\\r]",
        )
        .unwrap();

        let names: Vec<_> = grammar.definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["sum", "prod", "unary", "num", "ws"]);
        assert_eq!(grammar.definitions[2].mode, Mode::Prune);
        assert_eq!(grammar.definitions[4].mode, Mode::Void);
        assert!(matches!(&grammar.definitions[2].expr, Expr::Choice(alts) if alts.len() == 3));
    }

    #[test]
    fn test_prefix_order() {
        let grammar = parse_grammar("p <- :?p").unwrap();
        match &grammar.definitions[0].expr {
            Expr::Void(inner) => assert!(matches!(
                inner.as_ref(),
                Expr::Repeat { min: 0, max: Some(1), .. }
            )),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_preparsed() {
        let grammar = parse_grammar("X <- <a> +<b> <a>").unwrap();
        match &grammar.definitions[0].expr {
            Expr::Sequence(items) => {
                assert_eq!(items[0], Expr::PreParsed("a".to_string()));
                assert!(matches!(&items[1], Expr::Repeat { min: 1, max: None, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_definition_boundary_without_terminator() {
        let grammar = parse_grammar("a <- b c\nb <- 'x'\nc <- 'y'").unwrap();
        assert_eq!(grammar.definitions.len(), 3);
        assert!(matches!(&grammar.definitions[0].expr, Expr::Sequence(items) if items.len() == 2));
    }

    #[test]
    fn test_empty_grammar_parses_to_nothing() {
        let grammar = parse_grammar("# only a comment").unwrap();
        assert!(grammar.definitions.is_empty());
    }

    #[test]
    fn test_errors() {
        assert!(parse_grammar("a <-").is_err());
        assert!(parse_grammar("a <- (b").is_err());
        assert!(parse_grammar("a b").is_err());
        assert!(parse_grammar("a <- [z-a]").is_err());
        assert!(parse_grammar("a <- 'x' | ").is_err());
    }
}
